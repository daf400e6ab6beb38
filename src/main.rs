mod analysis;
mod cache;
mod config;
mod error;
mod forecast;
mod locations;
mod openapi;
mod routes;
mod scoring;

use axum::{error_handling::HandleErrorLayer, http::StatusCode, BoxError};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use reqwest::Client;
use std::{sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cache::{create_forecast_cache, start_cache_cleanup_task};
use crate::config::AppConfig;
use crate::forecast::{ForecastService, MetNoClient};
use crate::locations::LocationRegistry;

/// Shared HTTP client configuration
const HTTP_TIMEOUT_SECS: u64 = 30;
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 5;
const HTTP_POOL_IDLE_TIMEOUT_SECS: u64 = 90;

#[derive(Clone)]
pub struct AppState {
    pub forecast_service: Arc<ForecastService>,
    pub registry: Arc<LocationRegistry>,
    pub config: Arc<AppConfig>,
    pub tz: Tz,
    /// Wall clock, swapped for a fixed instant in tests
    pub clock: fn() -> DateTime<Utc>,
}

impl AppState {
    /// Current time in the configured timezone
    pub fn now(&self) -> DateTime<Tz> {
        (self.clock)().with_timezone(&self.tz)
    }
}

/// Create shared HTTP client with connection pooling
fn create_http_client() -> reqwest::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
        .pool_idle_timeout(Duration::from_secs(HTTP_POOL_IDLE_TIMEOUT_SECS))
        .pool_max_idle_per_host(10)
        .build()
}

async fn handle_timeout_error(err: BoxError) -> (StatusCode, String) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (StatusCode::REQUEST_TIMEOUT, "Request timed out".to_string())
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Internal error: {}", err),
        )
    }
}

/// Resolves on ctrl+c or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl+c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fairweather=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(AppConfig::load()?);
    let tz = config.tz()?;
    let registry = Arc::new(LocationRegistry::new(config.locations.clone()));
    tracing::info!(
        timezone = %tz,
        locations = registry.len(),
        "Configuration loaded successfully"
    );

    let http_client = create_http_client()?;
    let provider = Arc::new(MetNoClient::new(http_client, &config.forecast));

    let ttl = Duration::from_secs(config.forecast.cache_ttl_secs);
    let cache = create_forecast_cache(ttl);
    start_cache_cleanup_task(Arc::clone(&cache), ttl);

    let forecast_service = Arc::new(ForecastService::new(
        provider,
        cache,
        Arc::clone(&config),
        tz,
    ));

    let state = AppState {
        forecast_service,
        registry,
        config: Arc::clone(&config),
        tz,
        clock: Utc::now,
    };

    let app = routes::build_router()
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout_error))
                // met.no can be slow when every location misses the cache
                .timeout(Duration::from_secs(60)),
        )
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
