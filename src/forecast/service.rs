use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use chrono::NaiveDate;
use chrono_tz::Tz;
use indexmap::IndexMap;
use reqwest::Client;
use thiserror::Error;
use tokio::task::JoinSet;

use super::models::MetNoResponse;
use super::processing::{process_forecast, ProcessedForecast};
use crate::cache::{forecast_cache_key, ForecastCache};
use crate::config::{AppConfig, ForecastConfig};
use crate::error::HttpError;
use crate::impl_into_response;
use crate::locations::{Location, LocationRegistry};

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Failed to fetch data: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Forecast API error: {0}")]
    ApiError(String),

    #[error("Invalid forecast response: {0}")]
    InvalidResponse(String),

    #[error("Location not found: {0}")]
    LocationNotFound(String),
}

impl HttpError for ForecastError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::LocationNotFound(_) => StatusCode::NOT_FOUND,
            Self::RequestError(_) | Self::ApiError(_) | Self::InvalidResponse(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }

    fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::LocationNotFound(_) => Some("LOCATION_NOT_FOUND"),
            Self::RequestError(_) => Some("REQUEST_ERROR"),
            Self::ApiError(_) => Some("API_ERROR"),
            Self::InvalidResponse(_) => Some("INVALID_RESPONSE"),
        }
    }
}

impl_into_response!(ForecastError);

/// Source of raw hourly forecasts for a location
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    async fn fetch(&self, location: &Location) -> Result<MetNoResponse, ForecastError>;
}

/// met.no Locationforecast 2.0 client
pub struct MetNoClient {
    client: Client,
    api_url: String,
    compact_api_url: String,
    user_agent: String,
    min_timeseries_len: usize,
}

impl MetNoClient {
    pub fn new(client: Client, config: &ForecastConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.clone(),
            compact_api_url: config.compact_api_url.clone(),
            user_agent: config.user_agent.clone(),
            min_timeseries_len: config.min_timeseries_len,
        }
    }

    async fn fetch_from(&self, url: &str, location: &Location) -> Result<MetNoResponse, ForecastError> {
        tracing::debug!(
            location = %location.key,
            lat = %location.lat,
            lon = %location.lon,
            url = %url,
            "Fetching forecast"
        );

        // met.no rejects coordinates with more than four decimals
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(&[
                ("lat", format!("{:.4}", location.lat)),
                ("lon", format!("{:.4}", location.lon)),
            ])
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(status = %status, location = %location.key, "Received forecast response");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ForecastError::ApiError(format!("{}: {}", status, text)));
        }

        let data: MetNoResponse = response.json().await?;
        Ok(data)
    }
}

#[async_trait]
impl ForecastProvider for MetNoClient {
    /// Complete endpoint first; compact when that fails or comes back too short
    async fn fetch(&self, location: &Location) -> Result<MetNoResponse, ForecastError> {
        let primary = match self.fetch_from(&self.api_url, location).await {
            Ok(data) if data.timeseries_len() >= self.min_timeseries_len => return Ok(data),
            other => other,
        };

        tracing::warn!(
            location = %location.key,
            error = ?primary.as_ref().err(),
            "Complete forecast unusable, trying compact endpoint"
        );

        match self.fetch_from(&self.compact_api_url, location).await {
            Ok(data) => Ok(data),
            Err(e) => primary.or(Err(e)),
        }
    }
}

/// Fetches, scores and caches forecasts for registry locations
#[derive(Clone)]
pub struct ForecastService {
    provider: Arc<dyn ForecastProvider>,
    cache: ForecastCache,
    config: Arc<AppConfig>,
    tz: Tz,
}

impl ForecastService {
    pub fn new(
        provider: Arc<dyn ForecastProvider>,
        cache: ForecastCache,
        config: Arc<AppConfig>,
        tz: Tz,
    ) -> Self {
        Self {
            provider,
            cache,
            config,
            tz,
        }
    }

    /// Processed forecast for `location`, starting at local day `today`
    pub async fn get(
        &self,
        location: &Location,
        today: NaiveDate,
    ) -> Result<Arc<ProcessedForecast>, ForecastError> {
        let cache_key = forecast_cache_key(&location.key, today);

        if let Some(cached) = self.cache.get(&cache_key) {
            tracing::debug!(location = %location.key, "Forecast cache hit");
            return Ok(cached);
        }

        tracing::debug!(location = %location.key, "Forecast cache miss");

        let response = self.provider.fetch(location).await?;
        let processed = process_forecast(&response, location, self.tz, today, &self.config)
            .ok_or_else(|| {
                ForecastError::InvalidResponse(format!("no timeseries for {}", location.key))
            })?;

        let processed = Arc::new(processed);
        self.cache.insert(cache_key, Arc::clone(&processed));
        Ok(processed)
    }

    /// Forecasts for every registry location, fetched concurrently.
    ///
    /// Failed locations are logged and left out; registry order is kept.
    pub async fn get_all(
        &self,
        registry: &LocationRegistry,
        today: NaiveDate,
    ) -> IndexMap<String, Arc<ProcessedForecast>> {
        let mut tasks = JoinSet::new();
        for location in registry.iter().cloned() {
            let service = self.clone();
            tasks.spawn(async move {
                let result = service.get(&location, today).await;
                (location, result)
            });
        }

        let mut fetched = Vec::with_capacity(registry.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((location, Ok(forecast))) => fetched.push((location.key, forecast)),
                Ok((location, Err(e))) => {
                    tracing::warn!(location = %location.key, error = %e, "Skipping location");
                }
                Err(e) => tracing::error!(error = %e, "Forecast task failed"),
            }
        }

        let mut ordered = IndexMap::with_capacity(fetched.len());
        for location in registry.iter() {
            if let Some(pos) = fetched.iter().position(|(key, _)| *key == location.key) {
                let (key, forecast) = fetched.swap_remove(pos);
                ordered.insert(key, forecast);
            }
        }
        ordered
    }
}
