use axum::{routing::get, Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::analysis::handlers as analysis_handlers;
use crate::forecast::handlers as forecast_handlers;
use crate::openapi::swagger_ui;
use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn forecast_routes() -> Router<AppState> {
    Router::new()
        .route("/locations", get(forecast_handlers::list_locations))
        .route("/forecast/{location}", get(forecast_handlers::get_forecast))
}

fn analysis_routes() -> Router<AppState> {
    Router::new()
        .route("/rankings", get(analysis_handlers::get_rankings))
        .route(
            "/recommendations",
            get(analysis_handlers::get_recommendations),
        )
}

pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .merge(forecast_routes())
        .merge(analysis_routes())
}

/// Complete application router, state still to be supplied
pub fn build_router() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .nest("/api/v1", api_v1_routes())
        .merge(swagger_ui())
}
