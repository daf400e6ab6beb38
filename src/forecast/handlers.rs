use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use super::daily::DailyReport;
use super::processing::ProcessedForecast;
use super::service::ForecastError;
use crate::analysis::{
    best_and_worst_blocks, extract_blocks, find_avoid_ranges, select_optimal_block, AvoidRange,
    OptimalBlock, WeatherBlock,
};
use crate::config::AppConfig;
use crate::locations::Location;
use crate::scoring::{normalize_score, Rating};
use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct ForecastResponse {
    pub location: Location,
    pub timezone: String,
    pub days: Vec<DayForecast>,
}

/// Daily report plus the block analysis of its daylight hours
#[derive(Debug, Serialize, ToSchema)]
pub struct DayForecast {
    #[serde(flatten)]
    pub report: DailyReport,
    pub weather_description: String,
    pub rating: Rating,
    pub normalized_score: u8,
    pub blocks: Vec<WeatherBlock>,
    pub best_block: Option<WeatherBlock>,
    pub worst_block: Option<WeatherBlock>,
    pub optimal_block: Option<OptimalBlock>,
    pub avoid_ranges: Vec<AvoidRange>,
}

impl DayForecast {
    pub fn analyse(report: &DailyReport, cfg: &AppConfig) -> Self {
        let hours = &report.daylight_hours;
        let blocks = extract_blocks(hours, cfg.recommendation.min_block_len);
        let (best, worst) = best_and_worst_blocks(&blocks);
        let (best_block, worst_block) = (best.cloned(), worst.cloned());

        Self {
            weather_description: report.weather_description(&cfg.analysis),
            rating: Rating::from_score(report.avg_score()),
            normalized_score: normalize_score(report.avg_score()),
            optimal_block: select_optimal_block(hours, 1, &cfg.selector),
            avoid_ranges: find_avoid_ranges(hours, &cfg.selector),
            best_block,
            worst_block,
            blocks,
            report: report.clone(),
        }
    }
}

pub fn forecast_response(forecast: &ProcessedForecast, cfg: &AppConfig) -> ForecastResponse {
    ForecastResponse {
        location: forecast.location.clone(),
        timezone: cfg.timezone.clone(),
        days: forecast
            .reports
            .values()
            .map(|report| DayForecast::analyse(report, cfg))
            .collect(),
    }
}

/// Configured locations, in registry order
///
/// GET /api/v1/locations
pub async fn list_locations(State(state): State<AppState>) -> Json<Vec<Location>> {
    Json(state.registry.iter().cloned().collect())
}

/// Scored daily forecast for one location
///
/// GET /api/v1/forecast/{location}
pub async fn get_forecast(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ForecastResponse>, ForecastError> {
    let location = state
        .registry
        .get(&key)
        .cloned()
        .ok_or(ForecastError::LocationNotFound(key))?;

    let today = state.now().date_naive();
    let forecast = state.forecast_service.get(&location, today).await?;
    Ok(Json(forecast_response(&forecast, &state.config)))
}
