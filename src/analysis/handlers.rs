use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::ranking::{rank_locations_for_date, RankedLocation};
use super::recommend::{recommend_best_times, RecommendationPeriod};
use crate::error::HttpError;
use crate::forecast::ForecastError;
use crate::impl_into_response;
use crate::AppState;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error(transparent)]
    Forecast(#[from] ForecastError),
}

impl HttpError for AnalysisError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidDate(_) => StatusCode::BAD_REQUEST,
            Self::Forecast(e) => e.status_code(),
        }
    }

    fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::InvalidDate(_) => Some("INVALID_DATE"),
            Self::Forecast(e) => e.error_code(),
        }
    }
}

impl_into_response!(AnalysisError);

fn parse_date(raw: &str) -> Result<NaiveDate, AnalysisError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AnalysisError::InvalidDate(raw.to_string()))
}

#[derive(Debug, Deserialize)]
pub struct RankingQuery {
    /// YYYY-MM-DD, defaults to today
    pub date: Option<String>,
    /// Number of locations, defaults to `ranking.top_n`
    pub top: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RankingResponse {
    pub date: NaiveDate,
    pub locations: Vec<RankedLocation>,
}

/// Best locations for one day
///
/// GET /api/v1/rankings?date=2024-06-01&top=5
pub async fn get_rankings(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> Result<Json<RankingResponse>, AnalysisError> {
    let now = state.now();
    let date = match query.date.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => now.date_naive(),
    };
    let top = query.top.unwrap_or(state.config.ranking.top_n);

    let forecasts = state
        .forecast_service
        .get_all(&state.registry, now.date_naive())
        .await;
    let locations = rank_locations_for_date(&forecasts, date, now, top, &state.config);

    tracing::debug!(%date, ranked = locations.len(), "Ranked locations");
    Ok(Json(RankingResponse { date, locations }))
}

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    /// Restrict to one location key
    pub location: Option<String>,
    /// Comma separated YYYY-MM-DD list, defaults to the next few days
    pub dates: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecommendationResponse {
    pub periods: Vec<RecommendationPeriod>,
}

/// Best outing windows, by date then score
///
/// GET /api/v1/recommendations?location=gijon&dates=2024-06-01,2024-06-02
pub async fn get_recommendations(
    State(state): State<AppState>,
    Query(query): Query<RecommendationQuery>,
) -> Result<Json<RecommendationResponse>, AnalysisError> {
    if let Some(key) = query.location.as_deref() {
        if state.registry.get(key).is_none() {
            return Err(ForecastError::LocationNotFound(key.to_string()).into());
        }
    }

    let dates = query
        .dates
        .as_deref()
        .map(|raw| {
            raw.split(',')
                .filter(|s| !s.trim().is_empty())
                .map(parse_date)
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;

    let today = state.now().date_naive();
    let forecasts = state.forecast_service.get_all(&state.registry, today).await;
    let periods = recommend_best_times(
        &forecasts,
        query.location.as_deref(),
        dates.as_deref(),
        today,
        &state.config,
    );

    Ok(Json(RecommendationResponse { periods }))
}
