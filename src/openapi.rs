use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::analysis::handlers::{RankingResponse, RecommendationResponse};
use crate::analysis::{AvoidRange, OptimalBlock, RankedLocation, RecommendationPeriod, WeatherBlock};
use crate::error::ErrorResponse;
use crate::forecast::handlers::{DayForecast, ForecastResponse};
use crate::forecast::{Conditions, DailyReport, DayStats, HourlyRecord, SubScores};
use crate::locations::Location;
use crate::routes::HealthResponse;
use crate::scoring::{Rating, SymbolInfo, WeatherClass};

/// Schema documentation for the Fairweather API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Fairweather API",
        version = "0.1.0",
        description = "Scores met.no hourly forecasts for outdoor comfort and finds the best time windows per day and across locations.",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    tags(
        (name = "forecast", description = "Scored daily forecasts per location"),
        (name = "analysis", description = "Cross-location rankings and outing recommendations")
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            Location,
            Conditions,
            SubScores,
            HourlyRecord,
            DayStats,
            DailyReport,
            DayForecast,
            ForecastResponse,
            WeatherClass,
            Rating,
            SymbolInfo,
            WeatherBlock,
            OptimalBlock,
            AvoidRange,
            RankedLocation,
            RankingResponse,
            RecommendationPeriod,
            RecommendationResponse,
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
