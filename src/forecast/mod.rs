pub mod daily;
pub mod handlers;
pub mod hourly;
pub mod models;
pub mod processing;
pub mod service;

pub use daily::{DailyReport, DayStats};
pub use hourly::{Conditions, HourlyRecord, SubScores};
pub use processing::{process_forecast, ProcessedForecast};
pub use service::{ForecastError, ForecastProvider, ForecastService, MetNoClient};
