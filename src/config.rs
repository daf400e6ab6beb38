use config::{Case, Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::locations::{default_locations, Location};
use crate::scoring::ScoringTables;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// IANA timezone used for calendar days and "now" (e.g. "Europe/Madrid")
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Forecast provider settings
    #[serde(default)]
    pub forecast: ForecastConfig,

    /// Daylight window and daily summary thresholds
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Consistent block search and best block selection
    #[serde(default)]
    pub selector: SelectorConfig,

    /// Cross-location ranking
    #[serde(default)]
    pub ranking: RankingConfig,

    /// Multi-day recommendations
    #[serde(default)]
    pub recommendation: RecommendationConfig,

    /// Comfort range tables
    #[serde(default)]
    pub scoring: ScoringTables,

    /// Ordered location registry
    #[serde(default = "default_locations")]
    pub locations: Vec<Location>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForecastConfig {
    /// met.no locationforecast "complete" endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// met.no locationforecast "compact" endpoint, used as fallback
    #[serde(default = "default_compact_api_url")]
    pub compact_api_url: String,

    /// met.no rejects requests without an identifying User-Agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Number of calendar days (starting today) kept from the timeseries
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,

    /// How long a processed forecast is served from cache
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Responses shorter than this fall back to the compact endpoint
    #[serde(default = "default_min_timeseries_len")]
    pub min_timeseries_len: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            compact_api_url: default_compact_api_url(),
            user_agent: default_user_agent(),
            forecast_days: default_forecast_days(),
            cache_ttl_secs: default_cache_ttl_secs(),
            min_timeseries_len: default_min_timeseries_len(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    /// First daylight hour (inclusive)
    #[serde(default = "default_daylight_start")]
    pub daylight_start_hour: u32,

    /// Last daylight hour (inclusive)
    #[serde(default = "default_daylight_end")]
    pub daylight_end_hour: u32,

    /// An hour counts as likely rain above this probability (%)
    #[serde(default = "default_likely_rain_probability")]
    pub likely_rain_probability: f64,

    /// ...or above this amount (mm)
    #[serde(default = "default_likely_rain_amount")]
    pub likely_rain_amount: f64,

    /// Average probability (%) above which the description gets a rain suffix
    #[serde(default = "default_precip_warning_probability")]
    pub precip_warning_probability: f64,
}

impl AnalysisConfig {
    pub fn is_daylight(&self, hour: u32) -> bool {
        (self.daylight_start_hour..=self.daylight_end_hour).contains(&hour)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            daylight_start_hour: default_daylight_start(),
            daylight_end_hour: default_daylight_end(),
            likely_rain_probability: default_likely_rain_probability(),
            likely_rain_amount: default_likely_rain_amount(),
            precip_warning_probability: default_precip_warning_probability(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SelectorConfig {
    /// Base standard deviation allowed inside a consistent window
    #[serde(default = "default_max_std_dev")]
    pub max_std_dev: f64,

    /// Extra standard deviation allowed per additional hour
    #[serde(default = "default_std_dev_growth")]
    pub std_dev_growth: f64,

    /// Single-hour windows are candidates down to this score
    #[serde(default = "default_single_hour_candidate_min")]
    pub single_hour_candidate_min: f64,

    /// Single-hour windows must reach this score to be selected
    #[serde(default = "default_single_hour_min_score")]
    pub single_hour_min_score: f64,

    /// Duration factor for 1, 2, 3 and 4 hour windows
    #[serde(default = "default_duration_factors")]
    pub duration_factors: Vec<f64>,

    /// Base duration factor for windows longer than `duration_factors`
    #[serde(default = "default_long_block_base")]
    pub long_block_base: f64,

    /// Upper bound for any duration factor
    #[serde(default = "default_duration_factor_cap")]
    pub duration_factor_cap: f64,

    /// Consistency factor for a maximally erratic window (perfectly flat is 1.0)
    #[serde(default = "default_consistency_floor")]
    pub consistency_floor: f64,

    /// Added to the combined score per hour beyond the first
    #[serde(default = "default_duration_tie_bonus")]
    pub duration_tie_bonus: f64,

    /// Hours scoring below this form avoid ranges
    #[serde(default = "default_avoid_threshold")]
    pub avoid_threshold: i32,
}

impl SelectorConfig {
    /// Step-wise duration reward, capped
    pub fn duration_factor(&self, duration: usize) -> f64 {
        let factor = match duration {
            0 => 0.0,
            d if d <= self.duration_factors.len() => self.duration_factors[d - 1],
            d => self.long_block_base + (d as f64).ln() / 3.0,
        };
        factor.min(self.duration_factor_cap)
    }

    /// Scale `1 / (1 + std_dev)` into `[consistency_floor, 1.0]`
    pub fn consistency_factor(&self, std_dev: f64) -> f64 {
        let consistency = 1.0 / (1.0 + std_dev);
        self.consistency_floor + consistency * (1.0 - self.consistency_floor)
    }

    /// Longer windows naturally admit more variation
    pub fn std_dev_threshold(&self, duration: usize) -> f64 {
        self.max_std_dev + duration.saturating_sub(1) as f64 * self.std_dev_growth
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            max_std_dev: default_max_std_dev(),
            std_dev_growth: default_std_dev_growth(),
            single_hour_candidate_min: default_single_hour_candidate_min(),
            single_hour_min_score: default_single_hour_min_score(),
            duration_factors: default_duration_factors(),
            long_block_base: default_long_block_base(),
            duration_factor_cap: default_duration_factor_cap(),
            consistency_floor: default_consistency_floor(),
            duration_tie_bonus: default_duration_tie_bonus(),
            avoid_threshold: default_avoid_threshold(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RankingConfig {
    /// Default number of locations returned
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Multiplier for a 2 hour best block
    #[serde(default = "default_bonus_two_hours")]
    pub bonus_two_hours: f64,

    /// Multiplier for a 3 hour best block
    #[serde(default = "default_bonus_three_hours")]
    pub bonus_three_hours: f64,

    /// Multiplier for a best block of 4 hours or more
    #[serde(default = "default_bonus_four_plus_hours")]
    pub bonus_four_plus_hours: f64,

    /// The current hour still counts while fewer minutes than this have passed
    #[serde(default = "default_grace_minutes")]
    pub grace_minutes: u32,
}

impl RankingConfig {
    pub fn duration_bonus(&self, duration: usize) -> f64 {
        match duration {
            0 | 1 => 1.0,
            2 => self.bonus_two_hours,
            3 => self.bonus_three_hours,
            _ => self.bonus_four_plus_hours,
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            bonus_two_hours: default_bonus_two_hours(),
            bonus_three_hours: default_bonus_three_hours(),
            bonus_four_plus_hours: default_bonus_four_plus_hours(),
            grace_minutes: default_grace_minutes(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RecommendationConfig {
    /// Days (starting today) considered when no explicit dates are given
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,

    /// Periods kept per date
    #[serde(default = "default_per_date_limit")]
    pub per_date_limit: usize,

    /// Shortest block worth recommending
    #[serde(default = "default_min_block_len")]
    pub min_block_len: usize,

    /// Blocks shorter than this many hours are damped proportionally
    #[serde(default = "default_full_outing_hours")]
    pub full_outing_hours: f64,

    /// Days averaging below this are skipped
    #[serde(default = "default_primary_day_min_score")]
    pub primary_day_min_score: f64,

    /// Sunny blocks averaging below this are skipped
    #[serde(default = "default_primary_block_min_score")]
    pub primary_block_min_score: f64,

    /// Relaxed day threshold when nothing qualifies
    #[serde(default = "default_fallback_day_min_score")]
    pub fallback_day_min_score: f64,

    /// Relaxed block threshold when nothing qualifies
    #[serde(default = "default_fallback_block_min_score")]
    pub fallback_block_min_score: f64,

    /// A fallback block starting with one of these symbols is dropped
    #[serde(default = "default_extreme_symbols")]
    pub extreme_symbols: Vec<String>,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            horizon_days: default_horizon_days(),
            per_date_limit: default_per_date_limit(),
            min_block_len: default_min_block_len(),
            full_outing_hours: default_full_outing_hours(),
            primary_day_min_score: default_primary_day_min_score(),
            primary_block_min_score: default_primary_block_min_score(),
            fallback_day_min_score: default_fallback_day_min_score(),
            fallback_block_min_score: default_fallback_block_min_score(),
            extreme_symbols: default_extreme_symbols(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_timezone() -> String {
    "Europe/Madrid".to_string()
}

fn default_api_url() -> String {
    "https://api.met.no/weatherapi/locationforecast/2.0/complete".to_string()
}

fn default_compact_api_url() -> String {
    "https://api.met.no/weatherapi/locationforecast/2.0/compact".to_string()
}

fn default_user_agent() -> String {
    concat!("fairweather/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_forecast_days() -> u32 {
    7
}

fn default_cache_ttl_secs() -> u64 {
    30 * 60
}

fn default_min_timeseries_len() -> usize {
    5
}

fn default_daylight_start() -> u32 {
    8
}

fn default_daylight_end() -> u32 {
    20
}

fn default_likely_rain_probability() -> f64 {
    30.0
}

fn default_likely_rain_amount() -> f64 {
    0.5
}

fn default_precip_warning_probability() -> f64 {
    40.0
}

fn default_max_std_dev() -> f64 {
    7.0
}

fn default_std_dev_growth() -> f64 {
    0.8
}

fn default_single_hour_candidate_min() -> f64 {
    -1.0
}

fn default_single_hour_min_score() -> f64 {
    1.0
}

fn default_duration_factors() -> Vec<f64> {
    vec![1.0, 1.4, 1.7, 2.0]
}

fn default_long_block_base() -> f64 {
    2.2
}

fn default_duration_factor_cap() -> f64 {
    2.5
}

fn default_consistency_floor() -> f64 {
    0.7
}

fn default_duration_tie_bonus() -> f64 {
    0.8
}

fn default_avoid_threshold() -> i32 {
    -3
}

fn default_top_n() -> usize {
    5
}

fn default_bonus_two_hours() -> f64 {
    1.1
}

fn default_bonus_three_hours() -> f64 {
    1.2
}

fn default_bonus_four_plus_hours() -> f64 {
    1.3
}

fn default_grace_minutes() -> u32 {
    30
}

fn default_horizon_days() -> u32 {
    3
}

fn default_per_date_limit() -> usize {
    5
}

fn default_min_block_len() -> usize {
    2
}

fn default_full_outing_hours() -> f64 {
    4.0
}

fn default_primary_day_min_score() -> f64 {
    -8.0
}

fn default_primary_block_min_score() -> f64 {
    0.0
}

fn default_fallback_day_min_score() -> f64 {
    -15.0
}

fn default_fallback_block_min_score() -> f64 {
    -10.0
}

fn default_extreme_symbols() -> Vec<String> {
    ["heavyrain", "heavyrainshowers", "thunderstorm"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            .set_default("host", default_host())?
            .set_default("port", default_port())?
            .set_default("timezone", default_timezone())?
            .add_source(File::with_name("config").required(false))
            .add_source(File::with_name("config.local").required(false))
            // FAIRWEATHER_PORT=8080, FAIRWEATHER_ANALYSIS__DAYLIGHT_START_HOUR=9
            .add_source(
                Environment::with_prefix("FAIRWEATHER")
                    .prefix_separator("_")
                    .separator("__")
                    .convert_case(Case::Snake)
                    .try_parsing(true),
            )
            .build()?;

        let app: Self = config.try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    /// Parse the configured timezone
    pub fn tz(&self) -> Result<chrono_tz::Tz, ConfigError> {
        self.timezone
            .parse()
            .map_err(|_| ConfigError::Message(format!("invalid timezone: {}", self.timezone)))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.tz()?;

        if self.analysis.daylight_start_hour > self.analysis.daylight_end_hour
            || self.analysis.daylight_end_hour > 23
        {
            return Err(ConfigError::Message(format!(
                "invalid daylight window {}..={}",
                self.analysis.daylight_start_hour, self.analysis.daylight_end_hour
            )));
        }

        if self.locations.is_empty() {
            return Err(ConfigError::Message("no locations configured".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_factor_steps_and_cap() {
        let cfg = SelectorConfig::default();
        assert_eq!(cfg.duration_factor(1), 1.0);
        assert_eq!(cfg.duration_factor(2), 1.4);
        assert_eq!(cfg.duration_factor(3), 1.7);
        assert_eq!(cfg.duration_factor(4), 2.0);
        assert_eq!(cfg.duration_factor(5), 2.5);
        assert_eq!(cfg.duration_factor(12), 2.5);
    }

    #[test]
    fn test_consistency_factor_band() {
        let cfg = SelectorConfig::default();
        assert!((cfg.consistency_factor(0.0) - 1.0).abs() < 1e-9);
        assert!(cfg.consistency_factor(1000.0) > 0.7);
        assert!(cfg.consistency_factor(1.0) < cfg.consistency_factor(0.5));
    }

    #[test]
    fn test_std_dev_threshold_grows() {
        let cfg = SelectorConfig::default();
        assert_eq!(cfg.std_dev_threshold(1), 7.0);
        assert!((cfg.std_dev_threshold(3) - 8.6).abs() < 1e-9);
    }

    #[test]
    fn test_ranking_duration_bonus() {
        let cfg = RankingConfig::default();
        assert_eq!(cfg.duration_bonus(1), 1.0);
        assert_eq!(cfg.duration_bonus(2), 1.1);
        assert_eq!(cfg.duration_bonus(3), 1.2);
        assert_eq!(cfg.duration_bonus(7), 1.3);
    }

    #[test]
    fn test_daylight_window_inclusive() {
        let cfg = AnalysisConfig::default();
        assert!(cfg.is_daylight(8));
        assert!(cfg.is_daylight(20));
        assert!(!cfg.is_daylight(7));
        assert!(!cfg.is_daylight(21));
    }
}
