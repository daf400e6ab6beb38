use serde::{Deserialize, Serialize};

use super::ranges::{Bounds, RangeTable, ScoreBand};

/// All comfort range tables used to score a single forecast hour.
///
/// Every table can be replaced from configuration; the defaults are the
/// reference tables below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringTables {
    /// Air temperature in °C. Peak 20-24, floor -15.
    #[serde(default = "default_temperature")]
    pub temperature: RangeTable,

    /// Wind speed in m/s. Best at a light breeze, floor -8.
    #[serde(default = "default_wind")]
    pub wind: RangeTable,

    /// Cloud area fraction in %. Some cover beats clear sky, floor -3.
    #[serde(default = "default_cloud")]
    pub cloud: RangeTable,

    /// Precipitation amount in mm. Exactly 0 has its own bucket, floor -12.
    #[serde(default = "default_precipitation_amount")]
    pub precipitation_amount: RangeTable,

    /// Precipitation probability in %. Used only when no amount is forecast.
    #[serde(default = "default_precipitation_probability")]
    pub precipitation_probability: RangeTable,

    /// Relative humidity in %. Best between 40 and 60, floor -4.
    #[serde(default = "default_humidity")]
    pub humidity: RangeTable,
}

impl Default for ScoringTables {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            wind: default_wind(),
            cloud: default_cloud(),
            precipitation_amount: default_precipitation_amount(),
            precipitation_probability: default_precipitation_probability(),
            humidity: default_humidity(),
        }
    }
}

impl ScoringTables {
    pub fn temperature_score(&self, celsius: Option<f64>) -> i32 {
        self.temperature.score(celsius)
    }

    pub fn wind_score(&self, speed: Option<f64>) -> i32 {
        self.wind.score(speed)
    }

    pub fn cloud_score(&self, coverage: Option<f64>) -> i32 {
        self.cloud.score(coverage)
    }

    pub fn humidity_score(&self, relative_humidity: Option<f64>) -> i32 {
        self.humidity.score(relative_humidity)
    }

    /// Score precipitation, preferring the amount over the probability
    pub fn precipitation_score(&self, amount: Option<f64>, probability: Option<f64>) -> i32 {
        match amount.filter(|a| a.is_finite()) {
            Some(mm) => self.precipitation_amount.score(Some(mm)),
            None => self.precipitation_probability.score(probability),
        }
    }
}

fn default_temperature() -> RangeTable {
    RangeTable::new(
        Bounds::Inclusive,
        vec![
            ScoreBand::new(20.0, 24.0, 7),
            ScoreBand::new(17.0, 20.0, 6),
            ScoreBand::new(24.0, 27.0, 6),
            ScoreBand::new(15.0, 17.0, 4),
            ScoreBand::new(27.0, 30.0, 4),
            ScoreBand::new(10.0, 15.0, 2),
            ScoreBand::new(30.0, 33.0, 1),
            ScoreBand::new(5.0, 10.0, -1),
            ScoreBand::new(33.0, 36.0, -3),
            ScoreBand::new(0.0, 5.0, -6),
            ScoreBand::new(36.0, 40.0, -9),
            ScoreBand::new(-5.0, 0.0, -9),
        ],
        -15,
    )
}

fn default_wind() -> RangeTable {
    RangeTable::new(
        Bounds::HalfOpen,
        vec![
            ScoreBand::new(1.0, 3.0, 2),
            ScoreBand::new(0.0, 1.0, 1),
            ScoreBand::new(3.0, 5.0, 0),
            ScoreBand::new(5.0, 8.0, -2),
            ScoreBand::new(8.0, 12.0, -4),
            ScoreBand::new(12.0, 16.0, -6),
            ScoreBand::new(16.0, 20.0, -7),
        ],
        -8,
    )
}

fn default_cloud() -> RangeTable {
    RangeTable::new(
        Bounds::HalfOpen,
        vec![
            ScoreBand::new(10.0, 30.0, 4),
            ScoreBand::new(0.0, 10.0, 3),
            ScoreBand::new(30.0, 60.0, 2),
            ScoreBand::new(60.0, 80.0, 0),
            ScoreBand::new(80.0, 95.0, -1),
        ],
        -3,
    )
}

fn default_precipitation_amount() -> RangeTable {
    RangeTable::new(
        Bounds::Inclusive,
        vec![
            ScoreBand::new(0.0, 0.0, 5),
            ScoreBand::new(0.0, 0.1, 4),
            ScoreBand::new(0.1, 0.5, 2),
            ScoreBand::new(0.5, 1.0, 0),
            ScoreBand::new(1.0, 2.5, -2),
            ScoreBand::new(2.5, 5.0, -4),
            ScoreBand::new(5.0, 10.0, -6),
            ScoreBand::new(10.0, 20.0, -8),
        ],
        -12,
    )
}

fn default_precipitation_probability() -> RangeTable {
    RangeTable::new(
        Bounds::Inclusive,
        vec![
            ScoreBand::new(0.0, 0.0, 5),
            ScoreBand::new(0.0, 10.0, 3),
            ScoreBand::new(10.0, 30.0, 0),
            ScoreBand::new(30.0, 50.0, -3),
            ScoreBand::new(50.0, 70.0, -6),
            ScoreBand::new(70.0, 90.0, -9),
        ],
        -12,
    )
}

fn default_humidity() -> RangeTable {
    RangeTable::new(
        Bounds::Inclusive,
        vec![
            ScoreBand::new(40.0, 60.0, 3),
            ScoreBand::new(30.0, 40.0, 2),
            ScoreBand::new(60.0, 70.0, 1),
            ScoreBand::new(20.0, 30.0, 0),
            ScoreBand::new(70.0, 80.0, 0),
            ScoreBand::new(80.0, 85.0, -1),
            ScoreBand::new(15.0, 20.0, -1),
            ScoreBand::new(85.0, 90.0, -2),
            ScoreBand::new(10.0, 15.0, -2),
            ScoreBand::new(90.0, 95.0, -3),
            ScoreBand::new(5.0, 10.0, -3),
        ],
        -4,
    )
}
