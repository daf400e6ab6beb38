use chrono::{DateTime, Timelike};
use chrono_tz::Tz;
use serde::Serialize;
use utoipa::ToSchema;

use super::models::TimeseriesEntry;
use crate::scoring::{base_symbol, ScoringTables, WeatherClass};

/// Raw measurements for one forecast hour
#[derive(Debug, Clone, PartialEq, Default, Serialize, ToSchema)]
pub struct Conditions {
    /// °C
    pub temperature: Option<f64>,
    /// m/s
    pub wind_speed: Option<f64>,
    /// %
    pub cloud_coverage: Option<f64>,
    /// mm over the shortest available horizon
    pub precipitation_amount: Option<f64>,
    /// % over the shortest available horizon
    pub precipitation_probability: Option<f64>,
    /// %
    pub humidity: Option<f64>,
    /// Base met.no symbol, `unknown` when absent
    pub symbol: String,
}

/// Per-factor comfort scores. Missing inputs contribute 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
pub struct SubScores {
    pub temperature: i32,
    pub wind: i32,
    pub cloud: i32,
    pub precipitation: i32,
    pub humidity: i32,
}

impl SubScores {
    pub fn from_conditions(conditions: &Conditions, tables: &ScoringTables) -> Self {
        Self {
            temperature: tables.temperature_score(conditions.temperature),
            wind: tables.wind_score(conditions.wind_speed),
            cloud: tables.cloud_score(conditions.cloud_coverage),
            precipitation: tables.precipitation_score(
                conditions.precipitation_amount,
                conditions.precipitation_probability,
            ),
            humidity: tables.humidity_score(conditions.humidity),
        }
    }

    /// Every factor is always counted, so hours with partial data are not rescaled
    pub fn sum(&self) -> i32 {
        self.temperature + self.wind + self.cloud + self.precipitation + self.humidity
    }
}

/// One scored forecast hour for one location.
///
/// The total is fixed at construction; there is no way to change the
/// sub-scores afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HourlyRecord {
    #[schema(value_type = String)]
    pub time: DateTime<Tz>,
    pub hour: u32,
    #[serde(flatten)]
    pub conditions: Conditions,
    scores: SubScores,
    total_score: i32,
}

impl HourlyRecord {
    pub fn new(time: DateTime<Tz>, conditions: Conditions, scores: SubScores) -> Self {
        Self {
            hour: time.hour(),
            time,
            conditions,
            total_score: scores.sum(),
            scores,
        }
    }

    /// Score `conditions` with `tables`
    pub fn scored(time: DateTime<Tz>, conditions: Conditions, tables: &ScoringTables) -> Self {
        let scores = SubScores::from_conditions(&conditions, tables);
        Self::new(time, conditions, scores)
    }

    /// Build from a met.no timeseries entry, localised to `tz`.
    ///
    /// The 1 hour horizon is preferred for precipitation and symbol, the
    /// 6 hour horizon fills in whatever it lacks.
    pub fn from_entry(entry: &TimeseriesEntry, tz: Tz, tables: &ScoringTables) -> Self {
        let instant = &entry.data.instant.details;
        let next_1h = entry.data.next_1_hours.as_ref();
        let next_6h = entry.data.next_6_hours.as_ref();

        let precipitation_amount = next_1h
            .and_then(|n| n.precipitation_amount())
            .or_else(|| next_6h.and_then(|n| n.precipitation_amount()));
        let precipitation_probability = next_1h
            .and_then(|n| n.precipitation_probability())
            .or_else(|| next_6h.and_then(|n| n.precipitation_probability()));
        let symbol_code = next_1h
            .and_then(|n| n.symbol_code())
            .filter(|s| !s.is_empty())
            .or_else(|| next_6h.and_then(|n| n.symbol_code()));

        let conditions = Conditions {
            temperature: instant.air_temperature,
            wind_speed: instant.wind_speed,
            cloud_coverage: instant.cloud_area_fraction,
            precipitation_amount,
            precipitation_probability,
            humidity: instant.relative_humidity,
            symbol: base_symbol(symbol_code),
        };

        Self::scored(entry.time.with_timezone(&tz), conditions, tables)
    }

    pub fn scores(&self) -> SubScores {
        self.scores
    }

    pub fn total_score(&self) -> i32 {
        self.total_score
    }

    pub fn symbol(&self) -> &str {
        &self.conditions.symbol
    }

    pub fn class(&self) -> WeatherClass {
        WeatherClass::from_symbol(&self.conditions.symbol)
    }
}
