use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use super::hourly::HourlyRecord;
use crate::config::AnalysisConfig;
use crate::scoring::WeatherClass;

/// Aggregates over one day's daylight hours
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DayStats {
    pub sunny_hours: u32,
    pub partly_cloudy_hours: u32,
    pub rainy_hours: u32,
    pub likely_rain_hours: u32,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub avg_temp: Option<f64>,
    pub avg_precip_prob: Option<f64>,
    /// Mean total score per hour; negative infinity when there are no hours
    /// (serialized as `null`)
    pub avg_score: f64,
}

impl DayStats {
    fn empty() -> Self {
        Self {
            sunny_hours: 0,
            partly_cloudy_hours: 0,
            rainy_hours: 0,
            likely_rain_hours: 0,
            min_temp: None,
            max_temp: None,
            avg_temp: None,
            avg_precip_prob: None,
            avg_score: f64::NEG_INFINITY,
        }
    }

    /// Single pass over `hours`
    pub fn compute(hours: &[HourlyRecord], cfg: &AnalysisConfig) -> Self {
        if hours.is_empty() {
            return Self::empty();
        }

        let mut stats = Self::empty();
        let mut temp_sum = 0.0;
        let mut temp_count = 0usize;
        let mut prob_sum = 0.0;
        let mut prob_count = 0usize;
        let mut score_sum = 0i64;

        for hour in hours {
            match hour.class() {
                WeatherClass::Sunny => stats.sunny_hours += 1,
                WeatherClass::Rainy => stats.rainy_hours += 1,
                WeatherClass::Cloudy if hour.symbol() == "partlycloudy" => {
                    stats.partly_cloudy_hours += 1
                }
                WeatherClass::Cloudy => {}
            }

            let c = &hour.conditions;
            let likely_by_prob = c
                .precipitation_probability
                .is_some_and(|p| p > cfg.likely_rain_probability);
            let likely_by_amount = c
                .precipitation_amount
                .is_some_and(|a| a > cfg.likely_rain_amount);
            if likely_by_prob || likely_by_amount {
                stats.likely_rain_hours += 1;
            }

            if let Some(t) = c.temperature {
                stats.min_temp = Some(stats.min_temp.map_or(t, |m| m.min(t)));
                stats.max_temp = Some(stats.max_temp.map_or(t, |m| m.max(t)));
                temp_sum += t;
                temp_count += 1;
            }

            if let Some(p) = c.precipitation_probability {
                prob_sum += p;
                prob_count += 1;
            }

            score_sum += i64::from(hour.total_score());
        }

        stats.avg_temp = (temp_count > 0).then(|| temp_sum / temp_count as f64);
        stats.avg_precip_prob = (prob_count > 0).then(|| prob_sum / prob_count as f64);
        stats.avg_score = score_sum as f64 / hours.len() as f64;
        stats
    }
}

/// Daylight summary for one calendar day at one location
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub location_name: String,
    pub daylight_hours: Vec<HourlyRecord>,
    #[serde(flatten)]
    pub stats: DayStats,
}

impl DailyReport {
    /// Keep the daylight subset of `hours` (sorted by time) and aggregate it
    pub fn from_day(
        date: NaiveDate,
        location_name: &str,
        hours: &[HourlyRecord],
        cfg: &AnalysisConfig,
    ) -> Self {
        let mut daylight_hours: Vec<HourlyRecord> = hours
            .iter()
            .filter(|h| cfg.is_daylight(h.hour))
            .cloned()
            .collect();
        daylight_hours.sort_by_key(|h| h.time);

        let stats = DayStats::compute(&daylight_hours, cfg);
        Self {
            date,
            location_name: location_name.to_string(),
            daylight_hours,
            stats,
        }
    }

    pub fn avg_score(&self) -> f64 {
        self.stats.avg_score
    }

    pub fn has_data(&self) -> bool {
        !self.daylight_hours.is_empty()
    }

    /// Short human description. Rain dominates every other count.
    pub fn weather_description(&self, cfg: &AnalysisConfig) -> String {
        let s = &self.stats;
        if s.rainy_hours > 0 {
            return format!("Rain ({}h)", s.rainy_hours);
        }

        let base = if s.sunny_hours > s.partly_cloudy_hours {
            "Sunny"
        } else if s.partly_cloudy_hours > s.sunny_hours {
            "Partly Cloudy"
        } else {
            "Mixed"
        };

        match s.avg_precip_prob {
            Some(p) if p > cfg.precip_warning_probability => format!("{base} - {p:.0}% rain"),
            _ => base.to_string(),
        }
    }
}
