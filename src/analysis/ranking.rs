use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Timelike};
use chrono_tz::Tz;
use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

use super::blocks::average_score;
use super::optimal::{select_optimal_block, OptimalBlock};
use crate::config::AppConfig;
use crate::forecast::{HourlyRecord, ProcessedForecast};
use crate::scoring::{normalize_score, Rating};

/// One location's standing for a date
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RankedLocation {
    pub location_key: String,
    pub location_name: String,
    /// Ranking score, duration bonus included
    pub score: f64,
    /// Best-block average, or the plain hourly mean when no block qualified
    pub base_score: f64,
    pub rating: Rating,
    pub normalized_score: u8,
    pub duration: usize,
    pub remaining_hours: usize,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub weather_description: String,
    pub optimal_block: Option<OptimalBlock>,
}

/// Daylight hours of `date` that have not passed at `now`.
///
/// On today the current hour still counts during its first `grace_minutes`.
pub fn remaining_hours(
    hours: &[HourlyRecord],
    date: NaiveDate,
    now: DateTime<Tz>,
    grace_minutes: u32,
) -> Vec<HourlyRecord> {
    if date != now.date_naive() {
        return hours.to_vec();
    }

    hours
        .iter()
        .filter(|h| {
            h.time > now
                || (h.time.date_naive() == date
                    && h.hour == now.hour()
                    && now.minute() < grace_minutes)
        })
        .cloned()
        .collect()
}

/// Rank locations for `date`, best first, at most `top_n`.
///
/// Locations with no daylight hours left are left out entirely.
pub fn rank_locations_for_date(
    forecasts: &IndexMap<String, Arc<ProcessedForecast>>,
    date: NaiveDate,
    now: DateTime<Tz>,
    top_n: usize,
    cfg: &AppConfig,
) -> Vec<RankedLocation> {
    let mut ranked: Vec<RankedLocation> = forecasts
        .iter()
        .filter_map(|(key, forecast)| rank_location(key, forecast, date, now, cfg))
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(top_n);
    ranked
}

fn rank_location(
    key: &str,
    forecast: &ProcessedForecast,
    date: NaiveDate,
    now: DateTime<Tz>,
    cfg: &AppConfig,
) -> Option<RankedLocation> {
    let report = forecast.report(date)?;
    let hours = remaining_hours(
        &report.daylight_hours,
        date,
        now,
        cfg.ranking.grace_minutes,
    );
    if hours.is_empty() {
        tracing::debug!(location = %key, %date, "No daylight hours left");
        return None;
    }

    let optimal_block = select_optimal_block(&hours, 1, &cfg.selector);
    let (base_score, score, duration) = match &optimal_block {
        Some(block) => (
            block.avg_score,
            block.avg_score * cfg.ranking.duration_bonus(block.duration),
            block.duration,
        ),
        None => {
            let mean = average_score(&hours);
            (mean, mean, hours.len())
        }
    };

    Some(RankedLocation {
        location_key: key.to_string(),
        location_name: forecast.location.name.clone(),
        score,
        base_score,
        rating: Rating::from_score(base_score),
        normalized_score: normalize_score(base_score),
        duration,
        remaining_hours: hours.len(),
        min_temp: report.stats.min_temp,
        max_temp: report.stats.max_temp,
        weather_description: report.weather_description(&cfg.analysis),
        optimal_block,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::hourly::test_support::*;
    use crate::forecast::processing::test_support::forecast_from_hours;
    use chrono::TimeZone;

    fn config() -> AppConfig {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }

    fn forecasts(entries: Vec<(&str, Vec<HourlyRecord>)>) -> IndexMap<String, Arc<ProcessedForecast>> {
        entries
            .into_iter()
            .map(|(key, hours)| (key.to_string(), Arc::new(forecast_from_hours(key, hours))))
            .collect()
    }

    fn run(start: u32, scores: &[i32]) -> Vec<HourlyRecord> {
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| make_hour(day(), start + i as u32, *s, "clearsky"))
            .collect()
    }

    fn day_before() -> DateTime<Tz> {
        TZ.with_ymd_and_hms(2024, 5, 31, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_orders_by_boosted_score() {
        let cfg = config();
        let all = forecasts(vec![
            ("short", run(10, &[12])),
            ("long", run(10, &[10, 10, 10, 10])),
            ("mid", run(10, &[11, 11])),
        ]);

        let ranked = rank_locations_for_date(&all, day(), day_before(), 5, &cfg);
        let keys: Vec<&str> = ranked.iter().map(|r| r.location_key.as_str()).collect();

        // 10 * 1.3, 11 * 1.1, 12 * 1.0
        assert_eq!(keys, vec!["long", "mid", "short"]);
        assert!((ranked[0].score - 13.0).abs() < 1e-9);
        assert_eq!(ranked[0].duration, 4);
        assert!((ranked[1].score - 12.1).abs() < 1e-9);
        assert_eq!(ranked[2].duration, 1);
    }

    #[test]
    fn test_truncates_to_top_n() {
        let cfg = config();
        let all = forecasts(vec![
            ("a", run(10, &[5, 5])),
            ("b", run(10, &[6, 6])),
            ("c", run(10, &[7, 7])),
        ]);
        let ranked = rank_locations_for_date(&all, day(), day_before(), 2, &cfg);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].location_key, "c");
    }

    #[test]
    fn test_falls_back_to_plain_average() {
        let cfg = config();
        let all = forecasts(vec![("wet", run(10, &[-4, -2]))]);
        let ranked = rank_locations_for_date(&all, day(), day_before(), 5, &cfg);

        assert_eq!(ranked.len(), 1);
        assert!(ranked[0].optimal_block.is_none());
        assert_eq!(ranked[0].score, -3.0);
        assert_eq!(ranked[0].duration, 2);
    }

    #[test]
    fn test_excludes_locations_without_remaining_hours() {
        let cfg = config();
        let all = forecasts(vec![
            ("morning", run(8, &[10, 10])),
            ("evening", run(18, &[5, 5])),
            ("nothing", vec![]),
        ]);
        let now = at(day(), 15);

        let ranked = rank_locations_for_date(&all, day(), now, 5, &cfg);
        let keys: Vec<&str> = ranked.iter().map(|r| r.location_key.as_str()).collect();
        assert_eq!(keys, vec!["evening"]);
    }

    #[test]
    fn test_current_hour_grace_period() {
        let hours = run(14, &[5, 5, 5]);
        let early = TZ.with_ymd_and_hms(2024, 6, 1, 14, 20, 0).unwrap();
        let late = TZ.with_ymd_and_hms(2024, 6, 1, 14, 40, 0).unwrap();

        assert_eq!(remaining_hours(&hours, day(), early, 30).len(), 3);
        assert_eq!(remaining_hours(&hours, day(), late, 30).len(), 2);
    }

    #[test]
    fn test_future_date_keeps_all_hours() {
        let hours = run(8, &[1, 1, 1]);
        let now = at(day(), 19);
        let tomorrow = day().succ_opt().unwrap();
        assert_eq!(remaining_hours(&hours, tomorrow, now, 30).len(), 3);
    }
}
