use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate};
use chrono_tz::Tz;
use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

use super::blocks::{extract_blocks, WeatherBlock};
use crate::config::{AppConfig, RecommendationConfig};
use crate::forecast::{HourlyRecord, ProcessedForecast};
use crate::locations::normalize_key;
use crate::scoring::{symbol_info, WeatherClass, UNKNOWN_SYMBOL};

/// A recommended outing window
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RecommendationPeriod {
    pub location_key: String,
    pub location_name: String,
    pub date: NaiveDate,
    #[schema(value_type = String)]
    pub start: DateTime<Tz>,
    #[schema(value_type = String)]
    pub end: DateTime<Tz>,
    pub duration: usize,
    /// Ordering score: the block average, damped for short blocks outside the relaxed pass
    pub score: f64,
    pub avg_score: f64,
    pub class: WeatherClass,
    pub avg_temp: Option<f64>,
    pub dominant_symbol: String,
    pub dominant_label: String,
    /// Found with relaxed thresholds because nothing passed the normal ones
    pub relaxed: bool,
}

/// Which blocks a search pass accepts
struct Thresholds<'a> {
    day_min: f64,
    block_min: f64,
    sunny_only: bool,
    excluded_first_symbols: &'a [String],
    damp_short: bool,
    relaxed: bool,
}

impl<'a> Thresholds<'a> {
    fn primary(cfg: &'a RecommendationConfig) -> Self {
        Self {
            day_min: cfg.primary_day_min_score,
            block_min: cfg.primary_block_min_score,
            sunny_only: true,
            excluded_first_symbols: &[],
            damp_short: true,
            relaxed: false,
        }
    }

    fn fallback(cfg: &'a RecommendationConfig) -> Self {
        Self {
            day_min: cfg.fallback_day_min_score,
            block_min: cfg.fallback_block_min_score,
            sunny_only: false,
            excluded_first_symbols: &cfg.extreme_symbols,
            damp_short: false,
            relaxed: true,
        }
    }

    fn accepts(&self, block: &WeatherBlock) -> bool {
        if self.sunny_only && block.class != WeatherClass::Sunny {
            return false;
        }
        if block.avg_score < self.block_min {
            return false;
        }
        let first = block.hours.first().map_or(UNKNOWN_SYMBOL, HourlyRecord::symbol);
        !self
            .excluded_first_symbols
            .iter()
            .any(|s| first.contains(s.as_str()))
    }

    /// Short blocks are damped only in the normal pass and only when non-negative
    fn score(&self, block: &WeatherBlock, full_outing_hours: f64) -> f64 {
        if self.damp_short && block.avg_score >= 0.0 {
            block.avg_score * (block.duration as f64 / full_outing_hours).min(1.0)
        } else {
            block.avg_score
        }
    }
}

/// Most frequent symbol; ties go to the one seen first
pub fn dominant_symbol(hours: &[HourlyRecord]) -> String {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for hour in hours {
        *counts.entry(hour.symbol()).or_default() += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (symbol, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((symbol, count));
        }
    }
    best.map_or_else(|| UNKNOWN_SYMBOL.to_string(), |(s, _)| s.to_string())
}

/// Dates considered when none are given: today and the following days
pub fn default_target_dates(today: NaiveDate, horizon_days: u32) -> Vec<NaiveDate> {
    (0..u64::from(horizon_days))
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .collect()
}

/// Best outing windows across locations, by date ascending then score descending,
/// longer blocks first on equal scores.
///
/// Blocks from sunny runs of at least `min_block_len` hours are scored by
/// `avg_score * min(1, duration / full_outing_hours)`. When no location yields
/// any period, a relaxed pass accepts any weather class, scores by the plain
/// average and drops blocks whose first symbol contains an extreme symbol.
/// At most `per_date_limit` periods per date.
pub fn recommend_best_times(
    forecasts: &IndexMap<String, Arc<ProcessedForecast>>,
    location: Option<&str>,
    dates: Option<&[NaiveDate]>,
    today: NaiveDate,
    cfg: &AppConfig,
) -> Vec<RecommendationPeriod> {
    let rc = &cfg.recommendation;
    let targets: Vec<NaiveDate> = match dates {
        Some(dates) if !dates.is_empty() => dates.to_vec(),
        _ => default_target_dates(today, rc.horizon_days),
    };
    let wanted = location.map(normalize_key);

    let selected: Vec<(&String, &Arc<ProcessedForecast>)> = forecasts
        .iter()
        .filter(|(key, _)| wanted.as_ref().map_or(true, |w| normalize_key(key) == *w))
        .collect();

    let collect = |thresholds: &Thresholds<'_>| -> Vec<RecommendationPeriod> {
        selected
            .iter()
            .flat_map(|(key, forecast)| {
                periods_for_location(key, forecast, &targets, thresholds, rc)
            })
            .collect()
    };

    let mut periods = collect(&Thresholds::primary(rc));
    if periods.is_empty() {
        tracing::debug!("No recommendation passed the normal thresholds, relaxing");
        periods = collect(&Thresholds::fallback(rc));
    }

    periods.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then(b.score.total_cmp(&a.score))
            .then(b.duration.cmp(&a.duration))
    });

    let mut per_date: IndexMap<NaiveDate, usize> = IndexMap::new();
    periods.retain(|p| {
        let n = per_date.entry(p.date).or_default();
        *n += 1;
        *n <= rc.per_date_limit
    });
    periods
}

fn periods_for_location(
    key: &str,
    forecast: &ProcessedForecast,
    targets: &[NaiveDate],
    thresholds: &Thresholds<'_>,
    rc: &RecommendationConfig,
) -> Vec<RecommendationPeriod> {
    let mut periods = Vec::new();

    for (date, report) in &forecast.reports {
        if !targets.contains(date) || report.avg_score() < thresholds.day_min {
            continue;
        }

        for block in extract_blocks(&report.daylight_hours, rc.min_block_len) {
            if !thresholds.accepts(&block) {
                continue;
            }

            let score = thresholds.score(&block, rc.full_outing_hours);
            let dominant = dominant_symbol(&block.hours);
            periods.push(RecommendationPeriod {
                location_key: key.to_string(),
                location_name: forecast.location.name.clone(),
                date: *date,
                start: block.start,
                end: block.end,
                duration: block.duration,
                score,
                avg_score: block.avg_score,
                class: block.class,
                avg_temp: block.avg_temp,
                dominant_label: symbol_info(&dominant).label,
                dominant_symbol: dominant,
                relaxed: thresholds.relaxed,
            });
        }
    }

    periods
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::hourly::test_support::*;
    use crate::forecast::processing::test_support::forecast_from_hours;

    fn config() -> AppConfig {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }

    fn forecasts(entries: Vec<(&str, Vec<HourlyRecord>)>) -> IndexMap<String, Arc<ProcessedForecast>> {
        entries
            .into_iter()
            .map(|(key, hours)| (key.to_string(), Arc::new(forecast_from_hours(key, hours))))
            .collect()
    }

    fn run_on(date: NaiveDate, start: u32, scores: &[i32], symbol: &str) -> Vec<HourlyRecord> {
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| make_hour(date, start + i as u32, *s, symbol))
            .collect()
    }

    #[test]
    fn test_short_blocks_are_damped() {
        let cfg = config();
        let all = forecasts(vec![
            ("two", run_on(day(), 10, &[10, 10], "clearsky")),
            ("four", run_on(day(), 10, &[8, 8, 8, 8], "fair")),
        ]);

        let periods = recommend_best_times(&all, None, None, day(), &cfg);
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].location_key, "four");
        assert_eq!(periods[0].score, 8.0);
        assert_eq!(periods[1].score, 5.0);
        assert!(!periods[0].relaxed);
    }

    #[test]
    fn test_only_sunny_blocks_in_primary_pass() {
        let cfg = config();
        let mut hours = run_on(day(), 9, &[6, 6], "partlycloudy");
        hours.extend(run_on(day(), 11, &[7, 7, 7], "clearsky"));
        let all = forecasts(vec![("gijon", hours)]);

        let periods = recommend_best_times(&all, None, None, day(), &cfg);
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].class, WeatherClass::Sunny);
        assert_eq!(periods[0].duration, 3);
        assert_eq!(periods[0].dominant_symbol, "clearsky");
        assert_eq!(periods[0].dominant_label, "Sunny");
    }

    #[test]
    fn test_sorted_by_date_then_score_with_limit() {
        let cfg = config();
        let tomorrow = day().succ_opt().unwrap();
        let mut entries = Vec::new();
        let keys = ["a", "b", "c", "d", "e", "f"];
        for (i, key) in keys.iter().enumerate() {
            let mut hours = run_on(tomorrow, 10, &[i as i32 + 1, i as i32 + 1], "clearsky");
            hours.extend(run_on(day(), 10, &[4, 4, 4, 4], "clearsky"));
            entries.push((*key, hours));
        }
        let all = forecasts(entries);

        let periods = recommend_best_times(&all, None, None, day(), &cfg);
        let today_count = periods.iter().filter(|p| p.date == day()).count();
        let tomorrow_periods: Vec<_> = periods.iter().filter(|p| p.date == tomorrow).collect();

        assert_eq!(today_count, 5);
        assert_eq!(tomorrow_periods.len(), 5);
        assert_eq!(periods[0].date, day());
        assert_eq!(tomorrow_periods[0].location_key, "f");
        assert!(tomorrow_periods.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_location_and_date_filters() {
        let cfg = config();
        let later = day().checked_add_days(Days::new(5)).unwrap();
        let mut gijon = run_on(day(), 10, &[6, 6], "clearsky");
        gijon.extend(run_on(later, 10, &[9, 9], "clearsky"));
        let all = forecasts(vec![
            ("gijon", gijon),
            ("oviedo", run_on(day(), 10, &[9, 9], "clearsky")),
        ]);

        let periods = recommend_best_times(&all, Some("GIJON"), None, day(), &cfg);
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].date, day());

        let periods = recommend_best_times(&all, Some("gijon"), Some(&[later]), day(), &cfg);
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].date, later);
    }

    #[test]
    fn test_fallback_when_nothing_sunny() {
        let cfg = config();
        let mut hours = run_on(day(), 9, &[-9, -9], "heavyrain");
        hours.extend(run_on(day(), 11, &[-4, -4, -4], "cloudy"));
        let all = forecasts(vec![("luarca", hours)]);

        let periods = recommend_best_times(&all, None, None, day(), &cfg);
        assert_eq!(periods.len(), 1);
        assert!(periods[0].relaxed);
        assert_eq!(periods[0].class, WeatherClass::Cloudy);
        assert_eq!(periods[0].avg_score, -4.0);
    }

    #[test]
    fn test_relaxed_pass_orders_by_plain_average() {
        let cfg = config();
        let all = forecasts(vec![
            ("short", run_on(day(), 10, &[-4, -4], "cloudy")),
            ("worse", run_on(day(), 10, &[-5, -5], "cloudy")),
            ("long", run_on(day(), 10, &[-4, -4, -4, -4], "cloudy")),
        ]);

        let periods = recommend_best_times(&all, None, None, day(), &cfg);
        let order: Vec<&str> = periods.iter().map(|p| p.location_key.as_str()).collect();
        assert_eq!(order, ["long", "short", "worse"]);
        assert!(periods.iter().all(|p| p.relaxed && p.score == p.avg_score));
    }

    #[test]
    fn test_relaxed_pass_drops_thunder_openers() {
        let cfg = config();
        let mut hours = run_on(day(), 9, &[-6, -6], "heavyrainandthunder");
        hours.extend(run_on(day(), 11, &[-2, -2], "cloudy"));
        let all = forecasts(vec![("cudillero", hours)]);

        let periods = recommend_best_times(&all, None, None, day(), &cfg);
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].dominant_symbol, "cloudy");
        assert!(periods.iter().all(|p| !p.dominant_symbol.contains("heavyrain")));
    }

    #[test]
    fn test_fallback_skips_terrible_days() {
        let cfg = config();
        let all = forecasts(vec![("x", run_on(day(), 10, &[-20, -20], "thunderstorm"))]);
        assert!(recommend_best_times(&all, None, None, day(), &cfg).is_empty());
    }

    #[test]
    fn test_dominant_symbol_first_seen_wins_ties() {
        let hours = vec![
            make_hour(day(), 10, 5, "fair"),
            make_hour(day(), 11, 5, "clearsky"),
            make_hour(day(), 12, 5, "clearsky"),
            make_hour(day(), 13, 5, "fair"),
        ];
        assert_eq!(dominant_symbol(&hours), "fair");
        assert_eq!(dominant_symbol(&hours[1..]), "clearsky");
        assert_eq!(dominant_symbol(&[]), UNKNOWN_SYMBOL);
    }

    #[test]
    fn test_default_target_dates() {
        let dates = default_target_dates(day(), 3);
        assert_eq!(dates.len(), 3);
        assert_eq!(dates[0], day());
        assert_eq!(dates[2], day().checked_add_days(Days::new(2)).unwrap());
    }
}
