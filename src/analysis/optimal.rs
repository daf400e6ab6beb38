use std::cmp::Ordering;

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;
use utoipa::ToSchema;

use super::blocks::{find_consistent_blocks, is_next_hour, weather_averages, CandidateWindow};
use crate::config::SelectorConfig;
use crate::forecast::HourlyRecord;
use crate::scoring::symbol_info;

/// The single best window of a day
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OptimalBlock {
    #[schema(value_type = String)]
    pub start: DateTime<Tz>,
    #[schema(value_type = String)]
    pub end: DateTime<Tz>,
    pub duration: usize,
    pub avg_score: f64,
    /// Selection score only, not meant for display
    pub combined_score: f64,
    pub duration_factor: f64,
    pub consistency_factor: f64,
    pub std_dev: f64,
    pub avg_temp: Option<f64>,
    pub avg_wind: Option<f64>,
}

impl OptimalBlock {
    fn from_candidate(candidate: &CandidateWindow<'_>, cfg: &SelectorConfig) -> Option<Self> {
        let first = candidate.hours.first()?;
        let last = candidate.hours.last()?;
        let duration = candidate.duration();
        let duration_factor = cfg.duration_factor(duration);
        let consistency_factor = cfg.consistency_factor(candidate.std_dev);
        let combined_score = candidate.avg_score * duration_factor * consistency_factor
            + duration.saturating_sub(1) as f64 * cfg.duration_tie_bonus;
        let (avg_temp, avg_wind) = weather_averages(candidate.hours);

        Some(Self {
            start: first.time,
            end: last.time,
            duration,
            avg_score: candidate.avg_score,
            combined_score,
            duration_factor,
            consistency_factor,
            std_dev: candidate.std_dev,
            avg_temp,
            avg_wind,
        })
    }

    /// Higher combined score wins; equal scores go to the earlier start, then the longer block
    fn beats(&self, other: &Self) -> bool {
        match self.combined_score.partial_cmp(&other.combined_score) {
            Some(Ordering::Greater) => true,
            Some(Ordering::Equal) => {
                self.start < other.start
                    || (self.start == other.start && self.duration > other.duration)
            }
            _ => false,
        }
    }
}

/// Pick the window balancing average score, duration and steadiness.
///
/// Returns `None` when no window of at least `min_duration` hours averages a
/// non-negative score, or a single hour is all there is and it falls below
/// `single_hour_min_score`.
pub fn select_optimal_block(
    hours: &[HourlyRecord],
    min_duration: usize,
    cfg: &SelectorConfig,
) -> Option<OptimalBlock> {
    let mut sorted = hours.to_vec();
    sorted.sort_by_key(|h| h.time);

    let min_duration = min_duration.max(1);
    let mut best: Option<OptimalBlock> = None;

    for candidate in find_consistent_blocks(&sorted, cfg) {
        let duration = candidate.duration();
        if duration < min_duration || candidate.avg_score < 0.0 {
            continue;
        }
        if duration == 1 && candidate.avg_score < cfg.single_hour_min_score {
            continue;
        }

        let Some(block) = OptimalBlock::from_candidate(&candidate, cfg) else {
            continue;
        };
        if best.as_ref().map_or(true, |b| block.beats(b)) {
            best = Some(block);
        }
    }

    best
}

/// A run of hours bad enough to warn about
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AvoidRange {
    #[schema(value_type = String)]
    pub start: DateTime<Tz>,
    #[schema(value_type = String)]
    pub end: DateTime<Tz>,
    pub duration: usize,
    pub worst_score: i32,
    /// Symbol of the first hour in the run
    pub reason: String,
    pub reason_label: String,
}

impl AvoidRange {
    fn from_run(run: &[HourlyRecord]) -> Option<Self> {
        let first = run.first()?;
        let last = run.last()?;
        let worst_score = run.iter().map(HourlyRecord::total_score).min()?;
        Some(Self {
            start: first.time,
            end: last.time,
            duration: run.len(),
            worst_score,
            reason: first.symbol().to_string(),
            reason_label: symbol_info(first.symbol()).label,
        })
    }
}

/// Maximal contiguous runs of hours scoring below `cfg.avoid_threshold`
pub fn find_avoid_ranges(hours: &[HourlyRecord], cfg: &SelectorConfig) -> Vec<AvoidRange> {
    let mut sorted = hours.to_vec();
    sorted.sort_by_key(|h| h.time);

    let mut ranges = Vec::new();
    let mut run_start: Option<usize> = None;

    for (i, hour) in sorted.iter().enumerate() {
        let bad = hour.total_score() < cfg.avoid_threshold;
        let continues = i > 0 && is_next_hour(&sorted[i - 1], hour);

        match run_start {
            Some(_) if bad && continues => {}
            Some(start) => {
                ranges.extend(AvoidRange::from_run(&sorted[start..i]));
                run_start = bad.then_some(i);
            }
            None => run_start = bad.then_some(i),
        }
    }

    if let Some(start) = run_start {
        ranges.extend(AvoidRange::from_run(&sorted[start..]));
    }

    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::hourly::test_support::*;

    #[test]
    fn test_scenario_picks_sunny_run() {
        let cfg = SelectorConfig::default();
        let hours = vec![
            make_hour(day(), 10, 8, "clearsky"),
            make_hour(day(), 11, 9, "clearsky"),
            make_hour(day(), 12, 10, "clearsky"),
            make_hour(day(), 13, -4, "rain"),
            make_hour(day(), 14, -6, "rain"),
        ];

        let best = select_optimal_block(&hours, 1, &cfg).unwrap();
        assert_eq!(best.duration, 3);
        assert_eq!(best.avg_score, 9.0);
        assert_eq!(best.start, at(day(), 10));
        assert_eq!(best.end, at(day(), 12));
    }

    #[test]
    fn test_dominant_run_beats_singletons() {
        let cfg = SelectorConfig::default();
        let hours = vec![
            make_hour(day(), 8, 12, "fair"),
            make_hour(day(), 9, -8, "rain"),
            make_hour(day(), 10, 10, "clearsky"),
            make_hour(day(), 11, 11, "clearsky"),
            make_hour(day(), 12, 10, "clearsky"),
            make_hour(day(), 13, 11, "clearsky"),
            make_hour(day(), 14, -9, "rain"),
            make_hour(day(), 15, 13, "fair"),
        ];

        let best = select_optimal_block(&hours, 1, &cfg).unwrap();
        assert_eq!(best.start, at(day(), 10));
        assert_eq!(best.duration, 4);
    }

    fn tied_block(start_hour: u32, duration: usize) -> OptimalBlock {
        OptimalBlock {
            start: at(day(), start_hour),
            end: at(day(), start_hour + duration as u32 - 1),
            duration,
            avg_score: 5.0,
            combined_score: 7.0,
            duration_factor: 1.4,
            consistency_factor: 1.0,
            std_dev: 0.0,
            avg_temp: None,
            avg_wind: None,
        }
    }

    #[test]
    fn test_tie_prefers_earliest_start() {
        let cfg = SelectorConfig::default();
        let hours = vec![
            make_hour(day(), 9, 6, "fair"),
            make_hour(day(), 10, 6, "fair"),
            make_hour(day(), 11, -10, "rain"),
            make_hour(day(), 12, 6, "fair"),
            make_hour(day(), 13, 6, "fair"),
        ];

        let best = select_optimal_block(&hours, 1, &cfg).unwrap();
        assert_eq!(best.start, at(day(), 9));
        assert_eq!(best.duration, 2);

        // evaluation order does not matter
        let early = tied_block(9, 2);
        let late = tied_block(12, 2);
        assert!(early.beats(&late));
        assert!(!late.beats(&early));
    }

    #[test]
    fn test_tie_at_same_start_prefers_longer() {
        let cfg = SelectorConfig {
            duration_factors: vec![1.0, 1.0],
            duration_tie_bonus: 0.0,
            ..SelectorConfig::default()
        };
        let hours = vec![make_hour(day(), 9, 5, "fair"), make_hour(day(), 10, 5, "fair")];

        // 9:00 for 1h, 9:00 for 2h and 10:00 for 1h all combine to exactly 5
        let best = select_optimal_block(&hours, 1, &cfg).unwrap();
        assert_eq!(best.combined_score, 5.0);
        assert_eq!(best.start, at(day(), 9));
        assert_eq!(best.duration, 2);

        let short = tied_block(9, 1);
        let long = tied_block(9, 2);
        assert!(long.beats(&short));
        assert!(!short.beats(&long));
        assert!(!short.beats(&short.clone()));
    }

    #[test]
    fn test_no_block_when_all_negative() {
        let cfg = SelectorConfig::default();
        let hours = vec![make_hour(day(), 9, -5, "rain"), make_hour(day(), 10, -2, "cloudy")];
        assert!(select_optimal_block(&hours, 1, &cfg).is_none());
        assert!(select_optimal_block(&[], 1, &cfg).is_none());
    }

    #[test]
    fn test_weak_single_hour_rejected() {
        let cfg = SelectorConfig::default();
        let hours = vec![make_hour(day(), 9, 0, "cloudy")];
        assert!(select_optimal_block(&hours, 1, &cfg).is_none());

        let hours = vec![make_hour(day(), 9, 3, "cloudy")];
        assert_eq!(select_optimal_block(&hours, 1, &cfg).map(|b| b.duration), Some(1));
    }

    #[test]
    fn test_min_duration_filters_short_windows() {
        let cfg = SelectorConfig::default();
        let hours = vec![
            make_hour(day(), 9, 15, "clearsky"),
            make_hour(day(), 10, -5, "rain"),
            make_hour(day(), 11, 3, "cloudy"),
            make_hour(day(), 12, 3, "cloudy"),
        ];
        let best = select_optimal_block(&hours, 2, &cfg).unwrap();
        assert_eq!(best.start, at(day(), 11));
        assert_eq!(best.duration, 2);
    }

    #[test]
    fn test_combined_score_formula() {
        let cfg = SelectorConfig::default();
        let hours = vec![make_hour(day(), 9, 10, "clearsky"), make_hour(day(), 10, 10, "clearsky")];
        let best = select_optimal_block(&hours, 1, &cfg).unwrap();
        // 10 * 1.4 * 1.0 + 0.8
        assert!((best.combined_score - 14.8).abs() < 1e-9);
        assert!((best.consistency_factor - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_avoid_ranges() {
        let cfg = SelectorConfig::default();
        let hours = vec![
            make_hour(day(), 9, 5, "fair"),
            make_hour(day(), 10, -4, "lightrain"),
            make_hour(day(), 11, -9, "heavyrain"),
            make_hour(day(), 12, -3, "cloudy"),
            make_hour(day(), 13, -6, "thunderstorm"),
            // gap at 14:00
            make_hour(day(), 15, -7, "thunderstorm"),
        ];

        let ranges = find_avoid_ranges(&hours, &cfg);
        assert_eq!(ranges.len(), 3);

        assert_eq!(ranges[0].start, at(day(), 10));
        assert_eq!(ranges[0].end, at(day(), 11));
        assert_eq!(ranges[0].duration, 2);
        assert_eq!(ranges[0].worst_score, -9);
        assert_eq!(ranges[0].reason, "lightrain");
        assert_eq!(ranges[0].reason_label, "Light Rain");

        assert_eq!(ranges[1].duration, 1);
        assert_eq!(ranges[2].start, at(day(), 15));
    }
}
