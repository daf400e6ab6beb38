use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::SelectorConfig;
use crate::forecast::HourlyRecord;
use crate::scoring::WeatherClass;

/// Consecutive records exactly one hour apart
pub(crate) fn is_next_hour(prev: &HourlyRecord, next: &HourlyRecord) -> bool {
    next.time - prev.time == Duration::hours(1)
}

pub(crate) fn average_score(hours: &[HourlyRecord]) -> f64 {
    if hours.is_empty() {
        return 0.0;
    }
    let sum: i64 = hours.iter().map(|h| i64::from(h.total_score())).sum();
    sum as f64 / hours.len() as f64
}

/// Population standard deviation of the total scores
pub(crate) fn score_std_dev(hours: &[HourlyRecord], mean: f64) -> f64 {
    if hours.len() < 2 {
        return 0.0;
    }
    let variance = hours
        .iter()
        .map(|h| {
            let d = f64::from(h.total_score()) - mean;
            d * d
        })
        .sum::<f64>()
        / hours.len() as f64;
    variance.sqrt()
}

fn mean_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Mean temperature and wind speed over the hours that report them
pub(crate) fn weather_averages(hours: &[HourlyRecord]) -> (Option<f64>, Option<f64>) {
    (
        mean_of(hours.iter().filter_map(|h| h.conditions.temperature)),
        mean_of(hours.iter().filter_map(|h| h.conditions.wind_speed)),
    )
}

/// A maximal run of same-class, consecutive hours
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct WeatherBlock {
    pub class: WeatherClass,
    #[schema(value_type = String)]
    pub start: DateTime<Tz>,
    #[schema(value_type = String)]
    pub end: DateTime<Tz>,
    pub duration: usize,
    pub avg_score: f64,
    pub avg_temp: Option<f64>,
    pub avg_wind: Option<f64>,
    pub hours: Vec<HourlyRecord>,
}

impl WeatherBlock {
    fn from_run(class: WeatherClass, hours: Vec<HourlyRecord>) -> Option<Self> {
        let first = hours.first()?;
        let last = hours.last()?;
        let (avg_temp, avg_wind) = weather_averages(&hours);
        Some(Self {
            class,
            start: first.time,
            end: last.time,
            duration: hours.len(),
            avg_score: average_score(&hours),
            avg_temp,
            avg_wind,
            hours,
        })
    }
}

/// Split `hours` into runs of one weather class.
///
/// Input need not be sorted. A missing hour closes the current run even when
/// the class continues. Runs shorter than `min_len` are dropped.
pub fn extract_blocks(hours: &[HourlyRecord], min_len: usize) -> Vec<WeatherBlock> {
    let mut sorted = hours.to_vec();
    sorted.sort_by_key(|h| h.time);

    let mut blocks = Vec::new();
    let mut iter = sorted.into_iter();
    let Some(first) = iter.next() else {
        return blocks;
    };

    let mut current_class = first.class();
    let mut current = vec![first];

    for hour in iter {
        let class = hour.class();
        let contiguous = current.last().is_some_and(|prev| is_next_hour(prev, &hour));
        if class == current_class && contiguous {
            current.push(hour);
            continue;
        }

        let finished = std::mem::replace(&mut current, vec![hour]);
        if finished.len() >= min_len {
            blocks.extend(WeatherBlock::from_run(current_class, finished));
        }
        current_class = class;
    }

    if current.len() >= min_len {
        blocks.extend(WeatherBlock::from_run(current_class, current));
    }

    blocks
}

/// Best (highest average) and worst (lowest average) classified blocks of a day.
///
/// The best must be sunny or cloudy, or rainy with a non-negative average.
/// The worst must be rainy, or any class with a negative average.
pub fn best_and_worst_blocks(blocks: &[WeatherBlock]) -> (Option<&WeatherBlock>, Option<&WeatherBlock>) {
    let mut best: Option<&WeatherBlock> = None;
    let mut worst: Option<&WeatherBlock> = None;

    for block in blocks.iter().filter(|b| b.duration >= 2) {
        let good_enough = block.class != WeatherClass::Rainy || block.avg_score >= 0.0;
        if good_enough && best.map_or(true, |b| block.avg_score > b.avg_score) {
            best = Some(block);
        }

        let bad_enough = block.class == WeatherClass::Rainy || block.avg_score < 0.0;
        if bad_enough && worst.map_or(true, |w| block.avg_score < w.avg_score) {
            worst = Some(block);
        }
    }

    (best, worst)
}

/// A contiguous window whose scores are steady enough to be a best-block candidate
#[derive(Debug, Clone, Copy)]
pub struct CandidateWindow<'a> {
    pub hours: &'a [HourlyRecord],
    pub avg_score: f64,
    pub std_dev: f64,
}

impl CandidateWindow<'_> {
    pub fn duration(&self) -> usize {
        self.hours.len()
    }
}

/// Every start/end pair over `sorted` (ascending by time) that passes the
/// consistency test.
///
/// Windows never span a missing hour. Multi-hour windows need every member
/// non-negative; a single hour only needs `single_hour_candidate_min`. The
/// score standard deviation must stay within the duration-scaled threshold.
///
/// O(n²) windows, each scored in O(n): fine for one day of daylight hours,
/// not for multi-week hourly series.
pub fn find_consistent_blocks<'a>(
    sorted: &'a [HourlyRecord],
    cfg: &SelectorConfig,
) -> Vec<CandidateWindow<'a>> {
    let mut candidates = Vec::new();

    for start in 0..sorted.len() {
        for end in start..sorted.len() {
            if end > start && !is_next_hour(&sorted[end - 1], &sorted[end]) {
                break;
            }

            let window = &sorted[start..=end];
            let avg_score = average_score(window);

            let acceptable = if window.len() == 1 {
                avg_score >= cfg.single_hour_candidate_min
            } else {
                window.iter().all(|h| h.total_score() >= 0)
            };
            if !acceptable {
                continue;
            }

            let std_dev = score_std_dev(window, avg_score);
            if std_dev <= cfg.std_dev_threshold(window.len()) {
                candidates.push(CandidateWindow {
                    hours: window,
                    avg_score,
                    std_dev,
                });
            }
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::hourly::test_support::*;

    fn scenario() -> Vec<HourlyRecord> {
        vec![
            make_hour(day(), 10, 8, "clearsky"),
            make_hour(day(), 11, 9, "clearsky"),
            make_hour(day(), 12, 10, "clearsky"),
            make_hour(day(), 13, -4, "rain"),
            make_hour(day(), 14, -6, "rain"),
        ]
    }

    #[test]
    fn test_sunny_then_rainy_scenario() {
        let blocks = extract_blocks(&scenario(), 2);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].class, WeatherClass::Sunny);
        assert_eq!(blocks[0].duration, 3);
        assert_eq!(blocks[0].avg_score, 9.0);
        assert_eq!(blocks[1].class, WeatherClass::Rainy);
        assert_eq!(blocks[1].duration, 2);
        assert_eq!(blocks[1].avg_score, -5.0);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let mut hours = scenario();
        hours.reverse();
        let blocks = extract_blocks(&hours, 2);
        assert_eq!(blocks[0].start.format("%H").to_string(), "10");
        assert_eq!(blocks[0].end.format("%H").to_string(), "12");
    }

    #[test]
    fn test_gap_closes_block() {
        let hours = vec![
            make_hour(day(), 9, 5, "fair"),
            make_hour(day(), 10, 5, "fair"),
            // 11:00 missing from the feed
            make_hour(day(), 12, 5, "fair"),
            make_hour(day(), 13, 5, "fair"),
            make_hour(day(), 15, 5, "fair"),
        ];
        let blocks = extract_blocks(&hours, 2);

        assert_eq!(blocks.len(), 2);
        for block in &blocks {
            assert_eq!(block.duration, 2);
            for pair in block.hours.windows(2) {
                assert!(is_next_hour(&pair[0], &pair[1]));
            }
        }
    }

    #[test]
    fn test_short_runs_are_omitted() {
        let hours = vec![
            make_hour(day(), 9, 5, "clearsky"),
            make_hour(day(), 10, 1, "cloudy"),
            make_hour(day(), 11, 5, "clearsky"),
            make_hour(day(), 12, 5, "clearsky"),
        ];
        let blocks = extract_blocks(&hours, 2);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].duration, 2);
        assert!(extract_blocks(&[], 2).is_empty());
    }

    #[test]
    fn test_best_and_worst() {
        let blocks = extract_blocks(&scenario(), 2);
        let (best, worst) = best_and_worst_blocks(&blocks);
        assert_eq!(best.map(|b| b.class), Some(WeatherClass::Sunny));
        assert_eq!(worst.map(|b| b.class), Some(WeatherClass::Rainy));
    }

    #[test]
    fn test_consistent_windows_exclude_negative_members() {
        let cfg = SelectorConfig::default();
        let hours = scenario();
        let candidates = find_consistent_blocks(&hours, &cfg);

        assert!(candidates
            .iter()
            .filter(|c| c.duration() > 1)
            .all(|c| c.hours.iter().all(|h| h.total_score() >= 0)));
        // only windows inside the three sunny hours qualify
        assert_eq!(candidates.len(), 6);
    }

    #[test]
    fn test_consistent_windows_respect_gaps() {
        let cfg = SelectorConfig::default();
        let hours = vec![
            make_hour(day(), 9, 5, "fair"),
            make_hour(day(), 11, 5, "fair"),
        ];
        let candidates = find_consistent_blocks(&hours, &cfg);
        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(|c| c.duration() == 1));
    }

    #[test]
    fn test_erratic_window_rejected() {
        let cfg = SelectorConfig::default();
        let hours = vec![make_hour(day(), 9, 0, "fair"), make_hour(day(), 10, 20, "fair")];
        let candidates = find_consistent_blocks(&hours, &cfg);
        // std dev 10 exceeds 7.8 for two hours
        assert!(candidates.iter().all(|c| c.duration() == 1));
    }
}
