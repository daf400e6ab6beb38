use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{debug, warn};

use super::daily::DailyReport;
use super::hourly::HourlyRecord;
use super::models::{MetNoResponse, TimeseriesEntry};
use crate::config::AppConfig;
use crate::locations::Location;

/// Scored forecast for one location, grouped by local calendar day
#[derive(Debug, Clone)]
pub struct ProcessedForecast {
    pub location: Location,
    /// Every kept hour, sorted by time
    pub days: BTreeMap<NaiveDate, Vec<HourlyRecord>>,
    /// Daylight summaries; days without daylight hours have none
    pub reports: BTreeMap<NaiveDate, DailyReport>,
}

impl ProcessedForecast {
    pub fn report(&self, date: NaiveDate) -> Option<&DailyReport> {
        self.reports.get(&date)
    }

    pub fn daylight_hours(&self, date: NaiveDate) -> &[HourlyRecord] {
        self.reports
            .get(&date)
            .map_or(&[], |r| r.daylight_hours.as_slice())
    }
}

/// Turn a raw met.no response into scored hours and daily reports.
///
/// Returns `None` when the response carries no timeseries. Entries that fail
/// to parse are skipped one by one.
pub fn process_forecast(
    response: &MetNoResponse,
    location: &Location,
    tz: Tz,
    today: NaiveDate,
    cfg: &AppConfig,
) -> Option<ProcessedForecast> {
    let timeseries = response.properties.as_ref()?.timeseries.as_ref()?;
    if timeseries.is_empty() {
        return None;
    }

    let end = today
        .checked_add_days(Days::new(u64::from(cfg.forecast.forecast_days)))
        .unwrap_or(NaiveDate::MAX);

    let mut days: BTreeMap<NaiveDate, Vec<HourlyRecord>> = BTreeMap::new();
    let mut skipped = 0usize;

    for raw in timeseries {
        let entry: TimeseriesEntry = match TimeseriesEntry::deserialize(raw) {
            Ok(entry) => entry,
            Err(e) => {
                skipped += 1;
                warn!(location = %location.key, error = %e, "Skipping malformed timeseries entry");
                continue;
            }
        };

        let record = HourlyRecord::from_entry(&entry, tz, &cfg.scoring);
        let date = record.time.date_naive();
        if date < today || date >= end {
            continue;
        }
        days.entry(date).or_default().push(record);
    }

    for hours in days.values_mut() {
        hours.sort_by_key(|h| h.time);
    }

    let reports: BTreeMap<NaiveDate, DailyReport> = days
        .iter()
        .map(|(date, hours)| {
            (
                *date,
                DailyReport::from_day(*date, &location.name, hours, &cfg.analysis),
            )
        })
        .filter(|(_, report)| report.has_data())
        .collect();

    debug!(
        location = %location.key,
        days = days.len(),
        reports = reports.len(),
        skipped,
        "Processed forecast"
    );

    Some(ProcessedForecast {
        location: location.clone(),
        days,
        reports,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn create_test_location(key: &str) -> Location {
        Location::new(key, &key.to_uppercase(), 43.5, -5.7)
    }

    /// Forecast whose only day is built from `hours`
    pub fn forecast_from_hours(key: &str, hours: Vec<HourlyRecord>) -> ProcessedForecast {
        let cfg = crate::config::AnalysisConfig::default();
        let location = create_test_location(key);
        let mut days: BTreeMap<NaiveDate, Vec<HourlyRecord>> = BTreeMap::new();
        for hour in hours {
            days.entry(hour.time.date_naive()).or_default().push(hour);
        }
        let reports = days
            .iter()
            .map(|(d, h)| (*d, DailyReport::from_day(*d, &location.name, h, &cfg)))
            .filter(|(_, r)| r.has_data())
            .collect();
        ProcessedForecast {
            location,
            days,
            reports,
        }
    }
}
