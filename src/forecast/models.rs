use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

// ============================================================================
// met.no Locationforecast 2.0 Response (Internal)
// Only the fields used for scoring are modelled
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct MetNoResponse {
    #[serde(default)]
    pub properties: Option<MetNoProperties>,
}

impl MetNoResponse {
    /// Number of raw timeseries entries, 0 when absent
    pub fn timeseries_len(&self) -> usize {
        self.properties
            .as_ref()
            .and_then(|p| p.timeseries.as_ref())
            .map_or(0, Vec::len)
    }
}

/// Entries are kept raw so that one malformed hour can be skipped on its own
#[derive(Debug, Deserialize)]
pub struct MetNoProperties {
    #[serde(default)]
    pub timeseries: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub struct TimeseriesEntry {
    pub time: DateTime<Utc>,
    pub data: EntryData,
}

#[derive(Debug, Deserialize)]
pub struct EntryData {
    pub instant: Instant,
    #[serde(default)]
    pub next_1_hours: Option<NextHours>,
    #[serde(default)]
    pub next_6_hours: Option<NextHours>,
}

#[derive(Debug, Deserialize)]
pub struct Instant {
    pub details: InstantDetails,
}

#[derive(Debug, Default, Deserialize)]
pub struct InstantDetails {
    #[serde(default, deserialize_with = "lenient_number")]
    pub air_temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub wind_speed: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub cloud_area_fraction: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub relative_humidity: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextHours {
    #[serde(default)]
    pub summary: Option<Summary>,
    #[serde(default)]
    pub details: Option<NextDetails>,
}

impl NextHours {
    pub fn symbol_code(&self) -> Option<&str> {
        self.summary.as_ref()?.symbol_code.as_deref()
    }

    pub fn precipitation_amount(&self) -> Option<f64> {
        self.details.as_ref()?.precipitation_amount
    }

    pub fn precipitation_probability(&self) -> Option<f64> {
        self.details.as_ref()?.probability_of_precipitation
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub symbol_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextDetails {
    #[serde(default, deserialize_with = "lenient_number")]
    pub precipitation_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub probability_of_precipitation: Option<f64>,
}

/// Accept any JSON value; anything that is not a finite number becomes `None`
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(serde_json::Value::as_f64)
        .filter(|v| v.is_finite()))
}
