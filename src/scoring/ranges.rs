use serde::{Deserialize, Serialize};

/// How a band's upper edge is matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bounds {
    /// `min <= value <= max`
    Inclusive,
    /// `min <= value < max`
    HalfOpen,
}

/// One `(range, score)` entry. A missing edge is open-ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBand {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    pub score: i32,
}

impl ScoreBand {
    pub const fn new(min: f64, max: f64, score: i32) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            score,
        }
    }

    fn contains(&self, value: f64, bounds: Bounds) -> bool {
        let low = self.min.unwrap_or(f64::NEG_INFINITY);
        let high = self.max.unwrap_or(f64::INFINITY);
        match bounds {
            Bounds::Inclusive => low <= value && value <= high,
            Bounds::HalfOpen => low <= value && value < high,
        }
    }
}

/// Ordered range table: the first matching band wins, `fallback` covers the rest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeTable {
    pub bounds: Bounds,
    pub bands: Vec<ScoreBand>,
    pub fallback: i32,
}

impl RangeTable {
    pub fn new(bounds: Bounds, bands: Vec<ScoreBand>, fallback: i32) -> Self {
        Self {
            bounds,
            bands,
            fallback,
        }
    }

    /// Score a measurement. Missing or non-finite input is neutral.
    pub fn score(&self, value: Option<f64>) -> i32 {
        let Some(value) = value.filter(|v| v.is_finite()) else {
            return 0;
        };

        self.bands
            .iter()
            .find(|band| band.contains(value, self.bounds))
            .map(|band| band.score)
            .unwrap_or(self.fallback)
    }

    /// Lowest and highest score this table can produce
    pub fn span(&self) -> (i32, i32) {
        self.bands
            .iter()
            .map(|b| b.score)
            .chain(std::iter::once(self.fallback))
            .fold((i32::MAX, i32::MIN), |(lo, hi), s| (lo.min(s), hi.max(s)))
    }
}
