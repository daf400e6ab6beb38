use serde::Serialize;
use utoipa::ToSchema;

/// Human rating of a per-hour comfort score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum Rating {
    Excellent,
    #[serde(rename = "Very Good")]
    VeryGood,
    Good,
    Fair,
    Poor,
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl Rating {
    pub fn from_score(score: f64) -> Self {
        if !score.is_finite() {
            Self::NotAvailable
        } else if score >= 18.0 {
            Self::Excellent
        } else if score >= 13.0 {
            Self::VeryGood
        } else if score >= 7.0 {
            Self::Good
        } else if score >= 2.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

/// Map a per-hour score onto 0-100, piecewise linear along the rating bands
pub fn normalize_score(score: f64) -> u8 {
    if !score.is_finite() {
        return 0;
    }

    let normalized = if score >= 18.0 {
        90.0 + (score - 18.0) * 2.0
    } else if score >= 13.0 {
        80.0 + (score - 13.0) * 2.0
    } else if score >= 7.0 {
        65.0 + (score - 7.0) * 2.5
    } else if score >= 2.0 {
        50.0 + (score - 2.0) * 3.0
    } else {
        50.0 + (score - 2.0) * 6.0
    };

    normalized.round().clamp(0.0, 100.0) as u8
}
