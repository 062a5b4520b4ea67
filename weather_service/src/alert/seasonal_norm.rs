//! Seasonal norm check for a live temperature.
//!
//! # Clock injection
//! `judge_at` takes the month explicitly rather than reading the clock, so
//! the classification is deterministic in tests. `judge` is the convenience
//! wrapper that uses the local current month.

use chrono::{Datelike, Local};
use serde::Serialize;

use crate::analysis::seasonal::{SeasonalProfile, month_name};

/// Outcome of comparing a live temperature with the seasonal profile.
///
/// A missing month is an expected outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SeasonalJudgment {
    NoSeasonalData {
        month: u32,
    },
    WithinNorm {
        month: u32,
        temperature: f64,
        seasonal_mean: f64,
        seasonal_stddev: Option<f64>,
        deviation: f64,
    },
    Anomalous {
        month: u32,
        temperature: f64,
        seasonal_mean: f64,
        seasonal_stddev: Option<f64>,
        deviation: f64,
    },
}

impl SeasonalJudgment {
    pub fn is_anomalous(&self) -> bool {
        matches!(self, SeasonalJudgment::Anomalous { .. })
    }

    /// One-line message for the report.
    pub fn message(&self) -> String {
        match self {
            SeasonalJudgment::NoSeasonalData { month } => {
                format!("No seasonal data for {}.", month_name(*month))
            }
            SeasonalJudgment::WithinNorm { temperature, .. } => {
                format!("Temperature {:.1}°C is within the seasonal norm.", temperature)
            }
            SeasonalJudgment::Anomalous { temperature, .. } => {
                format!("Temperature {:.1}°C deviates from the seasonal norm.", temperature)
            }
        }
    }
}

/// Classify `temperature` against the profile entry for `month`.
///
/// Anomalous when |temperature − mean| is strictly greater than
/// `sigma · stddev`. A month with a single historical reading has no
/// stddev; the comparison cannot hold and the reading counts as within
/// the norm.
pub fn judge_at(
    profile: &SeasonalProfile,
    month: u32,
    temperature: f64,
    sigma: f64,
) -> SeasonalJudgment {
    let Some(stats) = profile.get(&month) else {
        return SeasonalJudgment::NoSeasonalData { month };
    };

    let deviation = (temperature - stats.mean).abs();
    let anomalous = stats
        .stddev
        .map(|sd| deviation > sigma * sd)
        .unwrap_or(false);

    if anomalous {
        SeasonalJudgment::Anomalous {
            month,
            temperature,
            seasonal_mean: stats.mean,
            seasonal_stddev: stats.stddev,
            deviation,
        }
    } else {
        SeasonalJudgment::WithinNorm {
            month,
            temperature,
            seasonal_mean: stats.mean,
            seasonal_stddev: stats.stddev,
            deviation,
        }
    }
}

/// Same as `judge_at`, for the current local month. Used by the live check
/// when no month is given.
pub fn judge(profile: &SeasonalProfile, temperature: f64, sigma: f64) -> SeasonalJudgment {
    judge_at(profile, Local::now().month(), temperature, sigma)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
