/// Core data types for the seasonal weather analysis service.
///
/// This module defines the shared domain model imported by all other modules:
/// readings loaded from the historical CSV, the per-city series derived from
/// them, and the error kinds each stage can raise. It contains no I/O.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

/// CSV column holding the reading instant.
pub const COL_TIMESTAMP: &str = "timestamp";

/// CSV column holding the city name.
pub const COL_CITY: &str = "city";

/// CSV column holding the temperature, in degrees Celsius.
pub const COL_TEMPERATURE: &str = "temperature";

/// Every column a historical upload must carry, in canonical order.
pub const REQUIRED_COLUMNS: [&str; 3] = [COL_TIMESTAMP, COL_CITY, COL_TEMPERATURE];

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// A single historical temperature observation.
///
/// Timestamps are kept as wall-clock time: an offset present in the source
/// file is dropped so that month extraction follows the local calendar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub timestamp: NaiveDateTime,
    pub city: String,
    pub temperature: f64,
}

/// The readings for one city, ascending by timestamp.
///
/// Built by `analysis::series::extract_series`; never empty, and every
/// reading shares `city`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesForCity {
    pub city: String,
    pub readings: Vec<Reading>,
}

impl SeriesForCity {
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn temperatures(&self) -> Vec<f64> {
        self.readings.iter().map(|r| r.temperature).collect()
    }
}

// ---------------------------------------------------------------------------
// Derived statistics
// ---------------------------------------------------------------------------

/// Local mean and sample standard deviation around one point of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandPoint {
    pub mean: f64,
    pub stddev: f64,
}

/// A reading that falls outside its rolling band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub band_mean: f64,
    pub band_stddev: f64,
}

/// One reading of the plotted series with its rolling band.
///
/// `band` is `None` where the window leaves it undefined; such a point is
/// never an anomaly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub band: Option<BandPoint>,
    pub anomaly: bool,
}

/// Aggregate temperature statistics for one calendar month.
///
/// `stddev` is `None` when only one reading fell in the month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthStats {
    pub count: usize,
    pub mean: f64,
    pub stddev: Option<f64>,
}

/// Descriptive statistics of the temperature column for one city.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

// ---------------------------------------------------------------------------
// Live weather types
// ---------------------------------------------------------------------------

/// Best geocoding match for a city name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coordinates {
    pub name: String,
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

/// Current temperature fetched from the weather API, in degrees Celsius.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveReading {
    pub temperature: f64,
    pub fetched_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while loading and validating a historical upload.
/// Any of these blocks further analysis.
#[derive(Debug, Error)]
pub enum LoadError {
    /// One or more required columns are absent from the header row.
    #[error("missing required columns: {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    /// The file is not well-formed CSV, or a row holds an unparseable value.
    /// `line` is the 1-based data row, when known.
    #[error("invalid {}: {message}", describe_line(.line))]
    FileFormat { line: Option<usize>, message: String },

    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn describe_line(line: &Option<usize>) -> String {
    match line {
        Some(line) => format!("data on row {}", line),
        None => "file".to_string(),
    }
}

/// Errors raised while deriving statistics for a selected city.
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("no readings for city: {0}")]
    EmptySeries(String),

    #[error("rolling window must hold at least 2 samples, got {0}")]
    InvalidWindow(usize),
}

/// Which of the two external calls failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LookupStage {
    Geocoding,
    Weather,
}

impl std::fmt::Display for LookupStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupStage::Geocoding => write!(f, "geocoding"),
            LookupStage::Weather => write!(f, "current weather"),
        }
    }
}

/// Errors from the live weather lookup. These skip the seasonal check only.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LookupError {
    /// The geocoding service returned no match for the city.
    #[error("city not found by geocoding service: {0}")]
    CityNotFound(String),

    /// Non-2xx status, network failure or undecodable body. `status` is
    /// absent when no response was received.
    #[error("{stage} request failed{}: {message}", describe_status(.status))]
    ApiRequest {
        stage: LookupStage,
        status: Option<u16>,
        message: String,
    },
}

fn describe_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_names_every_missing_column() {
        let err = LoadError::Schema {
            missing: vec!["city".to_string(), "temperature".to_string()],
        };
        assert_eq!(err.to_string(), "missing required columns: city, temperature");
    }

    #[test]
    fn test_file_format_error_mentions_row_when_known() {
        let with_line = LoadError::FileFormat {
            line: Some(4),
            message: "bad temperature".to_string(),
        };
        let without_line = LoadError::FileFormat {
            line: None,
            message: "no data rows".to_string(),
        };
        assert_eq!(with_line.to_string(), "invalid data on row 4: bad temperature");
        assert_eq!(without_line.to_string(), "invalid file: no data rows");
    }

    #[test]
    fn test_api_request_error_carries_upstream_message() {
        let err = LookupError::ApiRequest {
            stage: LookupStage::Weather,
            status: Some(401),
            message: "Invalid API key".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "current weather request failed (HTTP 401): Invalid API key"
        );

        let network = LookupError::ApiRequest {
            stage: LookupStage::Geocoding,
            status: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(network.to_string(), "geocoding request failed: connection refused");
    }
}
