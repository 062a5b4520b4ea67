/// Structured logging for the weather analysis service
///
/// Provides context-rich logging tagged with the data source and the city
/// under analysis. Supports console output and an optional append-only log
/// file. Logging before `init_logger` is a no-op.

use chrono::Utc;
use serde::Deserialize;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::model::LookupError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Data Source Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// Historical readings upload
    Csv,
    /// OpenWeatherMap geocoding
    Geocoding,
    /// OpenWeatherMap current weather
    Weather,
    Analysis,
    System,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Csv => write!(f, "CSV"),
            DataSource::Geocoding => write!(f, "GEO"),
            DataSource::Weather => write!(f, "WX"),
            DataSource::Analysis => write!(f, "ANALYSIS"),
            DataSource::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - e.g. a city name the geocoder does not know
    Expected,
    /// Unexpected failure - bad credentials, service outage, changed payload
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn format_entry(level: LogLevel, source: &DataSource, city: Option<&str>, message: &str) -> String {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let city_part = city.map(|c| format!(" [{}]", c)).unwrap_or_default();
        format!("{} {} {}{}: {}", timestamp, level, source, city_part, message)
    }

    fn log(&self, level: LogLevel, source: &DataSource, city: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = Self::format_entry(level, source, city, message);
        let city_part = city.map(|c| format!(" [{}]", c)).unwrap_or_default();

        // Diagnostics go to stderr so stdout carries only the report.
        if self.console_timestamps {
            eprintln!("{}", log_entry);
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", source, city_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", source, city_part, message),
                LogLevel::Info => eprintln!("   {}", message),
                LogLevel::Debug => eprintln!("   [DEBUG] {}", message),
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn dispatch(level: LogLevel, source: DataSource, city: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, &source, city, message);
        }
    }
}

/// Log a general informational message
pub fn info(source: DataSource, city: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, source, city, message);
}

/// Log a warning message
pub fn warn(source: DataSource, city: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, source, city, message);
}

/// Log an error message
pub fn error(source: DataSource, city: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, source, city, message);
}

/// Log a debug message
pub fn debug(source: DataSource, city: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, source, city, message);
}

// ---------------------------------------------------------------------------
// Lookup Failure Classification
// ---------------------------------------------------------------------------

/// Classify a live-lookup failure.
///
/// An unknown city is a data problem, not a service problem. 401/403 mean
/// the key is wrong; 5xx and transport errors mean the service is degraded.
/// Anything else (404 on a coordinate, 429 rate limits) is left unknown.
pub fn classify_lookup_failure(err: &LookupError) -> FailureType {
    match err {
        LookupError::CityNotFound(_) => FailureType::Expected,
        LookupError::ApiRequest { status: None, .. } => FailureType::Unexpected,
        LookupError::ApiRequest { status: Some(code), .. } => match code {
            401 | 403 => FailureType::Unexpected,
            500..=599 => FailureType::Unexpected,
            _ => FailureType::Unknown,
        },
    }
}

fn lookup_source(err: &LookupError) -> DataSource {
    match err {
        LookupError::CityNotFound(_) => DataSource::Geocoding,
        LookupError::ApiRequest { stage, .. } => match stage {
            crate::model::LookupStage::Geocoding => DataSource::Geocoding,
            crate::model::LookupStage::Weather => DataSource::Weather,
        },
    }
}

/// Log a live-lookup failure with automatic classification
pub fn log_lookup_failure(city: &str, err: &LookupError) {
    let failure_type = classify_lookup_failure(err);
    let message = format!("live lookup failed [{}]: {}", failure_type, err);
    let source = lookup_source(err);

    match failure_type {
        FailureType::Expected => warn(source, Some(city), &message),
        FailureType::Unexpected => error(source, Some(city), &message),
        FailureType::Unknown => warn(source, Some(city), &message),
    }
}

// ---------------------------------------------------------------------------
// Analysis Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of one analysis pass
pub fn log_analysis_summary(city: &str, readings: usize, anomalies: usize, months: usize) {
    let message = format!(
        "Analysis complete: {} readings, {} anomalies, {} months profiled",
        readings, anomalies, months
    );

    if months < 12 {
        debug(DataSource::Analysis, Some(city), "seasonal profile does not cover every month");
    }
    info(DataSource::Analysis, Some(city), &message);
}
