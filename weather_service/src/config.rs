//! Service configuration loaded from a TOML file.
//!
//! Every field has a default, so a missing file, an empty file, or a file
//! that sets only a few keys are all valid. The OpenWeatherMap API key is a
//! secret and never lives here: it comes from `--api-key` or the
//! `OPENWEATHER_API_KEY` environment variable (optionally via `.env`).
//!
//! ```toml
//! [analysis]
//! rolling_window = 30
//! anomaly_sigma = 2.0
//! edge_policy = "shrink"   # or "strict"
//! seasonal_sigma = 2.0
//!
//! [openweather]
//! timeout_secs = 10
//!
//! [logging]
//! level = "info"
//! file = "weather_service.log"
//! timestamps = true
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::analysis::rolling::{DEFAULT_SIGMA, DEFAULT_WINDOW, EdgePolicy};
use crate::logging::LogLevel;

/// Environment variable consulted for the OpenWeatherMap API key.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ---------------------------------------------------------------------------
// Configuration sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub analysis: AnalysisConfig,
    pub openweather: OpenWeatherConfig,
    pub logging: LoggingConfig,
}

/// Parameters of the rolling band and the seasonal check.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Samples in the centered rolling window. Must be at least 2.
    pub rolling_window: usize,
    /// Band half-width for anomaly detection, in standard deviations.
    pub anomaly_sigma: f64,
    pub edge_policy: EdgePolicy,
    /// Band half-width for the live seasonal check, in standard deviations.
    pub seasonal_sigma: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            rolling_window: DEFAULT_WINDOW,
            anomaly_sigma: DEFAULT_SIGMA,
            edge_policy: EdgePolicy::Shrink,
            seasonal_sigma: DEFAULT_SIGMA,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OpenWeatherConfig {
    pub geocoding_url: String,
    pub weather_url: String,
    /// Per-request timeout, in seconds.
    pub timeout_secs: u64,
}

impl Default for OpenWeatherConfig {
    fn default() -> Self {
        Self {
            geocoding_url: "https://api.openweathermap.org/geo/1.0/direct".to_string(),
            weather_url: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: None,
            timestamps: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl ServiceConfig {
    /// Load configuration from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// Resolve the API key: an explicit value wins over the environment.
///
/// Loads `.env` first so a key kept there is picked up. Blank values count
/// as absent, which skips the live check entirely.
pub fn resolve_api_key(explicit: Option<&str>) -> Option<String> {
    dotenv::dotenv().ok();
    let env_value = std::env::var(API_KEY_ENV).ok();
    pick_api_key(explicit, env_value.as_deref())
}

fn pick_api_key(explicit: Option<&str>, env_value: Option<&str>) -> Option<String> {
    explicit
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .or_else(|| env_value.map(str::trim).filter(|k| !k.is_empty()))
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ServiceConfig::from_toml("").unwrap();
        assert_eq!(config.analysis, AnalysisConfig::default());
        assert_eq!(config.analysis.rolling_window, 30);
        assert_eq!(config.analysis.edge_policy, EdgePolicy::Shrink);
        assert_eq!(config.openweather.timeout_secs, 10);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let config = ServiceConfig::from_toml(
            r#"
            [analysis]
            rolling_window = 14
            edge_policy = "strict"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.analysis.rolling_window, 14);
        assert_eq!(config.analysis.edge_policy, EdgePolicy::Strict);
        assert_eq!(config.analysis.anomaly_sigma, 2.0);
        assert_eq!(config.openweather.timeout_secs, 10);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_unknown_edge_policy_is_rejected() {
        let result = ServiceConfig::from_toml("[analysis]\nedge_policy = \"wrap\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = ServiceConfig::load(Path::new("/no/such/weather_service.toml")).unwrap();
        assert_eq!(config.analysis, AnalysisConfig::default());
    }

    #[test]
    fn test_api_key_precedence() {
        assert_eq!(pick_api_key(Some("cli"), Some("env")), Some("cli".to_string()));
        assert_eq!(pick_api_key(None, Some(" env ")), Some("env".to_string()));
        assert_eq!(pick_api_key(Some("  "), Some("env")), Some("env".to_string()));
        assert_eq!(pick_api_key(Some(""), None), None);
        assert_eq!(pick_api_key(None, Some("")), None);
    }
}
