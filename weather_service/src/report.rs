//! Text and JSON rendering of an analysis pass.

use std::fmt::Write;

use serde::Serialize;

use crate::analysis::seasonal::month_name;
use crate::model::LookupError;
use crate::session::{CityAnalysis, LiveCheck};

/// What happened to the optional live check.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LiveSection {
    /// No API key was supplied.
    Skipped,
    Failed { error: String },
    Checked(LiveCheck),
}

impl LiveSection {
    pub fn from_result(result: Result<LiveCheck, LookupError>) -> Self {
        match result {
            Ok(check) => LiveSection::Checked(check),
            Err(e) => LiveSection::Failed { error: e.to_string() },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Report<'a> {
    #[serde(flatten)]
    pub analysis: &'a CityAnalysis,
    pub live: LiveSection,
}

impl Report<'_> {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out).ok();
        out
    }

    fn write_text(&self, out: &mut String) -> std::fmt::Result {
        let a = self.analysis;
        let s = &a.summary;

        writeln!(out, "Weather analysis: {}", a.city)?;
        writeln!(out, "{}", "=".repeat(60))?;

        writeln!(out)?;
        writeln!(out, "Descriptive statistics (°C)")?;
        writeln!(out, "  count  {:>10}", s.count)?;
        writeln!(out, "  mean   {:>10.2}", s.mean)?;
        writeln!(out, "  std    {:>10}", fmt_opt(s.std))?;
        writeln!(out, "  min    {:>10.2}", s.min)?;
        writeln!(out, "  25%    {:>10.2}", s.q25)?;
        writeln!(out, "  50%    {:>10.2}", s.median)?;
        writeln!(out, "  75%    {:>10.2}", s.q75)?;
        writeln!(out, "  max    {:>10.2}", s.max)?;

        writeln!(out)?;
        writeln!(out, "Anomalies ({} of {} readings)", a.anomalies.len(), s.count)?;
        if a.anomalies.is_empty() {
            writeln!(out, "  none")?;
        }
        for anomaly in &a.anomalies {
            writeln!(
                out,
                "  {}  {:>7.2}  (band {:.2} ± {:.2})",
                anomaly.timestamp.format("%Y-%m-%d %H:%M"),
                anomaly.temperature,
                anomaly.band_mean,
                anomaly.band_stddev
            )?;
        }

        writeln!(out)?;
        writeln!(out, "Seasonal profile")?;
        writeln!(out, "  {:<10} {:>6} {:>8} {:>8}", "month", "count", "mean", "std")?;
        for (month, stats) in &a.seasonal_profile {
            writeln!(
                out,
                "  {:<10} {:>6} {:>8.2} {:>8}",
                month_name(*month),
                stats.count,
                stats.mean,
                fmt_opt(stats.stddev)
            )?;
        }

        writeln!(out)?;
        writeln!(out, "Live weather")?;
        match &self.live {
            LiveSection::Skipped => writeln!(out, "  skipped (no API key)")?,
            LiveSection::Failed { error } => writeln!(out, "  error: {}", error)?,
            LiveSection::Checked(check) => {
                writeln!(
                    out,
                    "  Current temperature in {}: {:.1}°C",
                    a.city, check.reading.temperature
                )?;
                writeln!(out, "  {}", check.judgment.message())?;
            }
        }

        Ok(())
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "n/a".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::seasonal_norm::SeasonalJudgment;
    use crate::config::AnalysisConfig;
    use crate::model::{Coordinates, LiveReading};
    use crate::session::analyze_city;
    use crate::ingest::csv_file::load_readings;
    use chrono::Utc;

    fn analysis() -> CityAnalysis {
        let csv = "timestamp,city,temperature\n\
                   2023-01-01,Oslo,-4.0\n\
                   2023-01-02,Oslo,-6.0\n\
                   2023-07-01,Oslo,18.0\n";
        let readings = load_readings(csv.as_bytes()).unwrap();
        analyze_city(&readings, "Oslo", &AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn test_text_report_sections() {
        let a = analysis();
        let text = Report {
            analysis: &a,
            live: LiveSection::Skipped,
        }
        .to_text();

        assert!(text.starts_with("Weather analysis: Oslo"));
        assert!(text.contains("count           3"));
        assert!(text.contains("January"));
        assert!(text.contains("July"));
        assert!(!text.contains("March"));
        assert!(text.contains("skipped (no API key)"));
    }

    #[test]
    fn test_text_report_live_outcomes() {
        let a = analysis();
        let failed = Report {
            analysis: &a,
            live: LiveSection::from_result(Err(LookupError::CityNotFound("Oslo".to_string()))),
        }
        .to_text();
        assert!(failed.contains("error: city not found by geocoding service: Oslo"));

        let checked = Report {
            analysis: &a,
            live: LiveSection::Checked(LiveCheck {
                location: Coordinates {
                    name: "Oslo".to_string(),
                    country: Some("NO".to_string()),
                    latitude: 59.91,
                    longitude: 10.75,
                },
                reading: LiveReading {
                    temperature: 12.0,
                    fetched_at: Utc::now(),
                },
                judgment: SeasonalJudgment::NoSeasonalData { month: 3 },
            }),
        }
        .to_text();
        assert!(checked.contains("Current temperature in Oslo: 12.0°C"));
        assert!(checked.contains("No seasonal data for March."));
    }

    #[test]
    fn test_json_report_shape() {
        let a = analysis();
        let json = Report {
            analysis: &a,
            live: LiveSection::Skipped,
        }
        .to_json()
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["city"], "Oslo");
        assert_eq!(value["summary"]["count"], 3);
        assert_eq!(value["seasonal_profile"]["1"]["count"], 2);
        assert_eq!(value["live"]["outcome"], "skipped");
    }

    #[test]
    fn test_json_report_carries_the_plotted_series() {
        let a = analysis();
        let json = Report {
            analysis: &a,
            live: LiveSection::Skipped,
        }
        .to_json()
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let series = value["series"].as_array().expect("series is an array");
        assert_eq!(series.len(), 3);
        assert_eq!(series[0]["timestamp"], "2023-01-01T00:00:00");
        assert_eq!(series[0]["temperature"], -4.0);
        assert_eq!(series[2]["temperature"], 18.0);
        assert!(series[0]["band"]["mean"].is_number());
        assert!(series[0]["band"]["stddev"].is_number());
        assert_eq!(series[0]["anomaly"], false);
    }
}
