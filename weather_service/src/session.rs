//! Analysis session: the uploaded dataset and the selected city.
//!
//! Everything derived from a city is recomputed by `analyze` on every call;
//! nothing is cached between selections.

use std::io::Read;
use std::path::Path;

use serde::Serialize;

use crate::alert::seasonal_norm::{SeasonalJudgment, judge, judge_at};
use crate::analysis::describe::describe;
use crate::analysis::rolling::{banded_points, detect_anomalies, rolling_band};
use crate::analysis::seasonal::{SeasonalProfile, seasonal_profile};
use crate::analysis::series::{distinct_cities, extract_series};
use crate::config::AnalysisConfig;
use crate::ingest::csv_file::{load_readings, load_readings_file};
use crate::ingest::openweather::{WeatherProvider, lookup_live_reading};
use crate::logging::{self, DataSource};
use crate::model::{
    AnalysisError, Anomaly, BandPoint, Coordinates, LiveReading, LoadError, LookupError, Reading,
    SeriesForCity, SeriesPoint, Summary,
};

/// Everything shown for one city.
#[derive(Debug, Clone, Serialize)]
pub struct CityAnalysis {
    pub city: String,
    pub summary: Summary,
    #[serde(skip)]
    pub series: SeriesForCity,
    #[serde(skip)]
    pub band: Vec<Option<BandPoint>>,
    /// The series as plotted: each reading with its band and anomaly flag.
    #[serde(rename = "series")]
    pub points: Vec<SeriesPoint>,
    pub anomalies: Vec<Anomaly>,
    pub seasonal_profile: SeasonalProfile,
}

/// Result of a successful live lookup.
#[derive(Debug, Clone, Serialize)]
pub struct LiveCheck {
    pub location: Coordinates,
    pub reading: LiveReading,
    pub judgment: SeasonalJudgment,
}

pub struct AnalysisSession {
    readings: Vec<Reading>,
    cities: Vec<String>,
    selected_city: Option<String>,
}

impl AnalysisSession {
    pub fn from_readings(readings: Vec<Reading>) -> Self {
        let cities = distinct_cities(&readings);
        Self {
            readings,
            cities,
            selected_city: None,
        }
    }

    pub fn from_reader<R: Read>(source: R) -> Result<Self, LoadError> {
        Ok(Self::from_readings(load_readings(source)?))
    }

    pub fn from_csv_path(path: &Path) -> Result<Self, LoadError> {
        let readings = load_readings_file(path)?;
        logging::info(
            DataSource::Csv,
            None,
            &format!("Loaded {} readings from {}", readings.len(), path.display()),
        );
        Ok(Self::from_readings(readings))
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    /// Distinct cities in order of first appearance.
    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    /// Select the city to analyze. Fails if the dataset has no reading for it.
    pub fn select_city(&mut self, city: &str) -> Result<(), AnalysisError> {
        if !self.cities.iter().any(|c| c == city) {
            return Err(AnalysisError::EmptySeries(city.to_string()));
        }
        self.selected_city = Some(city.to_string());
        Ok(())
    }

    /// The selected city, defaulting to the first city in the file.
    pub fn selected_city(&self) -> Option<&str> {
        self.selected_city
            .as_deref()
            .or_else(|| self.cities.first().map(String::as_str))
    }

    /// Run the full historical analysis for the selected city.
    pub fn analyze(&self, config: &AnalysisConfig) -> Result<CityAnalysis, AnalysisError> {
        let city = self
            .selected_city()
            .ok_or_else(|| AnalysisError::EmptySeries(String::new()))?;
        analyze_city(&self.readings, city, config)
    }
}

/// Series, descriptive statistics, anomalies and seasonal profile for `city`.
pub fn analyze_city(
    readings: &[Reading],
    city: &str,
    config: &AnalysisConfig,
) -> Result<CityAnalysis, AnalysisError> {
    let series = extract_series(readings, city)?;
    let summary = describe(&series).ok_or_else(|| AnalysisError::EmptySeries(city.to_string()))?;
    let band = rolling_band(&series.temperatures(), config.rolling_window, config.edge_policy)?;
    let anomalies = detect_anomalies(&series, &band, config.anomaly_sigma);
    let points = banded_points(&series, &band, config.anomaly_sigma);
    let profile = seasonal_profile(&series);

    logging::log_analysis_summary(city, series.len(), anomalies.len(), profile.len());

    Ok(CityAnalysis {
        city: city.to_string(),
        summary,
        series,
        band,
        points,
        anomalies,
        seasonal_profile: profile,
    })
}

/// Fetch the live temperature for the analyzed city and judge it against
/// the seasonal profile for `month`, or the current local month when
/// `month` is `None`.
///
/// The judgment only runs when both external calls succeed.
pub fn check_live<P: WeatherProvider + ?Sized>(
    provider: &P,
    analysis: &CityAnalysis,
    month: Option<u32>,
    sigma: f64,
) -> Result<LiveCheck, LookupError> {
    let (location, reading) = lookup_live_reading(provider, &analysis.city).inspect_err(|e| {
        logging::log_lookup_failure(&analysis.city, e);
    })?;

    logging::info(
        DataSource::Weather,
        Some(&analysis.city),
        &format!("Current temperature: {:.1}°C", reading.temperature),
    );

    let judgment = match month {
        Some(month) => judge_at(&analysis.seasonal_profile, month, reading.temperature, sigma),
        None => judge(&analysis.seasonal_profile, reading.temperature, sigma),
    };

    Ok(LiveCheck {
        location,
        reading,
        judgment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "timestamp,city,temperature\n\
                       2024-01-02,Oslo,-3.0\n\
                       2024-01-01,Oslo,-5.0\n\
                       2024-01-01,Lima,22.0\n";

    #[test]
    fn test_first_city_is_selected_by_default() {
        let session = AnalysisSession::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(session.cities(), ["Oslo".to_string(), "Lima".to_string()]);
        assert_eq!(session.selected_city(), Some("Oslo"));
    }

    #[test]
    fn test_selecting_unknown_city_fails() {
        let mut session = AnalysisSession::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(
            session.select_city("Quito"),
            Err(AnalysisError::EmptySeries("Quito".to_string()))
        );
        // Previous selection is untouched.
        assert_eq!(session.selected_city(), Some("Oslo"));
    }

    #[test]
    fn test_reselection_recomputes_from_scratch() {
        let mut session = AnalysisSession::from_reader(CSV.as_bytes()).unwrap();
        let config = AnalysisConfig::default();

        let oslo = session.analyze(&config).unwrap();
        assert_eq!(oslo.summary.count, 2);
        assert_eq!(oslo.series.temperatures(), vec![-5.0, -3.0]);

        session.select_city("Lima").unwrap();
        let lima = session.analyze(&config).unwrap();
        assert_eq!(lima.city, "Lima");
        assert_eq!(lima.summary.count, 1);
        assert_eq!(lima.band, vec![None]);
        assert_eq!(lima.points.len(), 1);
        assert!(lima.anomalies.is_empty());
    }
}
