/// OpenWeatherMap API client
///
/// Resolves a city name to coordinates with the Geocoding API, then fetches
/// the current temperature at those coordinates. The two calls are strictly
/// sequential: a failed or empty geocoding lookup never issues the weather
/// request.
///
/// API Documentation: https://openweathermap.org/api/geocoding-api
/// Current weather:   https://openweathermap.org/current

use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;

use crate::config::OpenWeatherConfig;
use crate::model::{Coordinates, LiveReading, LookupError, LookupStage};

/// Always requested: the seasonal profile is in degrees Celsius.
const UNITS: &str = "metric";

// ============================================================================
// OpenWeatherMap Response Structures
// ============================================================================

/// One candidate location from `geo/1.0/direct`.
#[derive(Debug, Deserialize)]
pub struct GeocodingMatch {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country: Option<String>,
    pub state: Option<String>,
}

/// Current weather response from `data/2.5/weather`; only the fields the
/// seasonal check needs.
#[derive(Debug, Deserialize)]
pub struct CurrentWeatherResponse {
    pub main: MainBlock,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MainBlock {
    pub temp: f64,
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
}

/// Error body returned with non-2xx statuses, e.g.
/// `{"cod":401, "message": "Invalid API key. ..."}`.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub message: Option<String>,
}

// ============================================================================
// Provider contract
// ============================================================================

/// The two external calls behind the live check.
pub trait WeatherProvider {
    /// Best match for `city`, or `Ok(None)` when the service knows no such
    /// place.
    fn geocode(&self, city: &str) -> Result<Option<Coordinates>, LookupError>;

    /// Current temperature in degrees Celsius at `coords`.
    fn current_temperature(&self, coords: &Coordinates) -> Result<f64, LookupError>;
}

/// Geocode `city`, then fetch its current temperature.
///
/// Each failure is reported distinctly and aborts the rest of the pass.
pub fn lookup_live_reading<P: WeatherProvider + ?Sized>(
    provider: &P,
    city: &str,
) -> Result<(Coordinates, LiveReading), LookupError> {
    let coords = provider
        .geocode(city)?
        .ok_or_else(|| LookupError::CityNotFound(city.to_string()))?;

    let temperature = provider.current_temperature(&coords)?;

    Ok((
        coords,
        LiveReading {
            temperature,
            fetched_at: Utc::now(),
        },
    ))
}

// ============================================================================
// HTTP client
// ============================================================================

/// Blocking OpenWeatherMap client.
pub struct OpenWeatherClient {
    client: reqwest::blocking::Client,
    api_key: String,
    config: OpenWeatherConfig,
}

impl OpenWeatherClient {
    pub fn new(api_key: &str, config: OpenWeatherConfig) -> Result<Self, LookupError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| transport_error(LookupStage::Geocoding, e))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            config,
        })
    }

    fn get(
        &self,
        stage: LookupStage,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::blocking::Response, LookupError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .header("Accept", "application/json")
            .send()
            .map_err(|e| transport_error(stage, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LookupError::ApiRequest {
                stage,
                status: Some(status.as_u16()),
                message: upstream_message(&body)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string()),
            });
        }

        Ok(response)
    }
}

impl WeatherProvider for OpenWeatherClient {
    fn geocode(&self, city: &str) -> Result<Option<Coordinates>, LookupError> {
        let response = self.get(
            LookupStage::Geocoding,
            &self.config.geocoding_url,
            &[("q", city.to_string()), ("limit", "1".to_string())],
        )?;

        let matches: Vec<GeocodingMatch> = response
            .json()
            .map_err(|e| transport_error(LookupStage::Geocoding, e))?;

        Ok(first_match(matches))
    }

    fn current_temperature(&self, coords: &Coordinates) -> Result<f64, LookupError> {
        let response = self.get(
            LookupStage::Weather,
            &self.config.weather_url,
            &[
                ("lat", coords.latitude.to_string()),
                ("lon", coords.longitude.to_string()),
                ("units", UNITS.to_string()),
            ],
        )?;

        let weather: CurrentWeatherResponse = response
            .json()
            .map_err(|e| transport_error(LookupStage::Weather, e))?;

        Ok(weather.main.temp)
    }
}

fn first_match(matches: Vec<GeocodingMatch>) -> Option<Coordinates> {
    matches.into_iter().next().map(|m| Coordinates {
        name: m.name,
        country: m.country,
        latitude: m.lat,
        longitude: m.lon,
    })
}

/// The `message` field of an OpenWeatherMap error body, if there is one.
fn upstream_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
}

fn transport_error(stage: LookupStage, err: reqwest::Error) -> LookupError {
    LookupError::ApiRequest {
        stage,
        status: err.status().map(|s| s.as_u16()),
        message: err.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
