/// Per-city series extraction.
///
/// Both the rolling band and the seasonal profile assume chronological
/// order, so everything downstream starts from a `SeriesForCity`.

use crate::model::{AnalysisError, Reading, SeriesForCity};

/// Distinct city names in order of first appearance.
pub fn distinct_cities(readings: &[Reading]) -> Vec<String> {
    let mut cities: Vec<String> = Vec::new();
    for reading in readings {
        if !cities.iter().any(|c| *c == reading.city) {
            cities.push(reading.city.clone());
        }
    }
    cities
}

/// Readings whose city matches `city` exactly, ascending by timestamp.
///
/// The sort is stable: readings sharing a timestamp keep their file order.
/// Returns `AnalysisError::EmptySeries` if no reading matches.
pub fn extract_series(readings: &[Reading], city: &str) -> Result<SeriesForCity, AnalysisError> {
    let mut selected: Vec<Reading> = readings
        .iter()
        .filter(|r| r.city == city)
        .cloned()
        .collect();

    if selected.is_empty() {
        return Err(AnalysisError::EmptySeries(city.to_string()));
    }

    selected.sort_by_key(|r| r.timestamp);

    Ok(SeriesForCity {
        city: city.to_string(),
        readings: selected,
    })
}
