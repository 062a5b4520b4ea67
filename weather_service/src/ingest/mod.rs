/// Data sources for the analysis service.
///
/// Submodules:
/// - `csv_file` — historical readings upload, schema validation included.
/// - `openweather` — live geocoding and current-weather lookup.

pub mod csv_file;
pub mod openweather;
