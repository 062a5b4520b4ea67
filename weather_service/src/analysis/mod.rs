/// Statistical analysis of a single city's temperature history.
///
/// Submodules:
/// - `series` — filters the dataset to one city and orders it by time.
/// - `stats` — shared mean / sample standard deviation / quantile helpers.
/// - `describe` — descriptive statistics of the temperature column.
/// - `rolling` — centered rolling band and anomaly detection.
/// - `seasonal` — per-calendar-month aggregation.

pub mod describe;
pub mod rolling;
pub mod seasonal;
pub mod series;
pub mod stats;
