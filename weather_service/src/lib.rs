//! Seasonal weather anomaly analysis.
//!
//! Loads a CSV of historical readings (`timestamp`, `city`, `temperature`),
//! flags readings outside a centered rolling band, builds a per-month
//! seasonal profile, and optionally judges the live OpenWeatherMap
//! temperature against that profile.

pub mod alert;
pub mod analysis;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod report;
pub mod session;
