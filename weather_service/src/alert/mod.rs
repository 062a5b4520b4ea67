//! Classification of live readings against the historical record.
//!
//! Submodules:
//! - `seasonal_norm` — compares a live temperature with the seasonal
//!   profile for the current month.

pub mod seasonal_norm;
