/// Seasonal profile: temperature statistics per calendar month.
///
/// All years are pooled: three Januaries contribute every one of their
/// readings to a single month-1 entry. Months without data are absent from
/// the profile rather than zero-filled.

use std::collections::BTreeMap;

use chrono::Datelike;

use crate::analysis::stats::{mean, sample_stddev};
use crate::model::{MonthStats, SeriesForCity};

/// Month number (1–12) → statistics for that month.
pub type SeasonalProfile = BTreeMap<u32, MonthStats>;

pub fn seasonal_profile(series: &SeriesForCity) -> SeasonalProfile {
    let mut by_month: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for reading in &series.readings {
        by_month
            .entry(reading.timestamp.month())
            .or_default()
            .push(reading.temperature);
    }

    by_month
        .into_iter()
        .filter_map(|(month, temps)| {
            Some((
                month,
                MonthStats {
                    count: temps.len(),
                    mean: mean(&temps)?,
                    stddev: sample_stddev(&temps),
                },
            ))
        })
        .collect()
}

/// English month name for report output.
pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "?",
    }
}
