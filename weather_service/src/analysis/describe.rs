/// Descriptive statistics of a city's temperature readings: count, mean,
/// sample std, min, quartiles and max.

use crate::analysis::stats::{mean, quantile_sorted, sample_stddev};
use crate::model::{SeriesForCity, Summary};

/// Returns `None` only for an empty series, which `extract_series` never
/// produces.
pub fn describe(series: &SeriesForCity) -> Option<Summary> {
    let mut sorted = series.temperatures();
    sorted.sort_by(f64::total_cmp);

    Some(Summary {
        count: sorted.len(),
        mean: mean(&sorted)?,
        std: sample_stddev(&sorted),
        min: *sorted.first()?,
        q25: quantile_sorted(&sorted, 0.25)?,
        median: quantile_sorted(&sorted, 0.5)?,
        q75: quantile_sorted(&sorted, 0.75)?,
        max: *sorted.last()?,
    })
}
