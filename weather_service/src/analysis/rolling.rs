/// Centered rolling band and anomaly detection.
///
/// For each point a window of `window` consecutive samples is centered on
/// it: `window / 2` samples before, the point itself, and the remainder
/// after (15 before and 14 after for the default window of 30). The band is
/// the mean and sample standard deviation over that window; a point is an
/// anomaly when it lies strictly more than `sigma` standard deviations away
/// from its band mean.
///
/// # Edge policy
/// Near either end of the series the full window does not fit.
/// - `EdgePolicy::Shrink` clips the window to the samples that exist and
///   keeps the band wherever at least two samples remain.
/// - `EdgePolicy::Strict` leaves the band undefined until the full window
///   fits, so no point closer than half a window to either end can be
///   flagged.

use serde::{Deserialize, Serialize};

use crate::analysis::stats::{mean, sample_stddev};
use crate::model::{AnalysisError, Anomaly, BandPoint, SeriesForCity, SeriesPoint};

/// Default number of samples in the rolling window.
pub const DEFAULT_WINDOW: usize = 30;

/// Default band half-width, in standard deviations.
pub const DEFAULT_SIGMA: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgePolicy {
    #[default]
    Shrink,
    Strict,
}

/// Inclusive index bounds of the window centered on `i`, or `None` when the
/// band is undefined there under `policy`.
fn window_bounds(i: usize, len: usize, window: usize, policy: EdgePolicy) -> Option<(usize, usize)> {
    let before = window / 2;
    let after = window - 1 - before;

    match policy {
        EdgePolicy::Strict => {
            if i < before || i + after >= len {
                return None;
            }
            Some((i - before, i + after))
        }
        EdgePolicy::Shrink => {
            let start = i.saturating_sub(before);
            let end = (i + after).min(len - 1);
            if end - start + 1 < 2 {
                return None;
            }
            Some((start, end))
        }
    }
}

/// Rolling mean and sample standard deviation for every point of `values`.
///
/// The result has one entry per input value; `None` where the band is
/// undefined under `policy`.
pub fn rolling_band(
    values: &[f64],
    window: usize,
    policy: EdgePolicy,
) -> Result<Vec<Option<BandPoint>>, AnalysisError> {
    if window < 2 {
        return Err(AnalysisError::InvalidWindow(window));
    }

    let band = (0..values.len())
        .map(|i| {
            let (start, end) = window_bounds(i, values.len(), window, policy)?;
            let slice = &values[start..=end];
            Some(BandPoint {
                mean: mean(slice)?,
                stddev: sample_stddev(slice)?,
            })
        })
        .collect();

    Ok(band)
}

/// Readings of `series` lying outside `mean ± sigma·stddev` of their own
/// rolling band, in ascending timestamp order.
pub fn detect_anomalies(
    series: &SeriesForCity,
    band: &[Option<BandPoint>],
    sigma: f64,
) -> Vec<Anomaly> {
    series
        .readings
        .iter()
        .zip(band)
        .filter_map(|(reading, point)| {
            let point = (*point)?;
            outside_band(reading.temperature, point, sigma).then(|| Anomaly {
                timestamp: reading.timestamp,
                temperature: reading.temperature,
                band_mean: point.mean,
                band_stddev: point.stddev,
            })
        })
        .collect()
}

/// Every reading of `series` paired with its band and anomaly flag, in
/// series order. This is what a time-series chart of the city plots.
pub fn banded_points(
    series: &SeriesForCity,
    band: &[Option<BandPoint>],
    sigma: f64,
) -> Vec<SeriesPoint> {
    series
        .readings
        .iter()
        .zip(band)
        .map(|(reading, point)| SeriesPoint {
            timestamp: reading.timestamp,
            temperature: reading.temperature,
            band: *point,
            anomaly: point.is_some_and(|p| outside_band(reading.temperature, p, sigma)),
        })
        .collect()
}

fn outside_band(temperature: f64, point: BandPoint, sigma: f64) -> bool {
    (temperature - point.mean).abs() > sigma * point.stddev
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Reading;
    use chrono::NaiveDate;

    /// January readings alternating 5° and 6°, with `outliers` substituted
    /// at the given day numbers.
    fn january(days: u32, outliers: &[(u32, f64)]) -> SeriesForCity {
        let readings = (1..=days)
            .map(|day| {
                let temperature = outliers
                    .iter()
                    .find(|(d, _)| *d == day)
                    .map(|(_, t)| *t)
                    .unwrap_or(if day % 2 == 0 { 6.0 } else { 5.0 });
                Reading {
                    timestamp: NaiveDate::from_ymd_opt(2024, 1, day)
                        .unwrap()
                        .and_hms_opt(12, 0, 0)
                        .unwrap(),
                    city: "Oslo".to_string(),
                    temperature,
                }
            })
            .collect();
        SeriesForCity {
            city: "Oslo".to_string(),
            readings,
        }
    }

    fn anomalies_for(series: &SeriesForCity, policy: EdgePolicy) -> Vec<Anomaly> {
        let band = rolling_band(&series.temperatures(), DEFAULT_WINDOW, policy).unwrap();
        detect_anomalies(series, &band, DEFAULT_SIGMA)
    }

    #[test]
    fn test_window_bounds_for_default_window() {
        // 15 before, the point, 14 after.
        assert_eq!(window_bounds(50, 100, 30, EdgePolicy::Strict), Some((35, 64)));
        assert_eq!(window_bounds(14, 100, 30, EdgePolicy::Strict), None);
        assert_eq!(window_bounds(15, 100, 30, EdgePolicy::Strict), Some((0, 29)));
        assert_eq!(window_bounds(85, 100, 30, EdgePolicy::Strict), Some((70, 99)));
        assert_eq!(window_bounds(86, 100, 30, EdgePolicy::Strict), None);
    }

    #[test]
    fn test_shrink_policy_clips_at_edges() {
        assert_eq!(window_bounds(0, 100, 30, EdgePolicy::Shrink), Some((0, 14)));
        assert_eq!(window_bounds(99, 100, 30, EdgePolicy::Shrink), Some((84, 99)));
        // A single-sample series has no spread anywhere.
        assert_eq!(window_bounds(0, 1, 30, EdgePolicy::Shrink), None);
    }

    #[test]
    fn test_window_below_two_is_rejected() {
        assert_eq!(
            rolling_band(&[1.0, 2.0], 1, EdgePolicy::Shrink),
            Err(AnalysisError::InvalidWindow(1))
        );
    }

    #[test]
    fn test_band_matches_direct_computation() {
        let values: Vec<f64> = (0..40).map(|i| (i as f64 * 0.7).sin() * 10.0).collect();
        let band = rolling_band(&values, 30, EdgePolicy::Shrink).unwrap();

        let slice = &values[5..=34]; // index 20: 15 before, 14 after
        let expected_mean = slice.iter().sum::<f64>() / 30.0;
        let expected_var =
            slice.iter().map(|v| (v - expected_mean).powi(2)).sum::<f64>() / 29.0;

        let point = band[20].expect("interior point has a band");
        assert!((point.mean - expected_mean).abs() < 1e-9);
        assert!((point.stddev - expected_var.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_single_outlier_at_month_end_is_the_only_anomaly() {
        let series = january(31, &[(31, 40.0)]);
        let anomalies = anomalies_for(&series, EdgePolicy::Shrink);

        assert_eq!(anomalies.len(), 1, "got {:?}", anomalies);
        assert_eq!(anomalies[0].temperature, 40.0);
        assert_eq!(anomalies[0].timestamp, series.readings[30].timestamp);
    }

    #[test]
    fn test_strict_policy_cannot_flag_edge_points() {
        let series = january(31, &[(31, 40.0)]);
        assert!(anomalies_for(&series, EdgePolicy::Strict).is_empty());
    }

    #[test]
    fn test_interior_outliers_found_under_both_policies() {
        let series = january(31, &[(16, -20.0)]);
        for policy in [EdgePolicy::Shrink, EdgePolicy::Strict] {
            let anomalies = anomalies_for(&series, policy);
            assert_eq!(anomalies.len(), 1, "{:?}: {:?}", policy, anomalies);
            assert_eq!(anomalies[0].temperature, -20.0);
        }
    }

    #[test]
    fn test_flat_series_has_no_anomalies() {
        let readings = january(31, &[])
            .readings
            .into_iter()
            .map(|r| Reading { temperature: 3.0, ..r })
            .collect();
        let series = SeriesForCity {
            city: "Oslo".to_string(),
            readings,
        };
        assert!(anomalies_for(&series, EdgePolicy::Shrink).is_empty());
    }

    #[test]
    fn test_every_anomaly_is_outside_its_own_band() {
        let series = january(31, &[(3, 25.0), (17, -15.0), (28, 30.0)]);
        let values = series.temperatures();
        let band = rolling_band(&values, DEFAULT_WINDOW, EdgePolicy::Shrink).unwrap();
        let anomalies = detect_anomalies(&series, &band, DEFAULT_SIGMA);

        assert!(!anomalies.is_empty());
        for anomaly in &anomalies {
            let idx = series
                .readings
                .iter()
                .position(|r| r.timestamp == anomaly.timestamp)
                .expect("anomaly must come from the series");
            let point = band[idx].unwrap();
            assert!((values[idx] - point.mean).abs() > DEFAULT_SIGMA * point.stddev);
        }
        assert!(anomalies.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn test_banded_points_flag_exactly_the_anomalies() {
        let series = january(31, &[(16, -20.0), (31, 40.0)]);
        let band = rolling_band(&series.temperatures(), DEFAULT_WINDOW, EdgePolicy::Strict).unwrap();
        let points = banded_points(&series, &band, DEFAULT_SIGMA);
        let anomalies = detect_anomalies(&series, &band, DEFAULT_SIGMA);

        assert_eq!(points.len(), series.len());
        assert!(points[0].band.is_none());
        assert!(!points[30].anomaly, "undefined band never flags");

        let flagged: Vec<_> = points.iter().filter(|p| p.anomaly).map(|p| p.timestamp).collect();
        let expected: Vec<_> = anomalies.iter().map(|a| a.timestamp).collect();
        assert_eq!(flagged, expected);
        assert_eq!(points[15].temperature, -20.0);
        assert!(points[15].anomaly);
    }
}
