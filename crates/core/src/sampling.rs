//! Downsampling of long time series for visualization.
//!
//! [`sample_adaptive`] bounds the output length while keeping the most
//! "interesting" records (high severity, axis extremes) plus an evenly spaced
//! backbone that preserves the overall shape of the series.

use std::str::FromStr;

use crate::error::CoreError;
use crate::reading::StoredReading;
use crate::severity::Severity;

/// A record that can be ranked by the adaptive sampler.
pub trait SamplePoint {
    fn severity(&self) -> Severity;

    /// Axis values in X, Y, Z order.
    fn axis_values(&self) -> [f64; 3];
}

impl SamplePoint for StoredReading {
    fn severity(&self) -> Severity {
        self.severity
    }

    fn axis_values(&self) -> [f64; 3] {
        [self.accel_x, self.accel_y, self.accel_z]
    }
}

/// Why the adaptive path could not rank a series.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SamplingError {
    #[error("record {index} has a non-finite axis value")]
    NonFinite { index: usize },
}

/// Sampling strategy requested by a history query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleMethod {
    #[default]
    Adaptive,
    Uniform,
    /// Return the series untouched.
    None,
}

impl FromStr for SampleMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "adaptive" => Ok(SampleMethod::Adaptive),
            "uniform" => Ok(SampleMethod::Uniform),
            "none" => Ok(SampleMethod::None),
            other => Err(CoreError::Validation(format!(
                "Invalid sample method '{other}', expected adaptive, uniform or none"
            ))),
        }
    }
}

/// Apply `method` with output cap `cap`.
pub fn sample<T: SamplePoint + Clone>(series: &[T], cap: usize, method: SampleMethod) -> Vec<T> {
    match method {
        SampleMethod::Adaptive => sample_adaptive(series, cap),
        SampleMethod::Uniform => sample_uniform(series, cap),
        SampleMethod::None => series.to_vec(),
    }
}

/// `count` evenly spaced indices over `0..len`, first and last included.
///
/// Mirrors integer-truncated `linspace(0, len - 1, count)`. A single sample
/// maps to index 0.
pub fn linspace_indices(len: usize, count: usize) -> Vec<usize> {
    if len == 0 || count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![0];
    }
    (0..count).map(|i| i * (len - 1) / (count - 1)).collect()
}

/// Evenly spaced subsample. Returns the input unchanged if it already fits.
pub fn sample_uniform<T: Clone>(series: &[T], cap: usize) -> Vec<T> {
    if series.len() <= cap {
        return series.to_vec();
    }
    linspace_indices(series.len(), cap)
        .into_iter()
        .map(|i| series[i].clone())
        .collect()
}

/// Adaptive subsample, falling back to [`sample_uniform`] if the series
/// cannot be ranked.
pub fn sample_adaptive<T: SamplePoint + Clone>(series: &[T], cap: usize) -> Vec<T> {
    try_sample_adaptive(series, cap).unwrap_or_else(|_| sample_uniform(series, cap))
}

/// Adaptive subsample without the uniform fallback.
pub fn try_sample_adaptive<T: SamplePoint + Clone>(
    series: &[T],
    cap: usize,
) -> Result<Vec<T>, SamplingError> {
    if series.len() <= cap {
        return Ok(series.to_vec());
    }
    let indices = select_adaptive(series, cap)?;
    Ok(indices.into_iter().map(|i| series[i].clone()).collect())
}

/// Interest score per record: `severity + Σ |2·normalized(v) − 1|`.
///
/// Normalization uses the min/max of each axis over the whole series; an
/// axis with zero range contributes nothing.
fn interest_scores<T: SamplePoint>(series: &[T]) -> Result<Vec<f64>, SamplingError> {
    let mut min = [f64::INFINITY; 3];
    let mut max = [f64::NEG_INFINITY; 3];
    for (index, point) in series.iter().enumerate() {
        for (axis, value) in point.axis_values().into_iter().enumerate() {
            if !value.is_finite() {
                return Err(SamplingError::NonFinite { index });
            }
            min[axis] = min[axis].min(value);
            max[axis] = max[axis].max(value);
        }
    }

    Ok(series
        .iter()
        .map(|point| {
            let extremeness: f64 = point
                .axis_values()
                .into_iter()
                .enumerate()
                .map(|(axis, value)| {
                    let range = max[axis] - min[axis];
                    if range > 0.0 {
                        ((value - min[axis]) / range * 2.0 - 1.0).abs()
                    } else {
                        0.0
                    }
                })
                .sum();
            f64::from(point.severity().level()) + extremeness
        })
        .collect())
}

fn select_adaptive<T: SamplePoint>(series: &[T], cap: usize) -> Result<Vec<usize>, SamplingError> {
    let scores = interest_scores(series)?;

    // Stable: ties keep chronological order.
    let mut by_interest: Vec<usize> = (0..series.len()).collect();
    by_interest.sort_by(|a, b| scores[*b].total_cmp(&scores[*a]));

    let top_n = (cap / 3).min(series.len());
    let mut chosen = vec![false; series.len()];
    for &i in &by_interest[..top_n] {
        chosen[i] = true;
    }

    let remaining: Vec<usize> = (0..series.len()).filter(|i| !chosen[*i]).collect();
    let backbone = cap - top_n;
    if remaining.len() > backbone {
        for k in linspace_indices(remaining.len(), backbone) {
            chosen[remaining[k]] = true;
        }
    } else {
        for i in remaining {
            chosen[i] = true;
        }
    }

    Ok((0..series.len()).filter(|i| chosen[*i]).collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Point {
        t: usize,
        severity: Severity,
        xyz: [f64; 3],
    }

    impl SamplePoint for Point {
        fn severity(&self) -> Severity {
            self.severity
        }

        fn axis_values(&self) -> [f64; 3] {
            self.xyz
        }
    }

    fn flat_series(len: usize) -> Vec<Point> {
        (0..len)
            .map(|t| Point {
                t,
                severity: Severity::Normal,
                xyz: [0.0, 9.8, 0.0],
            })
            .collect()
    }

    #[test]
    fn linspace_matches_truncated_linspace() {
        assert_eq!(linspace_indices(10, 4), vec![0, 3, 6, 9]);
        assert_eq!(linspace_indices(7, 3), vec![0, 3, 6]);
        assert_eq!(linspace_indices(5, 1), vec![0]);
        assert!(linspace_indices(5, 0).is_empty());
        assert!(linspace_indices(0, 3).is_empty());
    }

    #[test]
    fn short_series_is_returned_unchanged() {
        let series = flat_series(5);
        assert_eq!(sample_adaptive(&series, 5), series);
        assert_eq!(sample_adaptive(&series, 100), series);
        assert_eq!(sample_uniform(&series, 5), series);
    }

    #[test]
    fn spike_is_kept_even_when_uniform_spacing_would_miss_it() {
        let mut series = flat_series(100);
        series[41].severity = Severity::Level3;
        series[41].xyz = [4.0, 12.0, -3.0];

        let uniform = sample_uniform(&series, 10);
        assert!(uniform.iter().all(|p| p.t != 41));

        let adaptive = sample_adaptive(&series, 10);
        assert_eq!(adaptive.len(), 10);
        assert!(adaptive.iter().any(|p| p.t == 41));
    }

    #[test]
    fn flat_series_falls_back_to_spacing() {
        // All scores tie, so the interesting set is the first cap/3 records.
        let series = flat_series(30);
        let sampled = sample_adaptive(&series, 9);
        let ts: Vec<usize> = sampled.iter().map(|p| p.t).collect();
        assert_eq!(ts.len(), 9);
        assert_eq!(&ts[..3], &[0, 1, 2]);
        assert_eq!(*ts.last().unwrap(), 29);
    }

    #[test]
    fn non_finite_values_use_uniform_fallback() {
        let mut series = flat_series(20);
        series[3].xyz[0] = f64::NAN;
        assert_eq!(
            try_sample_adaptive(&series, 5),
            Err(SamplingError::NonFinite { index: 3 })
        );
        let sampled = sample_adaptive(&series, 5);
        let ts: Vec<usize> = sampled.iter().map(|p| p.t).collect();
        assert_eq!(ts, vec![0, 4, 9, 14, 19]);
    }

    #[test]
    fn zero_cap_yields_empty() {
        assert!(sample_adaptive(&flat_series(4), 0).is_empty());
    }

    #[test]
    fn method_parsing_and_dispatch() {
        assert_eq!("Uniform".parse::<SampleMethod>().unwrap(), SampleMethod::Uniform);
        assert!("random".parse::<SampleMethod>().is_err());
        let series = flat_series(50);
        assert_eq!(sample(&series, 10, SampleMethod::None).len(), 50);
        assert_eq!(sample(&series, 10, SampleMethod::Uniform).len(), 10);
    }

    fn arb_series() -> impl Strategy<Value = Vec<Point>> {
        prop::collection::vec((0i16..=3, -5.0f64..5.0, -5.0f64..15.0, -5.0f64..5.0), 1..200).prop_map(
            |rows| {
                rows.into_iter()
                    .enumerate()
                    .map(|(t, (sev, x, y, z))| Point {
                        t,
                        severity: Severity::from_level(sev).unwrap(),
                        xyz: [x, y, z],
                    })
                    .collect()
            },
        )
    }

    proptest! {
        #[test]
        fn output_is_bounded_and_chronological(series in arb_series(), cap in 1usize..120) {
            let sampled = sample_adaptive(&series, cap);
            prop_assert!(sampled.len() <= cap);
            prop_assert!(sampled.windows(2).all(|w| w[0].t < w[1].t));
            if series.len() <= cap {
                prop_assert_eq!(&sampled, &series);
            } else {
                prop_assert_eq!(sampled.len(), cap);
            }
        }

        #[test]
        fn sampling_is_deterministic(series in arb_series(), cap in 1usize..120) {
            prop_assert_eq!(sample_adaptive(&series, cap), sample_adaptive(&series, cap));
        }
    }
}
