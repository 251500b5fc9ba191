//! Threshold-based severity classification.
//!
//! Pure logic, no I/O. The caller fetches the current [`LimitConfig`]
//! snapshot and passes it in.

use serde::Serialize;

use crate::error::CoreError;
use crate::limits::LimitConfig;
use crate::predictor::{Prediction, SeverityPredictor};
use crate::reading::{Axis, Reading};
use crate::severity::Severity;

/// Result of classifying one reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub severity: Severity,
    /// First axis that raised the running maximum to its final value.
    pub triggering_axis: Option<Axis>,
}

impl Classification {
    pub const NORMAL: Classification = Classification {
        severity: Severity::Normal,
        triggering_axis: None,
    };
}

/// Classify a reading against the configured bands.
///
/// Axes are evaluated in X, Y, Z order. Severity is a running maximum:
/// a value outside the 3-sigma band yields Level 3, outside the 2-sigma band
/// yields at least Level 2. With no limits configured the result is Normal.
pub fn classify(reading: &Reading, limits: Option<&LimitConfig>) -> Result<Classification, CoreError> {
    reading.validate()?;

    let Some(limits) = limits else {
        return Ok(Classification::NORMAL);
    };

    let mut result = Classification::NORMAL;
    for axis in Axis::ALL {
        let value = reading.axis(axis);
        let bands = limits.axis(axis);
        let axis_severity = if bands.sigma3.excludes(value) {
            Severity::Level3
        } else if bands.sigma2.excludes(value) {
            Severity::Level2
        } else {
            continue;
        };

        if axis_severity > result.severity {
            result = Classification {
                severity: axis_severity,
                triggering_axis: Some(axis),
            };
        }
    }

    Ok(result)
}

/// [`SeverityPredictor`] backed by a fixed limit snapshot.
#[derive(Debug, Clone)]
pub struct ThresholdClassifier {
    limits: Option<LimitConfig>,
}

impl ThresholdClassifier {
    pub fn new(limits: Option<LimitConfig>) -> Self {
        Self { limits }
    }
}

impl SeverityPredictor for ThresholdClassifier {
    fn name(&self) -> &str {
        "threshold"
    }

    fn predict(&self, x: f64, y: f64, z: f64) -> Result<Prediction, CoreError> {
        let reading = Reading::new(0, chrono::Utc::now(), x, y, z);
        let classification = classify(&reading, self.limits.as_ref())?;
        Ok(Prediction {
            severity: classification.severity,
            confidence: 1.0,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
