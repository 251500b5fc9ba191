//! Pluggable severity prediction.
//!
//! Any model (trained network, heuristic, remote service) can plug into the
//! pipeline by implementing [`SeverityPredictor`]. The pipeline only relies on
//! this signature; how a predictor is built or loaded is up to the caller.

use serde::Serialize;

use crate::error::CoreError;
use crate::severity::Severity;

/// Output of a severity predictor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub severity: Severity,
    /// Confidence in `0.0..=1.0`.
    pub confidence: f64,
}

/// Contract shared by the threshold classifier and model-backed predictors.
pub trait SeverityPredictor: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    fn predict(&self, x: f64, y: f64, z: f64) -> Result<Prediction, CoreError>;
}

/// How an injected predictor combines with the threshold classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PredictorMode {
    /// Use the predictor's severity instead of the threshold result.
    Replace,
    /// Take the higher of the two severities.
    #[default]
    Augment,
}

/// Magnitude cut-offs used when no trained model is available.
const FALLBACK_NORMAL_BELOW: f64 = 0.8;
const FALLBACK_LEVEL1_BELOW: f64 = 1.2;

/// Heuristic predictor based on vibration magnitude alone.
///
/// Never yields Level 3; escalation to Level 3 is left to the temporal
/// pattern rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagnitudeFallbackPredictor;

impl SeverityPredictor for MagnitudeFallbackPredictor {
    fn name(&self) -> &str {
        "magnitude-fallback"
    }

    fn predict(&self, x: f64, y: f64, z: f64) -> Result<Prediction, CoreError> {
        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return Err(CoreError::Input(format!(
                "non-finite acceleration ({x}, {y}, {z})"
            )));
        }
        let magnitude = (x * x + y * y + z * z).sqrt();
        let prediction = if magnitude < FALLBACK_NORMAL_BELOW {
            Prediction {
                severity: Severity::Normal,
                confidence: 0.90,
            }
        } else if magnitude < FALLBACK_LEVEL1_BELOW {
            Prediction {
                severity: Severity::Level1,
                confidence: 0.75,
            }
        } else {
            Prediction {
                severity: Severity::Level2,
                confidence: 0.80,
            }
        };
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_buckets_by_magnitude() {
        let p = MagnitudeFallbackPredictor;
        assert_eq!(p.predict(0.1, 0.2, 0.3).unwrap().severity, Severity::Normal);
        assert_eq!(p.predict(1.0, 0.0, 0.0).unwrap().severity, Severity::Level1);
        assert_eq!(p.predict(0.0, 9.8, 0.0).unwrap().severity, Severity::Level2);
    }

    #[test]
    fn fallback_is_deterministic() {
        let p = MagnitudeFallbackPredictor;
        assert_eq!(p.predict(0.5, 0.5, 0.5).unwrap(), p.predict(0.5, 0.5, 0.5).unwrap());
    }

    #[test]
    fn fallback_rejects_nan() {
        assert!(MagnitudeFallbackPredictor.predict(f64::NAN, 0.0, 0.0).is_err());
    }
}
