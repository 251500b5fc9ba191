//! Statistical limit configuration (2-sigma / 3-sigma bands per axis).
//!
//! A [`LimitConfig`] can only be obtained through validating constructors,
//! so the classifier never has to check band ordering itself.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::reading::Axis;

/// A lower/upper bound pair. Values strictly outside the pair are violations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub lower: f64,
    pub upper: f64,
}

impl Band {
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// `true` if `value` lies outside `[lower, upper]`.
    pub fn excludes(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }

    fn bound(&self, bound: Bound) -> f64 {
        match bound {
            Bound::Lower => self.lower,
            Bound::Upper => self.upper,
        }
    }

    fn set(&mut self, bound: Bound, value: f64) {
        match bound {
            Bound::Lower => self.lower = value,
            Bound::Upper => self.upper = value,
        }
    }
}

/// The two bands configured for a single axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisLimits {
    pub sigma2: Band,
    pub sigma3: Band,
}

impl AxisLimits {
    pub const fn new(sigma2: Band, sigma3: Band) -> Self {
        Self { sigma2, sigma3 }
    }

    pub fn band(&self, tier: SigmaTier) -> &Band {
        match tier {
            SigmaTier::Sigma2 => &self.sigma2,
            SigmaTier::Sigma3 => &self.sigma3,
        }
    }

    fn band_mut(&mut self, tier: SigmaTier) -> &mut Band {
        match tier {
            SigmaTier::Sigma2 => &mut self.sigma2,
            SigmaTier::Sigma3 => &mut self.sigma3,
        }
    }

    fn validate(&self, axis: Axis) -> Result<(), CoreError> {
        for tier in [SigmaTier::Sigma2, SigmaTier::Sigma3] {
            let band = self.band(tier);
            for bound in [Bound::Lower, Bound::Upper] {
                let value = band.bound(bound);
                if !value.is_finite() {
                    return Err(CoreError::Validation(format!(
                        "{axis} {tier} {bound} bound must be finite, got {value}"
                    )));
                }
            }
            if band.lower >= band.upper {
                return Err(CoreError::Validation(format!(
                    "{axis} {tier} lower bound ({}) must be below upper bound ({})",
                    band.lower, band.upper
                )));
            }
        }
        if self.sigma2.lower <= self.sigma3.lower {
            return Err(CoreError::Validation(format!(
                "{axis} sigma2 lower bound ({}) must be greater than sigma3 lower bound ({})",
                self.sigma2.lower, self.sigma3.lower
            )));
        }
        if self.sigma2.upper >= self.sigma3.upper {
            return Err(CoreError::Validation(format!(
                "{axis} sigma2 upper bound ({}) must be less than sigma3 upper bound ({})",
                self.sigma2.upper, self.sigma3.upper
            )));
        }
        Ok(())
    }
}

/// Band width tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigmaTier {
    Sigma2,
    Sigma3,
}

impl fmt::Display for SigmaTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SigmaTier::Sigma2 => "sigma2",
            SigmaTier::Sigma3 => "sigma3",
        })
    }
}

impl FromStr for SigmaTier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sigma2" | "2" => Ok(SigmaTier::Sigma2),
            "sigma3" | "3" => Ok(SigmaTier::Sigma3),
            other => Err(CoreError::Validation(format!(
                "Invalid sigma level '{other}', expected sigma2 or sigma3"
            ))),
        }
    }
}

/// Which side of a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bound {
    Lower,
    Upper,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Bound::Lower => "lower",
            Bound::Upper => "upper",
        })
    }
}

impl FromStr for Bound {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lower" | "inf" => Ok(Bound::Lower),
            "upper" | "sup" => Ok(Bound::Upper),
            other => Err(CoreError::Validation(format!(
                "Invalid limit type '{other}', expected lower or upper"
            ))),
        }
    }
}

/// Per-axis limit configuration. Always satisfies, for every axis,
/// `sigma3.lower < sigma2.lower < sigma2.upper < sigma3.upper`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLimitConfig", into = "RawLimitConfig")]
pub struct LimitConfig {
    x: AxisLimits,
    y: AxisLimits,
    z: AxisLimits,
}

/// Unchecked wire shape of [`LimitConfig`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawLimitConfig {
    x: AxisLimits,
    y: AxisLimits,
    z: AxisLimits,
}

impl TryFrom<RawLimitConfig> for LimitConfig {
    type Error = CoreError;

    fn try_from(raw: RawLimitConfig) -> Result<Self, Self::Error> {
        LimitConfig::new(raw.x, raw.y, raw.z)
    }
}

impl From<LimitConfig> for RawLimitConfig {
    fn from(config: LimitConfig) -> Self {
        Self {
            x: config.x,
            y: config.y,
            z: config.z,
        }
    }
}

impl Default for LimitConfig {
    /// Factory bounds calibrated on the reference machine.
    fn default() -> Self {
        Self {
            x: AxisLimits::new(
                Band::new(-2.364295, 2.180056),
                Band::new(-3.500383, 3.316144),
            ),
            y: AxisLimits::new(
                Band::new(7.177221, 12.088666),
                Band::new(5.949359, 13.316528),
            ),
            z: AxisLimits::new(
                Band::new(-2.389107, 1.106510),
                Band::new(-3.263011, 1.980414),
            ),
        }
    }
}

impl LimitConfig {
    /// Build a configuration, rejecting any axis whose bands are not nested.
    pub fn new(x: AxisLimits, y: AxisLimits, z: AxisLimits) -> Result<Self, CoreError> {
        let config = Self { x, y, z };
        config.validate()?;
        Ok(config)
    }

    pub fn axis(&self, axis: Axis) -> &AxisLimits {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    /// Return a copy with a single bound replaced, validated as a whole.
    pub fn with_bound(
        &self,
        axis: Axis,
        tier: SigmaTier,
        bound: Bound,
        value: f64,
    ) -> Result<Self, CoreError> {
        let mut next = *self;
        let limits = match axis {
            Axis::X => &mut next.x,
            Axis::Y => &mut next.y,
            Axis::Z => &mut next.z,
        };
        limits.band_mut(tier).set(bound, value);
        next.validate()?;
        Ok(next)
    }

    fn validate(&self) -> Result<(), CoreError> {
        for axis in Axis::ALL {
            self.axis(axis).validate(axis)?;
        }
        Ok(())
    }
}
