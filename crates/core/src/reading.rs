//! Triaxial vibration readings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::severity::Severity;
use crate::types::{DbId, Timestamp};

/// Accelerometer axis. Classification always evaluates X, Y, Z in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn as_str(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Axis {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            other => Err(CoreError::Validation(format!(
                "Invalid axis '{other}', expected one of x, y, z"
            ))),
        }
    }
}

/// A single accelerometer sample from one sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub sensor_id: DbId,
    pub timestamp: Timestamp,
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,
}

impl Reading {
    pub fn new(sensor_id: DbId, timestamp: Timestamp, x: f64, y: f64, z: f64) -> Self {
        Self {
            sensor_id,
            timestamp,
            accel_x: x,
            accel_y: y,
            accel_z: z,
        }
    }

    pub fn axis(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.accel_x,
            Axis::Y => self.accel_y,
            Axis::Z => self.accel_z,
        }
    }

    /// Euclidean norm of the three axes. Derived, never stored.
    pub fn magnitude(&self) -> f64 {
        (self.accel_x.powi(2) + self.accel_y.powi(2) + self.accel_z.powi(2)).sqrt()
    }

    /// Reject readings carrying NaN or infinite values.
    pub fn validate(&self) -> Result<(), CoreError> {
        for axis in Axis::ALL {
            let value = self.axis(axis);
            if !value.is_finite() {
                return Err(CoreError::Input(format!(
                    "sensor {} reported non-finite {axis} value {value}",
                    self.sensor_id
                )));
            }
        }
        Ok(())
    }
}

/// A reading as persisted, with its assigned id and stored severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReading {
    pub id: DbId,
    pub sensor_id: DbId,
    pub timestamp: Timestamp,
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,
    pub severity: Severity,
}

impl StoredReading {
    pub fn from_reading(id: DbId, reading: &Reading, severity: Severity) -> Self {
        Self {
            id,
            sensor_id: reading.sensor_id,
            timestamp: reading.timestamp,
            accel_x: reading.accel_x,
            accel_y: reading.accel_y,
            accel_z: reading.accel_z,
            severity,
        }
    }
}
