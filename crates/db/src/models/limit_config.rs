//! Limit configuration rows.
//!
//! Maps to the append-only `limit_configs` table; the newest row is active.

use serde::Serialize;
use sqlx::FromRow;
use vibewatch_core::error::CoreError;
use vibewatch_core::limits::{AxisLimits, Band, LimitConfig};
use vibewatch_core::reading::Axis;
use vibewatch_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `limit_configs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LimitConfigRow {
    pub id: DbId,
    pub x_sigma2_lower: f64,
    pub x_sigma2_upper: f64,
    pub x_sigma3_lower: f64,
    pub x_sigma3_upper: f64,
    pub y_sigma2_lower: f64,
    pub y_sigma2_upper: f64,
    pub y_sigma3_lower: f64,
    pub y_sigma3_upper: f64,
    pub z_sigma2_lower: f64,
    pub z_sigma2_upper: f64,
    pub z_sigma3_lower: f64,
    pub z_sigma3_upper: f64,
    pub created_at: Timestamp,
}

/// Rows are re-validated on read; a row that breaks band nesting is a
/// validation error.
impl TryFrom<LimitConfigRow> for LimitConfig {
    type Error = CoreError;

    fn try_from(row: LimitConfigRow) -> Result<Self, Self::Error> {
        LimitConfig::new(
            AxisLimits::new(
                Band::new(row.x_sigma2_lower, row.x_sigma2_upper),
                Band::new(row.x_sigma3_lower, row.x_sigma3_upper),
            ),
            AxisLimits::new(
                Band::new(row.y_sigma2_lower, row.y_sigma2_upper),
                Band::new(row.y_sigma3_lower, row.y_sigma3_upper),
            ),
            AxisLimits::new(
                Band::new(row.z_sigma2_lower, row.z_sigma2_upper),
                Band::new(row.z_sigma3_lower, row.z_sigma3_upper),
            ),
        )
    }
}

// ---------------------------------------------------------------------------
// Insert DTO
// ---------------------------------------------------------------------------

/// Flattened bounds in column order, for inserts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreateLimitConfig {
    /// `[sigma2.lower, sigma2.upper, sigma3.lower, sigma3.upper]` per axis, x then y then z.
    pub bounds: [[f64; 4]; 3],
}

impl From<&LimitConfig> for CreateLimitConfig {
    fn from(config: &LimitConfig) -> Self {
        let flatten = |axis: Axis| {
            let limits = config.axis(axis);
            [
                limits.sigma2.lower,
                limits.sigma2.upper,
                limits.sigma3.lower,
                limits.sigma3.upper,
            ]
        };
        Self {
            bounds: [flatten(Axis::X), flatten(Axis::Y), flatten(Axis::Z)],
        }
    }
}
