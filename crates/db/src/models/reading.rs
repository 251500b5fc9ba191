//! Vibration reading rows.
//!
//! Maps to the `vibration_readings` table.

use serde::Serialize;
use sqlx::FromRow;
use vibewatch_core::error::CoreError;
use vibewatch_core::reading::StoredReading;
use vibewatch_core::severity::Severity;
use vibewatch_core::types::{DbId, Timestamp};

/// A row from the `vibration_readings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VibrationReadingRow {
    pub id: DbId,
    pub sensor_id: DbId,
    pub recorded_at: Timestamp,
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,
    pub severity: i16,
    pub created_at: Timestamp,
}

impl TryFrom<VibrationReadingRow> for StoredReading {
    type Error = CoreError;

    fn try_from(row: VibrationReadingRow) -> Result<Self, Self::Error> {
        Ok(StoredReading {
            id: row.id,
            sensor_id: row.sensor_id,
            timestamp: row.recorded_at,
            accel_x: row.accel_x,
            accel_y: row.accel_y,
            accel_z: row.accel_z,
            severity: Severity::from_level(row.severity)?,
        })
    }
}
