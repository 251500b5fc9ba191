//! Alert rows.
//!
//! Maps to the `alerts` table. `source_reading_id` is unique, so a reading
//! can raise at most one alert.

use serde::Serialize;
use sqlx::FromRow;
use vibewatch_core::alert::Alert;
use vibewatch_core::error::CoreError;
use vibewatch_core::severity::Severity;
use vibewatch_core::types::{DbId, Timestamp};

/// A row from the `alerts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AlertRow {
    pub id: DbId,
    pub sensor_id: DbId,
    pub severity: i16,
    pub raised_at: Timestamp,
    pub source_reading_id: Option<DbId>,
    pub message: String,
    pub acknowledged: bool,
    pub created_at: Timestamp,
}

impl TryFrom<AlertRow> for Alert {
    type Error = CoreError;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        Ok(Alert {
            id: row.id,
            sensor_id: row.sensor_id,
            severity: Severity::from_level(row.severity)?,
            timestamp: row.raised_at,
            source_reading_id: row.source_reading_id,
            message: row.message,
            acknowledged: row.acknowledged,
        })
    }
}
