//! Repository for the `vibration_readings` table.

use sqlx::PgPool;
use vibewatch_core::reading::Reading;
use vibewatch_core::severity::Severity;
use vibewatch_core::types::{DbId, Timestamp};

use crate::models::reading::VibrationReadingRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, sensor_id, recorded_at, accel_x, accel_y, accel_z, severity, created_at";

/// Provides insert and range queries for vibration readings.
pub struct ReadingRepo;

impl ReadingRepo {
    /// Insert a reading with its final severity, returning the new id.
    pub async fn insert(
        pool: &PgPool,
        reading: &Reading,
        severity: Severity,
    ) -> Result<DbId, sqlx::Error> {
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO vibration_readings
                (sensor_id, recorded_at, accel_x, accel_y, accel_z, severity)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(reading.sensor_id)
        .bind(reading.timestamp)
        .bind(reading.accel_x)
        .bind(reading.accel_y)
        .bind(reading.accel_z)
        .bind(severity.level())
        .fetch_one(pool)
        .await?;
        Ok(id)
    }

    /// Readings for one sensor between `start` and `end` inclusive, oldest first.
    pub async fn list_for_sensor(
        pool: &PgPool,
        sensor_id: DbId,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<VibrationReadingRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM vibration_readings
             WHERE sensor_id = $1 AND recorded_at BETWEEN $2 AND $3
             ORDER BY recorded_at ASC, id ASC"
        );
        sqlx::query_as::<_, VibrationReadingRow>(&query)
            .bind(sensor_id)
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await
    }
}
