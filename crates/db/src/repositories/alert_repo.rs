//! Repository for the `alerts` table.

use sqlx::PgPool;
use vibewatch_core::alert::NewAlert;
use vibewatch_core::severity::Severity;
use vibewatch_core::types::{DbId, Timestamp};

use crate::models::alert::AlertRow;

const COLUMNS: &str =
    "id, sensor_id, severity, raised_at, source_reading_id, message, acknowledged, created_at";

/// Provides insert and history queries for alerts.
pub struct AlertRepo;

impl AlertRepo {
    /// Insert an alert. Fails with a unique violation (`uq_alerts_source_reading`)
    /// if the source reading already has one.
    pub async fn insert(pool: &PgPool, alert: &NewAlert) -> Result<DbId, sqlx::Error> {
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO alerts (sensor_id, severity, raised_at, source_reading_id, message)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(alert.sensor_id)
        .bind(alert.severity.level())
        .bind(alert.timestamp)
        .bind(alert.source_reading_id)
        .bind(&alert.message)
        .fetch_one(pool)
        .await?;
        Ok(id)
    }

    /// Alerts for a sensor at exactly `severity`, raised in `[start, end]`.
    pub async fn list_in_window(
        pool: &PgPool,
        sensor_id: DbId,
        severity: Severity,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<AlertRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM alerts
             WHERE sensor_id = $1 AND severity = $2 AND raised_at BETWEEN $3 AND $4
             ORDER BY raised_at ASC"
        );
        sqlx::query_as::<_, AlertRow>(&query)
            .bind(sensor_id)
            .bind(severity.level())
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await
    }

    /// Mark an alert as acknowledged. Returns `true` if a row was updated.
    pub async fn acknowledge(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE alerts SET acknowledged = TRUE WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
