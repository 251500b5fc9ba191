//! PostgreSQL-backed [`VibrationStore`].

use async_trait::async_trait;
use vibewatch_core::alert::{Alert, NewAlert};
use vibewatch_core::limits::LimitConfig;
use vibewatch_core::reading::{Reading, StoredReading};
use vibewatch_core::severity::Severity;
use vibewatch_core::store::{AlertHistory, StoreError, VibrationStore};
use vibewatch_core::types::{DbId, TimeRange};

use crate::models::limit_config::CreateLimitConfig;
use crate::repositories::{AlertRepo, LimitConfigRepo, ReadingRepo};
use crate::DbPool;

/// Store that delegates to the repositories over a shared pool.
#[derive(Debug, Clone)]
pub struct PgVibrationStore {
    pool: DbPool,
}

impl PgVibrationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Classify a sqlx error into a [`StoreError`].
///
/// - Unique violations (SQLSTATE 23505) map to `Conflict`.
/// - Pool and transport failures map to `Unavailable`.
/// - Everything else maps to `Database`.
fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            let constraint = db_err.constraint().unwrap_or("unknown");
            StoreError::Conflict(format!(
                "Duplicate value violates unique constraint: {constraint}"
            ))
        }
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Unavailable(err.to_string()),
        _ => StoreError::Database(err.to_string()),
    }
}

#[async_trait]
impl AlertHistory for PgVibrationStore {
    async fn query_alerts(
        &self,
        sensor_id: DbId,
        severity: Severity,
        range: TimeRange,
    ) -> Result<Vec<Alert>, StoreError> {
        let rows = AlertRepo::list_in_window(&self.pool, sensor_id, severity, range.start, range.end)
            .await
            .map_err(map_sqlx_error)?;
        rows.into_iter()
            .map(|row| Alert::try_from(row).map_err(|e| StoreError::Database(e.to_string())))
            .collect()
    }
}

#[async_trait]
impl VibrationStore for PgVibrationStore {
    async fn insert_reading(&self, reading: &Reading, severity: Severity) -> Result<DbId, StoreError> {
        ReadingRepo::insert(&self.pool, reading, severity)
            .await
            .map_err(map_sqlx_error)
    }

    async fn insert_alert(&self, alert: &NewAlert) -> Result<DbId, StoreError> {
        AlertRepo::insert(&self.pool, alert)
            .await
            .map_err(map_sqlx_error)
    }

    async fn get_limit_config(&self) -> Result<Option<LimitConfig>, StoreError> {
        let row = LimitConfigRepo::find_active(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.map(LimitConfig::try_from)
            .transpose()
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    async fn save_limit_config(&self, config: &LimitConfig) -> Result<(), StoreError> {
        let row = LimitConfigRepo::insert(&self.pool, &CreateLimitConfig::from(config))
            .await
            .map_err(map_sqlx_error)?;
        tracing::info!(limit_config_id = row.id, "Saved limit configuration");
        Ok(())
    }

    async fn query_readings(
        &self,
        sensor_id: DbId,
        range: TimeRange,
    ) -> Result<Vec<StoredReading>, StoreError> {
        let rows = ReadingRepo::list_for_sensor(&self.pool, sensor_id, range.start, range.end)
            .await
            .map_err(map_sqlx_error)?;
        rows.into_iter()
            .map(|row| StoredReading::try_from(row).map_err(|e| StoreError::Database(e.to_string())))
            .collect()
    }
}
