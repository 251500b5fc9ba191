//! Persistence collaborator contract.
//!
//! The pipeline treats every call here as fallible I/O. Implementations live
//! in the `db` crate (PostgreSQL and in-memory).

use async_trait::async_trait;

use crate::alert::{Alert, NewAlert};
use crate::limits::LimitConfig;
use crate::reading::{Reading, StoredReading};
use crate::severity::Severity;
use crate::types::{DbId, TimeRange};

/// Errors surfaced by a persistence backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A uniqueness rule was violated (e.g. a second alert for one reading).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Any other backend failure.
    #[error("Database error: {0}")]
    Database(String),
}

/// Read-only alert history, as needed by the escalator.
#[async_trait]
pub trait AlertHistory: Send + Sync {
    /// Alerts for `sensor_id` at exactly `severity` with a timestamp in `range`.
    async fn query_alerts(
        &self,
        sensor_id: DbId,
        severity: Severity,
        range: TimeRange,
    ) -> Result<Vec<Alert>, StoreError>;
}

/// Full persistence contract used by the reading pipeline.
#[async_trait]
pub trait VibrationStore: AlertHistory {
    /// Persist a reading with its final severity and return its id.
    async fn insert_reading(&self, reading: &Reading, severity: Severity) -> Result<DbId, StoreError>;

    /// Persist an alert and return its id.
    async fn insert_alert(&self, alert: &NewAlert) -> Result<DbId, StoreError>;

    /// The active limit configuration, or `None` if none was ever saved.
    async fn get_limit_config(&self) -> Result<Option<LimitConfig>, StoreError>;

    /// Replace the active limit configuration.
    async fn save_limit_config(&self, config: &LimitConfig) -> Result<(), StoreError>;

    /// Stored readings for a sensor in `range`, oldest first.
    async fn query_readings(
        &self,
        sensor_id: DbId,
        range: TimeRange,
    ) -> Result<Vec<StoredReading>, StoreError>;
}
