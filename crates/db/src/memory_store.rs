//! In-memory [`VibrationStore`] for running replays without a database.
//!
//! Behaves like the PostgreSQL store for everything the pipeline relies on:
//! sequential ids, inclusive time-range queries ordered oldest first, and a
//! `Conflict` on a second alert for the same reading.

use async_trait::async_trait;
use tokio::sync::RwLock;
use vibewatch_core::alert::{Alert, NewAlert};
use vibewatch_core::limits::LimitConfig;
use vibewatch_core::reading::{Reading, StoredReading};
use vibewatch_core::severity::Severity;
use vibewatch_core::store::{AlertHistory, StoreError, VibrationStore};
use vibewatch_core::types::{DbId, TimeRange};

#[derive(Debug, Default)]
struct Tables {
    readings: Vec<StoredReading>,
    alerts: Vec<Alert>,
    limits: Option<LimitConfig>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose active limit configuration is already set.
    pub fn with_limits(limits: LimitConfig) -> Self {
        Self {
            tables: RwLock::new(Tables {
                limits: Some(limits),
                ..Tables::default()
            }),
        }
    }

    /// Snapshot of every stored reading, in insertion order.
    pub async fn readings(&self) -> Vec<StoredReading> {
        self.tables.read().await.readings.clone()
    }

    /// Snapshot of every stored alert, in insertion order.
    pub async fn alerts(&self) -> Vec<Alert> {
        self.tables.read().await.alerts.clone()
    }
}

#[async_trait]
impl AlertHistory for MemoryStore {
    async fn query_alerts(
        &self,
        sensor_id: DbId,
        severity: Severity,
        range: TimeRange,
    ) -> Result<Vec<Alert>, StoreError> {
        let tables = self.tables.read().await;
        let mut alerts: Vec<Alert> = tables
            .alerts
            .iter()
            .filter(|a| a.sensor_id == sensor_id && a.severity == severity && range.contains(a.timestamp))
            .cloned()
            .collect();
        alerts.sort_by_key(|a| a.timestamp);
        Ok(alerts)
    }
}

#[async_trait]
impl VibrationStore for MemoryStore {
    async fn insert_reading(&self, reading: &Reading, severity: Severity) -> Result<DbId, StoreError> {
        let mut tables = self.tables.write().await;
        let id = tables.readings.len() as DbId + 1;
        tables
            .readings
            .push(StoredReading::from_reading(id, reading, severity));
        Ok(id)
    }

    async fn insert_alert(&self, alert: &NewAlert) -> Result<DbId, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(reading_id) = alert.source_reading_id {
            if tables
                .alerts
                .iter()
                .any(|a| a.source_reading_id == Some(reading_id))
            {
                return Err(StoreError::Conflict(format!(
                    "Reading {reading_id} already has an alert"
                )));
            }
        }
        let id = tables.alerts.len() as DbId + 1;
        tables.alerts.push(alert.clone().into_alert(id));
        Ok(id)
    }

    async fn get_limit_config(&self) -> Result<Option<LimitConfig>, StoreError> {
        Ok(self.tables.read().await.limits)
    }

    async fn save_limit_config(&self, config: &LimitConfig) -> Result<(), StoreError> {
        self.tables.write().await.limits = Some(*config);
        Ok(())
    }

    async fn query_readings(
        &self,
        sensor_id: DbId,
        range: TimeRange,
    ) -> Result<Vec<StoredReading>, StoreError> {
        let tables = self.tables.read().await;
        let mut readings: Vec<StoredReading> = tables
            .readings
            .iter()
            .filter(|r| r.sensor_id == sensor_id && range.contains(r.timestamp))
            .cloned()
            .collect();
        // Stable, so equal timestamps keep insertion order.
        readings.sort_by_key(|r| r.timestamp);
        Ok(readings)
    }
}
