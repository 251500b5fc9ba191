//! Integration tests for the in-memory store.

use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use vibewatch_core::alert::NewAlert;
use vibewatch_core::limits::{Bound, LimitConfig, SigmaTier};
use vibewatch_core::reading::{Axis, Reading};
use vibewatch_core::severity::Severity;
use vibewatch_core::store::{AlertHistory, StoreError, VibrationStore};
use vibewatch_core::types::{TimeRange, Timestamp};
use vibewatch_db::MemoryStore;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
}

fn reading(sensor_id: i64, offset_secs: i64) -> Reading {
    Reading::new(sensor_id, t0() + Duration::seconds(offset_secs), 0.1, 9.8, 0.2)
}

fn new_alert(sensor_id: i64, severity: Severity, at: Timestamp, reading_id: Option<i64>) -> NewAlert {
    NewAlert {
        sensor_id,
        severity,
        timestamp: at,
        source_reading_id: reading_id,
        message: format!("{severity} on sensor {sensor_id}"),
    }
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn readings_get_sequential_ids() {
    let store = MemoryStore::new();
    let a = store.insert_reading(&reading(1, 0), Severity::Normal).await.unwrap();
    let b = store.insert_reading(&reading(1, 1), Severity::Level2).await.unwrap();
    assert_eq!((a, b), (1, 2));
    assert_eq!(store.readings().await[1].severity, Severity::Level2);
}

#[tokio::test]
async fn query_readings_is_chronological_and_filtered() {
    let store = MemoryStore::new();
    store.insert_reading(&reading(1, 30), Severity::Normal).await.unwrap();
    store.insert_reading(&reading(2, 10), Severity::Normal).await.unwrap();
    store.insert_reading(&reading(1, 10), Severity::Level1).await.unwrap();
    store.insert_reading(&reading(1, 90), Severity::Normal).await.unwrap();

    let range = TimeRange::new(t0(), t0() + Duration::seconds(60));
    let series = store.query_readings(1, range).await.unwrap();
    let offsets: Vec<i64> = series
        .iter()
        .map(|r| (r.timestamp - t0()).num_seconds())
        .collect();
    assert_eq!(offsets, vec![10, 30]);
    assert!(series.iter().all(|r| r.sensor_id == 1));
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn second_alert_for_same_reading_conflicts() {
    let store = MemoryStore::new();
    let reading_id = store.insert_reading(&reading(1, 0), Severity::Level2).await.unwrap();

    store
        .insert_alert(&new_alert(1, Severity::Level2, t0(), Some(reading_id)))
        .await
        .unwrap();
    let err = store
        .insert_alert(&new_alert(1, Severity::Level2, t0(), Some(reading_id)))
        .await
        .unwrap_err();
    assert_matches!(err, StoreError::Conflict(_));
    assert_eq!(store.alerts().await.len(), 1);
}

#[tokio::test]
async fn alerts_without_reading_id_never_conflict() {
    let store = MemoryStore::new();
    store.insert_alert(&new_alert(1, Severity::Level1, t0(), None)).await.unwrap();
    store.insert_alert(&new_alert(1, Severity::Level1, t0(), None)).await.unwrap();
    assert_eq!(store.alerts().await.len(), 2);
}

#[tokio::test]
async fn query_alerts_matches_exact_severity_and_inclusive_window() {
    let store = MemoryStore::new();
    let end = t0() + Duration::minutes(15);
    store.insert_alert(&new_alert(1, Severity::Level2, t0(), None)).await.unwrap();
    store.insert_alert(&new_alert(1, Severity::Level2, end, None)).await.unwrap();
    store.insert_alert(&new_alert(1, Severity::Level3, end, None)).await.unwrap();
    store
        .insert_alert(&new_alert(1, Severity::Level2, t0() - Duration::seconds(1), None))
        .await
        .unwrap();

    let found = store
        .query_alerts(1, Severity::Level2, TimeRange::new(t0(), end))
        .await
        .unwrap();
    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|a| a.severity == Severity::Level2 && !a.acknowledged));
}

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

#[tokio::test]
async fn limits_absent_until_saved() {
    let store = MemoryStore::new();
    assert_eq!(store.get_limit_config().await.unwrap(), None);

    let updated = LimitConfig::default()
        .with_bound(Axis::X, SigmaTier::Sigma2, Bound::Upper, 2.5)
        .unwrap();
    store.save_limit_config(&updated).await.unwrap();
    assert_eq!(store.get_limit_config().await.unwrap(), Some(updated));
}

#[tokio::test]
async fn with_limits_seeds_active_config() {
    let store = MemoryStore::with_limits(LimitConfig::default());
    assert_eq!(
        store.get_limit_config().await.unwrap(),
        Some(LimitConfig::default())
    );
}
