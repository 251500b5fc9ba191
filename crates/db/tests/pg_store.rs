//! PostgreSQL store tests.
//!
//! These need a running database (`DATABASE_URL`); run them with
//! `cargo test -p vibewatch-db -- --ignored`.

use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use sqlx::PgPool;
use vibewatch_core::alert::NewAlert;
use vibewatch_core::limits::{Bound, LimitConfig, SigmaTier};
use vibewatch_core::reading::{Axis, Reading};
use vibewatch_core::severity::Severity;
use vibewatch_core::store::{AlertHistory, StoreError, VibrationStore};
use vibewatch_core::types::TimeRange;
use vibewatch_db::repositories::AlertRepo;
use vibewatch_db::PgVibrationStore;

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn bootstrap_and_health_check(pool: PgPool) {
    vibewatch_db::health_check(&pool).await.unwrap();
    for table in ["vibration_readings", "alerts", "limit_configs"] {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert_eq!(count.0, 0, "{table} should start empty");
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_alert_maps_to_conflict(pool: PgPool) {
    let store = PgVibrationStore::new(pool);
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
    let reading = Reading::new(7, at, 0.0, 13.0, 0.0);
    let reading_id = store.insert_reading(&reading, Severity::Level2).await.unwrap();

    let alert = NewAlert {
        sensor_id: 7,
        severity: Severity::Level2,
        timestamp: at,
        source_reading_id: Some(reading_id),
        message: "Level 2".into(),
    };
    let alert_id = store.insert_alert(&alert).await.unwrap();
    assert_matches!(store.insert_alert(&alert).await, Err(StoreError::Conflict(_)));

    let found = store
        .query_alerts(7, Severity::Level2, TimeRange::trailing(at, Duration::minutes(15)))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert!(!found[0].acknowledged);

    assert!(AlertRepo::acknowledge(store.pool(), alert_id).await.unwrap());
    let found = store
        .query_alerts(7, Severity::Level2, TimeRange::trailing(at, Duration::minutes(15)))
        .await
        .unwrap();
    assert!(found[0].acknowledged);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn newest_limit_config_is_active(pool: PgPool) {
    let store = PgVibrationStore::new(pool);
    assert_eq!(store.get_limit_config().await.unwrap(), None);

    store.save_limit_config(&LimitConfig::default()).await.unwrap();
    let updated = LimitConfig::default()
        .with_bound(Axis::Z, SigmaTier::Sigma3, Bound::Lower, -3.5)
        .unwrap();
    store.save_limit_config(&updated).await.unwrap();

    assert_eq!(store.get_limit_config().await.unwrap(), Some(updated));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn readings_round_trip_in_order(pool: PgPool) {
    let store = PgVibrationStore::new(pool);
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
    for (offset, severity) in [(20, Severity::Level1), (0, Severity::Normal), (10, Severity::Level3)] {
        let reading = Reading::new(3, at + Duration::seconds(offset), 0.1, 9.8, 0.1);
        store.insert_reading(&reading, severity).await.unwrap();
    }

    let series = store
        .query_readings(3, TimeRange::new(at, at + Duration::seconds(20)))
        .await
        .unwrap();
    let severities: Vec<Severity> = series.iter().map(|r| r.severity).collect();
    assert_eq!(severities, vec![Severity::Normal, Severity::Level3, Severity::Level1]);
}
