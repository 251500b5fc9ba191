//! Series loading and limit updates against the in-memory store.

use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use vibewatch_core::error::CoreError;
use vibewatch_core::limits::{Bound, LimitConfig, SigmaTier};
use vibewatch_core::reading::{Axis, Reading};
use vibewatch_core::sampling::SampleMethod;
use vibewatch_core::severity::Severity;
use vibewatch_core::store::VibrationStore;
use vibewatch_core::types::{TimeRange, Timestamp};
use vibewatch_db::MemoryStore;
use vibewatch_pipeline::history::load_series;
use vibewatch_pipeline::limits::{active_limits, reset_limits, update_limit, LimitChange};
use vibewatch_pipeline::PipelineError;

fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
}

async fn seeded(points: i64) -> MemoryStore {
    let store = MemoryStore::new();
    for i in 0..points {
        let spike = i == 137;
        let y = if spike { 14.0 } else { 9.8 };
        let severity = if spike { Severity::Level3 } else { Severity::Normal };
        let reading = Reading::new(1, t0() + Duration::seconds(i), 0.0, y, 0.0);
        store.insert_reading(&reading, severity).await.unwrap();
    }
    store
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[tokio::test]
async fn adaptive_series_keeps_spike_and_order() {
    let store = seeded(500).await;
    let range = TimeRange::new(t0(), t0() + Duration::hours(1));

    let series = load_series(&store, 1, range, SampleMethod::Adaptive, 50).await.unwrap();

    assert_eq!(series.len(), 50);
    assert!(series.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    assert!(series.iter().any(|r| r.severity == Severity::Level3));
}

#[tokio::test]
async fn unsampled_series_is_complete() {
    let store = seeded(120).await;
    let range = TimeRange::new(t0(), t0() + Duration::hours(1));

    let series = load_series(&store, 1, range, SampleMethod::None, 10).await.unwrap();
    assert_eq!(series.len(), 120);

    let other_sensor = load_series(&store, 2, range, SampleMethod::Uniform, 10).await.unwrap();
    assert!(other_sensor.is_empty());
}

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_starts_from_defaults_and_saves() {
    let store = MemoryStore::new();
    let change = LimitChange::parse("x", "sigma2", "upper", 2.5).unwrap();

    let updated = update_limit(&store, change).await.unwrap();

    assert_eq!(updated.axis(Axis::X).sigma2.upper, 2.5);
    assert_eq!(store.get_limit_config().await.unwrap(), Some(updated));
}

#[tokio::test]
async fn invalid_update_saves_nothing() {
    let store = MemoryStore::with_limits(LimitConfig::default());
    // sigma2 upper may not reach the sigma3 upper bound.
    let change = LimitChange {
        axis: Axis::Y,
        tier: SigmaTier::Sigma2,
        bound: Bound::Upper,
        value: 20.0,
    };

    let err = update_limit(&store, change).await.unwrap_err();
    assert_matches!(err, PipelineError::Core(CoreError::Validation(_)));
    assert_eq!(active_limits(&store).await.unwrap(), LimitConfig::default());
}

#[tokio::test]
async fn reset_restores_factory_defaults() {
    let store = MemoryStore::new();
    update_limit(&store, LimitChange::parse("z", "sigma3", "lower", -4.0).unwrap())
        .await
        .unwrap();

    reset_limits(&store).await.unwrap();
    assert_eq!(store.get_limit_config().await.unwrap(), Some(LimitConfig::default()));
}
