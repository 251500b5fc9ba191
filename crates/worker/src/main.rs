//! `vibewatch-replay` -- replays a recorded CSV through the reading pipeline.
//!
//! Readings are classified, escalated and persisted exactly as live
//! ingestion would, paced by `REPLAY_INTERVAL_SECS`. Without `DATABASE_URL`
//! everything runs against an in-memory store seeded with the factory limits.
//! See [`ReplayConfig::from_env`] for the full variable list.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vibewatch_core::escalation::Escalator;
use vibewatch_core::limits::LimitConfig;
use vibewatch_core::store::VibrationStore;
use vibewatch_db::{MemoryStore, PgVibrationStore};
use vibewatch_events::notifier::run_alert_logger;
use vibewatch_events::EventBus;
use vibewatch_pipeline::ReadingProcessor;
use vibewatch_worker::{CsvSource, ReplayConfig, ReplayManager, ReplayPhase};

/// How often progress is logged while a replay runs.
const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vibewatch_worker=info,vibewatch_pipeline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ReplayConfig::from_env();
    let source_path = config.source.clone().unwrap_or_else(|| {
        tracing::error!("REPLAY_SOURCE environment variable is required");
        std::process::exit(1);
    });

    let store = open_store(&config).await;

    let bus = Arc::new(EventBus::default());
    let logger_cancel = CancellationToken::new();
    let logger = tokio::spawn(run_alert_logger(bus.subscribe(), logger_cancel.clone()));

    let processor = Arc::new(
        ReadingProcessor::new(store, Escalator::new(config.escalation)).with_events(Arc::clone(&bus)),
    );
    let manager = ReplayManager::new(processor, &config).with_events(Arc::clone(&bus));

    let started = manager
        .start(Box::new(CsvSource::new(&source_path)), config.interval)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(source = %source_path.display(), error = %e, "Failed to start replay");
            std::process::exit(1);
        });
    tracing::info!(
        run_id = %started.run_id,
        total = started.total_records,
        interval_secs = started.interval_seconds,
        "Replaying {}",
        started.source_name
    );

    let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("Interrupt received, stopping replay");
                if let Err(e) = manager.stop().await {
                    tracing::debug!(error = %e, "Nothing to stop");
                }
                break;
            }
            _ = ticker.tick() => {
                let status = manager.status();
                if status.phase == ReplayPhase::Idle {
                    break;
                }
                tracing::info!(
                    processed = status.processed_count,
                    total = status.total_count,
                    progress_pct = status.progress_pct,
                    alerts = status.alerts.total,
                    "Replay progress"
                );
            }
        }
    }

    let status = manager.status();
    tracing::info!(
        outcome = ?status.outcome,
        processed = status.processed_count,
        skipped = status.skipped_count,
        level1 = status.alerts.level1,
        level2 = status.alerts.level2,
        level3 = status.alerts.level3,
        persistence_failures = status.persistence_failures,
        last_error = status.last_error.as_deref().unwrap_or("-"),
        "Replay finished"
    );

    logger_cancel.cancel();
    if let Ok(reported) = logger.await {
        tracing::debug!(reported, "Alert logger exited");
    }
}

/// Postgres when `DATABASE_URL` is set, otherwise an in-memory store. Exits
/// the process if the database cannot be prepared.
async fn open_store(config: &ReplayConfig) -> Arc<dyn VibrationStore> {
    let Some(url) = config.database_url.as_deref() else {
        tracing::info!("DATABASE_URL not set, using in-memory store");
        return Arc::new(MemoryStore::with_limits(LimitConfig::default()));
    };

    let pool = vibewatch_db::create_pool(url).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to connect to database");
        std::process::exit(1);
    });
    if let Err(e) = vibewatch_db::health_check(&pool).await {
        tracing::error!(error = %e, "Database health check failed");
        std::process::exit(1);
    }
    if let Err(e) = vibewatch_db::run_migrations(&pool).await {
        tracing::error!(error = %e, "Failed to run migrations");
        std::process::exit(1);
    }
    tracing::info!("Database connected and migrations applied");

    let store = PgVibrationStore::new(pool);
    match store.get_limit_config().await {
        Ok(Some(_)) => {}
        Ok(None) => {
            if let Err(e) = store.save_limit_config(&LimitConfig::default()).await {
                tracing::warn!(error = %e, "Could not seed default limits");
            } else {
                tracing::info!("Seeded default limit configuration");
            }
        }
        Err(e) => tracing::warn!(error = %e, "Could not read limit configuration"),
    }
    Arc::new(store)
}
