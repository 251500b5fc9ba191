//! Replay lifecycle management.
//!
//! [`ReplayManager`] runs at most one replay at a time. Control operations
//! (`start`, `stop`) serialize on a single mutex and own the phase
//! transitions into and out of `Stopping`; the spawned worker is the only
//! writer of counters and buffers. Status is published through a
//! [`StatusCell`], so readers never block the worker.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use vibewatch_core::limits::LimitConfig;
use vibewatch_events::{event_types, EventBus, MonitorEvent};
use vibewatch_pipeline::ReadingProcessor;

use crate::config::ReplayConfig;
use crate::error::ReplayError;
use crate::source::{RecordSource, SourceRow};
use crate::status::{ReplayOutcome, ReplayPhase, SimulationStatus, StatusCell};

/// Returned by [`ReplayManager::start`].
#[derive(Debug, Clone, Serialize)]
pub struct ReplayStarted {
    pub run_id: Uuid,
    pub source_name: String,
    pub total_records: usize,
    pub interval_seconds: f64,
}

/// Returned by [`ReplayManager::stop`].
#[derive(Debug, Clone, Serialize)]
pub struct StopSummary {
    pub run_id: Uuid,
    pub processed: usize,
    pub total: usize,
    pub progress_pct: f64,
    /// The worker did not exit within the stop timeout and was aborted.
    pub timed_out: bool,
}

/// Bookkeeping for the replay currently owned by the manager.
struct ActiveReplay {
    run_id: Uuid,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct ReplayManager {
    processor: Arc<ReadingProcessor>,
    events: Option<Arc<EventBus>>,
    status: Arc<StatusCell>,
    control: Mutex<Option<ActiveReplay>>,
    stop_timeout: Duration,
    capacities: (usize, usize),
}

impl ReplayManager {
    pub fn new(processor: Arc<ReadingProcessor>, config: &ReplayConfig) -> Self {
        Self {
            processor,
            events: None,
            status: Arc::new(StatusCell::default()),
            control: Mutex::new(None),
            stop_timeout: config.stop_timeout,
            capacities: (config.recent_readings, config.recent_alerts),
        }
    }

    /// Publish replay lifecycle events on `bus`.
    pub fn with_events(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    /// Deep copy of the current status.
    pub fn status(&self) -> SimulationStatus {
        self.status.snapshot()
    }

    /// Receive every status change.
    pub fn subscribe(&self) -> watch::Receiver<SimulationStatus> {
        self.status.subscribe()
    }

    /// Start replaying `source`, pausing `interval` between records.
    ///
    /// The source is validated before the control lock is taken, so a
    /// rejected source changes nothing: a replay that is already running
    /// keeps running. Otherwise the running replay is stopped first.
    pub async fn start(
        &self,
        mut source: Box<dyn RecordSource>,
        interval: Duration,
    ) -> Result<ReplayStarted, ReplayError> {
        if let Err(e) = source.validate().await {
            tracing::warn!(source = source.name(), error = %e, "Replay source rejected");
            return Err(e);
        }

        let mut control = self.control.lock().await;

        if let Some(active) = control.take() {
            if self.is_current_running(active.run_id) {
                tracing::info!(run_id = %active.run_id, "Replay already running, stopping it first");
                self.stop_active(active).await;
            }
        }

        let run_id = Uuid::now_v7();
        let source_name = source.name().to_string();
        let total_records = source.total_records();
        self.status.reset(SimulationStatus::starting(
            run_id,
            source_name.clone(),
            total_records,
            interval,
            self.capacities,
        ));

        let cancel = CancellationToken::new();
        let worker = ReplayWorker {
            run_id,
            source,
            interval,
            processor: Arc::clone(&self.processor),
            status: Arc::clone(&self.status),
            events: self.events.clone(),
            cancel: cancel.clone(),
            limits: None,
            consumed: 0,
            total: total_records,
        };
        let handle = tokio::spawn(worker.run());
        *control = Some(ActiveReplay {
            run_id,
            cancel,
            handle,
        });

        tracing::info!(
            run_id = %run_id,
            source = %source_name,
            total_records,
            interval_secs = interval.as_secs_f64(),
            "Replay started"
        );
        self.publish(
            event_types::REPLAY_STARTED,
            serde_json::json!({
                "run_id": run_id,
                "source": source_name,
                "total_records": total_records,
            }),
        );

        Ok(ReplayStarted {
            run_id,
            source_name,
            total_records,
            interval_seconds: interval.as_secs_f64(),
        })
    }

    /// Stop the running replay, waiting at most the configured stop timeout.
    pub async fn stop(&self) -> Result<StopSummary, ReplayError> {
        let mut control = self.control.lock().await;
        match control.take() {
            Some(active) if self.is_current_running(active.run_id) => Ok(self.stop_active(active).await),
            // Finished on its own; nothing to stop.
            Some(_) | None => Err(ReplayError::NotRunning),
        }
    }

    fn is_current_running(&self, run_id: Uuid) -> bool {
        let status = self.status.snapshot();
        status.run_id == Some(run_id) && status.is_running()
    }

    /// Cancel, wait (bounded), then force Idle. Caller holds the control lock.
    async fn stop_active(&self, mut active: ActiveReplay) -> StopSummary {
        let run_id = active.run_id;
        active.cancel.cancel();
        self.status.update_run(run_id, |s| {
            if s.phase == ReplayPhase::Running {
                s.phase = ReplayPhase::Stopping;
            }
        });

        let timed_out = match tokio::time::timeout(self.stop_timeout, &mut active.handle).await {
            Ok(Ok(())) => false,
            Ok(Err(e)) => {
                tracing::error!(run_id = %run_id, error = %e, "Replay worker terminated abnormally");
                false
            }
            Err(_) => {
                tracing::warn!(
                    run_id = %run_id,
                    timeout_secs = self.stop_timeout.as_secs_f64(),
                    "Replay worker did not stop in time, aborting it"
                );
                active.handle.abort();
                true
            }
        };

        self.status.update_run(run_id, |s| s.finish(ReplayOutcome::Stopped));
        let status = self.status.snapshot();
        let summary = StopSummary {
            run_id,
            processed: status.processed_count,
            total: status.total_count,
            progress_pct: status.progress_pct,
            timed_out,
        };

        tracing::info!(
            run_id = %run_id,
            processed = summary.processed,
            total = summary.total,
            timed_out,
            "Replay stopped"
        );
        self.publish(
            event_types::REPLAY_STOPPED,
            serde_json::json!({
                "run_id": run_id,
                "processed": summary.processed,
                "total": summary.total,
                "timed_out": timed_out,
            }),
        );
        summary
    }

    fn publish(&self, event_type: &str, payload: serde_json::Value) {
        if let Some(bus) = &self.events {
            bus.publish(MonitorEvent::new(event_type).with_payload(payload));
        }
    }
}

impl Drop for ReplayManager {
    /// Cancel the running worker so it does not outlive its manager.
    fn drop(&mut self) {
        if let Some(active) = self.control.get_mut().take() {
            if !active.handle.is_finished() {
                tracing::debug!(run_id = %active.run_id, "Replay manager dropped, cancelling worker");
            }
            active.cancel.cancel();
        }
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// State owned by the spawned replay task.
struct ReplayWorker {
    run_id: Uuid,
    source: Box<dyn RecordSource>,
    interval: Duration,
    processor: Arc<ReadingProcessor>,
    status: Arc<StatusCell>,
    events: Option<Arc<EventBus>>,
    cancel: CancellationToken,
    /// Last limit snapshot read from the store.
    limits: Option<LimitConfig>,
    consumed: usize,
    total: usize,
}

impl ReplayWorker {
    async fn run(mut self) {
        loop {
            let next = tokio::select! {
                _ = self.cancel.cancelled() => return,
                next = self.source.next_record() => next,
            };

            match next {
                Ok(Some(row)) => self.handle_row(row).await,
                Ok(None) => {
                    self.finish(ReplayOutcome::Completed, None);
                    return;
                }
                Err(e) => {
                    tracing::error!(run_id = %self.run_id, error = %e, "Replay source failed");
                    self.finish(ReplayOutcome::Failed, Some(e.to_string()));
                    return;
                }
            }

            if self.consumed >= self.total {
                continue;
            }
            if !self.pace().await {
                return;
            }
        }
    }

    async fn handle_row(&mut self, row: SourceRow) {
        self.consumed += 1;
        let reading = match row.reading {
            Ok(reading) => reading,
            Err(e) => {
                self.skip(row.row, e.to_string());
                return;
            }
        };

        self.refresh_limits().await;
        match self.processor.process(&reading, self.limits.as_ref()).await {
            Ok(processed) => {
                tracing::debug!(
                    run_id = %self.run_id,
                    row = row.row,
                    sensor_id = reading.sensor_id,
                    severity = %processed.severity,
                    "Replayed record"
                );
                self.status
                    .update_run(self.run_id, |s| s.record_processed(row.row, &processed));
            }
            Err(e) => self.skip(row.row, e.to_string()),
        }
    }

    fn skip(&self, row: usize, error: String) {
        tracing::warn!(run_id = %self.run_id, row, error = %error, "Skipping unreadable record");
        self.status.update_run(self.run_id, |s| s.record_skipped(error));
    }

    /// Fetch the active limits; on failure keep the previous snapshot.
    async fn refresh_limits(&mut self) {
        match self.processor.store().get_limit_config().await {
            Ok(limits) => self.limits = limits,
            Err(e) => {
                tracing::warn!(run_id = %self.run_id, error = %e, "Could not refresh limits, using last snapshot");
            }
        }
    }

    /// Sleep for the pacing interval. Returns `false` if cancelled.
    async fn pace(&mut self) -> bool {
        if self.interval.is_zero() {
            tokio::task::yield_now().await;
            return !self.cancel.is_cancelled();
        }

        let eta = chrono::Duration::from_std(self.interval)
            .ok()
            .map(|d| chrono::Utc::now() + d);
        self.status.update_run(self.run_id, |s| s.next_tick_eta = eta);

        let resumed = tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(self.interval) => true,
        };
        if resumed {
            self.status.update_run(self.run_id, |s| s.next_tick_eta = None);
        }
        resumed
    }

    fn finish(&self, outcome: ReplayOutcome, error: Option<String>) {
        let applied = self.status.update_run(self.run_id, |s| {
            if error.is_some() {
                s.last_error = error.clone();
            }
            s.finish(outcome);
        });
        if !applied {
            return;
        }

        let status = self.status.snapshot();
        tracing::info!(
            run_id = %self.run_id,
            ?outcome,
            processed = status.processed_count,
            skipped = status.skipped_count,
            alerts = status.alerts.total,
            "Replay finished"
        );

        let event_type = match outcome {
            ReplayOutcome::Failed => event_types::REPLAY_FAILED,
            ReplayOutcome::Completed | ReplayOutcome::Stopped => event_types::REPLAY_COMPLETED,
        };
        if let Some(bus) = &self.events {
            bus.publish(MonitorEvent::new(event_type).with_payload(serde_json::json!({
                "run_id": self.run_id,
                "processed": status.processed_count,
                "skipped": status.skipped_count,
                "alerts": status.alerts.total,
                "error": error,
            })));
        }
    }
}
