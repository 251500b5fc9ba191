//! Replay status snapshots and the cell that publishes them.

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;
use uuid::Uuid;
use vibewatch_core::severity::Severity;
use vibewatch_core::types::{DbId, Timestamp};
use vibewatch_pipeline::ProcessedReading;

use crate::ring::{RingBuffer, DEFAULT_RECENT_ALERTS, DEFAULT_RECENT_READINGS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayPhase {
    #[default]
    Idle,
    Running,
    Stopping,
}

/// How the last replay ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayOutcome {
    /// The source was exhausted.
    Completed,
    /// `stop()` was called.
    Stopped,
    /// The source could not be read.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentReading {
    pub row: usize,
    pub reading_id: Option<DbId>,
    pub sensor_id: DbId,
    pub timestamp: Timestamp,
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,
    pub magnitude: f64,
    pub severity: Severity,
    pub escalated: bool,
}

impl RecentReading {
    pub fn from_processed(row: usize, processed: &ProcessedReading) -> Self {
        Self {
            row,
            reading_id: processed.reading_id,
            sensor_id: processed.reading.sensor_id,
            timestamp: processed.reading.timestamp,
            accel_x: processed.reading.accel_x,
            accel_y: processed.reading.accel_y,
            accel_z: processed.reading.accel_z,
            magnitude: processed.magnitude,
            severity: processed.severity,
            escalated: processed.escalated(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentAlert {
    pub alert_id: Option<DbId>,
    pub sensor_id: DbId,
    pub severity: Severity,
    pub message: String,
    pub timestamp: Timestamp,
    pub acknowledged: bool,
}

/// Alerts raised during the current replay, by level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertCounters {
    pub level1: u64,
    pub level2: u64,
    pub level3: u64,
    pub total: u64,
}

impl AlertCounters {
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Normal => return,
            Severity::Level1 => self.level1 += 1,
            Severity::Level2 => self.level2 += 1,
            Severity::Level3 => self.level3 += 1,
        }
        self.total += 1;
    }
}

/// Everything a client needs to render replay progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationStatus {
    /// `None` before the first replay.
    pub run_id: Option<Uuid>,
    pub phase: ReplayPhase,
    pub source_name: Option<String>,
    /// Records consumed, including skipped ones.
    pub processed_count: usize,
    /// Records that could not be turned into readings.
    pub skipped_count: usize,
    pub total_count: usize,
    pub progress_pct: f64,
    pub pacing_interval_seconds: f64,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub next_tick_eta: Option<Timestamp>,
    pub last_record: Option<RecentReading>,
    pub recent_readings: RingBuffer<RecentReading>,
    pub recent_alerts: RingBuffer<RecentAlert>,
    pub alerts: AlertCounters,
    pub persistence_failures: usize,
    pub last_error: Option<String>,
    pub outcome: Option<ReplayOutcome>,
}

impl Default for SimulationStatus {
    fn default() -> Self {
        Self {
            run_id: None,
            phase: ReplayPhase::Idle,
            source_name: None,
            processed_count: 0,
            skipped_count: 0,
            total_count: 0,
            progress_pct: 0.0,
            pacing_interval_seconds: 0.0,
            started_at: None,
            finished_at: None,
            next_tick_eta: None,
            last_record: None,
            recent_readings: RingBuffer::new(DEFAULT_RECENT_READINGS),
            recent_alerts: RingBuffer::new(DEFAULT_RECENT_ALERTS),
            alerts: AlertCounters::default(),
            persistence_failures: 0,
            last_error: None,
            outcome: None,
        }
    }
}

impl SimulationStatus {
    /// Fresh status for a replay that is about to start.
    pub fn starting(
        run_id: Uuid,
        source_name: String,
        total_count: usize,
        interval: Duration,
        capacities: (usize, usize),
    ) -> Self {
        Self {
            run_id: Some(run_id),
            phase: ReplayPhase::Running,
            source_name: Some(source_name),
            total_count,
            pacing_interval_seconds: interval.as_secs_f64(),
            started_at: Some(Utc::now()),
            recent_readings: RingBuffer::new(capacities.0),
            recent_alerts: RingBuffer::new(capacities.1),
            ..Self::default()
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase != ReplayPhase::Idle
    }

    /// Count one consumed record and refresh `progress_pct`.
    pub fn advance(&mut self) {
        self.processed_count += 1;
        self.progress_pct = progress_pct(self.processed_count, self.total_count);
    }

    /// Record a successfully processed reading.
    pub fn record_processed(&mut self, row: usize, processed: &ProcessedReading) {
        let recent = RecentReading::from_processed(row, processed);
        self.recent_readings.push(recent.clone());
        self.last_record = Some(recent);
        self.persistence_failures += processed.persistence_failures.len();

        if let Some(message) = &processed.message {
            self.alerts.record(processed.severity);
            self.recent_alerts.push(RecentAlert {
                alert_id: processed.alert_id,
                sensor_id: processed.reading.sensor_id,
                severity: processed.severity,
                message: message.clone(),
                timestamp: processed.reading.timestamp,
                acknowledged: false,
            });
        }
        self.advance();
    }

    /// Record a row that was skipped.
    pub fn record_skipped(&mut self, error: String) {
        self.skipped_count += 1;
        self.last_error = Some(error);
        self.advance();
    }

    /// Move to Idle with `outcome`, keeping an outcome that was already set.
    pub fn finish(&mut self, outcome: ReplayOutcome) {
        self.phase = ReplayPhase::Idle;
        self.outcome.get_or_insert(outcome);
        self.finished_at.get_or_insert_with(Utc::now);
        self.next_tick_eta = None;
        if self.outcome == Some(ReplayOutcome::Completed) {
            self.progress_pct = 100.0;
        }
    }
}

fn progress_pct(processed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (processed as f64 / total as f64 * 100.0).min(100.0)
}

// ---------------------------------------------------------------------------
// StatusCell
// ---------------------------------------------------------------------------

/// Single-writer-per-run status publisher.
///
/// Writes through [`update_run`](Self::update_run) only land if the given
/// run id is still the current one, so a worker that outlived its replay
/// cannot overwrite the status of the next one.
#[derive(Debug)]
pub struct StatusCell {
    tx: watch::Sender<SimulationStatus>,
}

impl Default for StatusCell {
    fn default() -> Self {
        let (tx, _) = watch::channel(SimulationStatus::default());
        Self { tx }
    }
}

impl StatusCell {
    /// Deep copy of the current status.
    pub fn snapshot(&self) -> SimulationStatus {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SimulationStatus> {
        self.tx.subscribe()
    }

    /// Start a new run, discarding the previous status.
    pub fn reset(&self, status: SimulationStatus) {
        self.tx.send_replace(status);
    }

    /// Apply `f` if `run_id` is current. Returns whether it was applied.
    pub fn update_run(&self, run_id: Uuid, f: impl FnOnce(&mut SimulationStatus)) -> bool {
        self.tx.send_if_modified(|status| {
            if status.run_id != Some(run_id) {
                return false;
            }
            f(status);
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running() -> (StatusCell, Uuid) {
        let cell = StatusCell::default();
        let run_id = Uuid::now_v7();
        cell.reset(SimulationStatus::starting(
            run_id,
            "test.csv".into(),
            4,
            Duration::from_secs(1),
            (50, 20),
        ));
        (cell, run_id)
    }

    #[test]
    fn stale_run_writes_are_dropped() {
        let (cell, run_id) = running();
        assert!(cell.update_run(run_id, |s| s.advance()));

        let stale = Uuid::now_v7();
        assert!(!cell.update_run(stale, |s| s.advance()));
        assert_eq!(cell.snapshot().processed_count, 1);
    }

    #[test]
    fn progress_tracks_processed_and_skipped() {
        let (cell, run_id) = running();
        cell.update_run(run_id, |s| s.record_skipped("row 1: bad".into()));
        cell.update_run(run_id, |s| s.advance());

        let status = cell.snapshot();
        assert_eq!(status.processed_count, 2);
        assert_eq!(status.skipped_count, 1);
        assert_eq!(status.progress_pct, 50.0);
        assert_eq!(status.last_error.as_deref(), Some("row 1: bad"));
    }

    #[test]
    fn finish_keeps_first_outcome() {
        let (cell, run_id) = running();
        cell.update_run(run_id, |s| s.finish(ReplayOutcome::Failed));
        cell.update_run(run_id, |s| s.finish(ReplayOutcome::Stopped));

        let status = cell.snapshot();
        assert_eq!(status.phase, ReplayPhase::Idle);
        assert_eq!(status.outcome, Some(ReplayOutcome::Failed));
        assert!(status.finished_at.is_some());
    }

    #[test]
    fn subscribers_see_updates() {
        let (cell, run_id) = running();
        let mut rx = cell.subscribe();
        rx.mark_unchanged();
        cell.update_run(run_id, |s| s.advance());
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().processed_count, 1);
    }

    #[test]
    fn counters_ignore_normal() {
        let mut counters = AlertCounters::default();
        for s in [Severity::Normal, Severity::Level1, Severity::Level3, Severity::Level3] {
            counters.record(s);
        }
        assert_eq!((counters.level1, counters.level3, counters.total), (1, 2, 3));
    }
}
