use std::path::PathBuf;
use std::time::Duration;

use vibewatch_core::escalation::EscalationPolicy;

use crate::ring::{DEFAULT_RECENT_ALERTS, DEFAULT_RECENT_READINGS};

pub const DEFAULT_INTERVAL_SECS: f64 = 5.0;
pub const DEFAULT_STOP_TIMEOUT_SECS: f64 = 5.0;
/// Longest accepted escalation window.
pub const MAX_ESCALATION_WINDOW_DAYS: i64 = 365;

fn max_window() -> chrono::Duration {
    chrono::Duration::days(MAX_ESCALATION_WINDOW_DAYS)
}

/// Replay configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// CSV file to replay. Required by the binary.
    pub source: Option<PathBuf>,
    /// Pause between records.
    pub interval: Duration,
    /// Upper bound on how long `stop()` waits for the worker.
    pub stop_timeout: Duration,
    pub recent_readings: usize,
    pub recent_alerts: usize,
    pub escalation: EscalationPolicy,
    /// PostgreSQL URL; `None` runs against the in-memory store.
    pub database_url: Option<String>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            source: None,
            interval: Duration::from_secs_f64(DEFAULT_INTERVAL_SECS),
            stop_timeout: Duration::from_secs_f64(DEFAULT_STOP_TIMEOUT_SECS),
            recent_readings: DEFAULT_RECENT_READINGS,
            recent_alerts: DEFAULT_RECENT_ALERTS,
            escalation: EscalationPolicy::default(),
            database_url: None,
        }
    }
}

impl ReplayConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// Unparsable values fall back to the default, as do zero thresholds and
    /// escalation windows longer than [`MAX_ESCALATION_WINDOW_DAYS`].
    ///
    /// | Env Var                        | Default |
    /// |--------------------------------|---------|
    /// | `REPLAY_SOURCE`                | --      |
    /// | `REPLAY_INTERVAL_SECS`         | `5`     |
    /// | `REPLAY_STOP_TIMEOUT_SECS`     | `5`     |
    /// | `REPLAY_RECENT_READINGS`       | `50`    |
    /// | `REPLAY_RECENT_ALERTS`         | `20`    |
    /// | `ESCALATION_SHORT_WINDOW_MINS` | `15`    |
    /// | `ESCALATION_SHORT_THRESHOLD`   | `3`     |
    /// | `ESCALATION_LONG_WINDOW_HOURS` | `24`    |
    /// | `ESCALATION_LONG_THRESHOLD`    | `5`     |
    /// | `DATABASE_URL`                 | --      |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<f64>().ok());
        let seconds = |key: &str, default: f64| {
            parsed(key)
                .and_then(|v| Duration::try_from_secs_f64(v).ok())
                .unwrap_or_else(|| Duration::from_secs_f64(default))
        };
        let count = |key: &str, default: usize| {
            lookup(key)
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(default)
        };
        let positive = |key: &str, default: usize| {
            lookup(key)
                .and_then(|v| v.trim().parse::<usize>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default)
        };
        let window = |key: &str, default: chrono::Duration, unit: fn(i64) -> Option<chrono::Duration>| {
            lookup(key)
                .and_then(|v| v.trim().parse::<i64>().ok())
                .filter(|v| *v > 0)
                .and_then(unit)
                .filter(|d| *d <= max_window())
                .unwrap_or(default)
        };
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let defaults = EscalationPolicy::default();
        let escalation = EscalationPolicy {
            short_window: window(
                "ESCALATION_SHORT_WINDOW_MINS",
                defaults.short_window,
                chrono::Duration::try_minutes,
            ),
            short_threshold: positive("ESCALATION_SHORT_THRESHOLD", defaults.short_threshold),
            long_window: window(
                "ESCALATION_LONG_WINDOW_HOURS",
                defaults.long_window,
                chrono::Duration::try_hours,
            ),
            long_threshold: positive("ESCALATION_LONG_THRESHOLD", defaults.long_threshold),
        };

        Self {
            source: non_empty("REPLAY_SOURCE").map(PathBuf::from),
            interval: seconds("REPLAY_INTERVAL_SECS", DEFAULT_INTERVAL_SECS),
            stop_timeout: seconds("REPLAY_STOP_TIMEOUT_SECS", DEFAULT_STOP_TIMEOUT_SECS),
            recent_readings: count("REPLAY_RECENT_READINGS", DEFAULT_RECENT_READINGS),
            recent_alerts: count("REPLAY_RECENT_ALERTS", DEFAULT_RECENT_ALERTS),
            escalation,
            database_url: non_empty("DATABASE_URL"),
        }
    }
}
