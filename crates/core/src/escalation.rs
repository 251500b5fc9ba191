//! Temporal pattern escalation of Level 2 readings to Level 3.
//!
//! A single Level 2 reading is an isolated anomaly; repeated Level 2 alerts
//! for the same sensor indicate sustained abnormal behaviour. Two rules are
//! evaluated and combined with OR:
//!
//! - **short window**: at least `short_threshold` Level 2 alerts in the
//!   trailing `short_window`.
//! - **long window**: at least `long_threshold` Level 2 alerts in the trailing
//!   `long_window`, and no Level 3 alert for the sensor in that same window.

use chrono::Duration;
use serde::Serialize;

use crate::severity::Severity;
use crate::store::{AlertHistory, StoreError};
use crate::types::{DbId, TimeRange, Timestamp};

pub const DEFAULT_SHORT_WINDOW_MINS: i64 = 15;
pub const DEFAULT_SHORT_THRESHOLD: usize = 3;
pub const DEFAULT_LONG_WINDOW_HOURS: i64 = 24;
pub const DEFAULT_LONG_THRESHOLD: usize = 5;

/// Window lengths and count thresholds for both rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationPolicy {
    pub short_window: Duration,
    pub short_threshold: usize,
    pub long_window: Duration,
    pub long_threshold: usize,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            short_window: Duration::minutes(DEFAULT_SHORT_WINDOW_MINS),
            short_threshold: DEFAULT_SHORT_THRESHOLD,
            long_window: Duration::hours(DEFAULT_LONG_WINDOW_HOURS),
            long_threshold: DEFAULT_LONG_THRESHOLD,
        }
    }
}

/// Outcome of an escalation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum EscalationDecision {
    None,
    ShortWindow { count: usize },
    LongWindow { count: usize },
}

impl EscalationDecision {
    pub fn escalates(self) -> bool {
        !matches!(self, EscalationDecision::None)
    }
}

impl EscalationPolicy {
    /// Apply both rules to pre-fetched alert timestamps.
    ///
    /// `level2` and `level3` may contain timestamps outside the windows; they
    /// are filtered here against `[as_of - window, as_of]`.
    pub fn decide(
        &self,
        as_of: Timestamp,
        level2: &[Timestamp],
        level3: &[Timestamp],
    ) -> EscalationDecision {
        let short = TimeRange::trailing(as_of, self.short_window);
        let short_count = level2.iter().filter(|ts| short.contains(**ts)).count();
        if short_count >= self.short_threshold {
            return EscalationDecision::ShortWindow { count: short_count };
        }

        let long = TimeRange::trailing(as_of, self.long_window);
        let long_count = level2.iter().filter(|ts| long.contains(**ts)).count();
        let has_level3 = level3.iter().any(|ts| long.contains(*ts));
        if long_count >= self.long_threshold && !has_level3 {
            return EscalationDecision::LongWindow { count: long_count };
        }

        EscalationDecision::None
    }

    fn lookback(&self) -> Duration {
        self.short_window.max(self.long_window)
    }
}

/// Stateless escalator that reads alert history through [`AlertHistory`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Escalator {
    policy: EscalationPolicy,
}

impl Escalator {
    pub fn new(policy: EscalationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &EscalationPolicy {
        &self.policy
    }

    /// Decide whether a Level 2 reading for `sensor_id` at `as_of` should be
    /// stored as Level 3.
    ///
    /// Only call this for readings whose raw classification is exactly Level 2.
    pub async fn should_escalate<H: AlertHistory + ?Sized>(
        &self,
        history: &H,
        sensor_id: DbId,
        as_of: Timestamp,
    ) -> Result<EscalationDecision, StoreError> {
        let level2: Vec<Timestamp> = history
            .query_alerts(
                sensor_id,
                Severity::Level2,
                TimeRange::trailing(as_of, self.policy.lookback()),
            )
            .await?
            .into_iter()
            .map(|a| a.timestamp)
            .collect();

        // The Level 3 lookup only matters for the long-window rule.
        let long = TimeRange::trailing(as_of, self.policy.long_window);
        let long_count = level2.iter().filter(|ts| long.contains(**ts)).count();
        let level3: Vec<Timestamp> = if long_count >= self.policy.long_threshold {
            history
                .query_alerts(sensor_id, Severity::Level3, long)
                .await?
                .into_iter()
                .map(|a| a.timestamp)
                .collect()
        } else {
            Vec::new()
        };

        Ok(self.policy.decide(as_of, &level2, &level3))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
