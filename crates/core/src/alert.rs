//! Vibration alert types.

use serde::{Deserialize, Serialize};

use crate::severity::Severity;
use crate::types::{DbId, Timestamp};

/// A persisted alert raised by a non-normal reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: DbId,
    pub sensor_id: DbId,
    /// Always Level 1..=3.
    pub severity: Severity,
    pub timestamp: Timestamp,
    /// The reading that raised this alert, if it was persisted.
    pub source_reading_id: Option<DbId>,
    pub message: String,
    pub acknowledged: bool,
}

/// An alert about to be inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlert {
    pub sensor_id: DbId,
    pub severity: Severity,
    pub timestamp: Timestamp,
    pub source_reading_id: Option<DbId>,
    pub message: String,
}

impl NewAlert {
    pub fn into_alert(self, id: DbId) -> Alert {
        Alert {
            id,
            sensor_id: self.sensor_id,
            severity: self.severity,
            timestamp: self.timestamp,
            source_reading_id: self.source_reading_id,
            message: self.message,
            acknowledged: false,
        }
    }
}

/// Notification priority derived from alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    Low,
    Medium,
    High,
}

impl AlertPriority {
    /// `None` for Normal, which never produces an alert.
    pub fn for_severity(severity: Severity) -> Option<Self> {
        match severity {
            Severity::Normal => None,
            Severity::Level1 => Some(AlertPriority::Low),
            Severity::Level2 => Some(AlertPriority::Medium),
            Severity::Level3 => Some(AlertPriority::High),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AlertPriority::Low => "low",
            AlertPriority::Medium => "medium",
            AlertPriority::High => "high",
        }
    }
}
