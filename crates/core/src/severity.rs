//! Severity tiers for vibration readings and alerts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Ordinal severity of a reading's deviation from its statistical bounds.
///
/// Ordering follows the integer level, so `max` and comparisons behave as
/// expected. Serialized as the bare integer (`0..=3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i16", try_from = "i16")]
#[repr(i16)]
pub enum Severity {
    #[default]
    Normal = 0,
    Level1 = 1,
    Level2 = 2,
    Level3 = 3,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Normal,
        Severity::Level1,
        Severity::Level2,
        Severity::Level3,
    ];

    /// Integer level as stored in the database.
    pub fn level(self) -> i16 {
        self as i16
    }

    pub fn from_level(level: i16) -> Result<Self, CoreError> {
        match level {
            0 => Ok(Severity::Normal),
            1 => Ok(Severity::Level1),
            2 => Ok(Severity::Level2),
            3 => Ok(Severity::Level3),
            other => Err(CoreError::Validation(format!(
                "severity must be between 0 and 3, got {other}"
            ))),
        }
    }

    /// Whether a reading at this severity produces an alert.
    pub fn is_alert(self) -> bool {
        self > Severity::Normal
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Normal => "Normal",
            Severity::Level1 => "Level 1",
            Severity::Level2 => "Level 2",
            Severity::Level3 => "Level 3 (Critical)",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<Severity> for i16 {
    fn from(value: Severity) -> Self {
        value.level()
    }
}

impl TryFrom<i16> for Severity {
    type Error = CoreError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Severity::from_level(value)
    }
}
