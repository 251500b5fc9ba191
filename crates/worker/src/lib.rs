//! Replay driver.
//!
//! Feeds recorded readings through the reading pipeline at a controlled
//! pace, one replay at a time, and exposes live progress through
//! [`status::SimulationStatus`] snapshots.

pub mod config;
pub mod error;
pub mod manager;
pub mod ring;
pub mod source;
pub mod status;

pub use config::ReplayConfig;
pub use error::{ReplayError, SourceError};
pub use manager::{ReplayManager, ReplayStarted, StopSummary};
pub use source::{CsvSource, MemorySource, RecordSource, SourceRow};
pub use status::{ReplayOutcome, ReplayPhase, SimulationStatus};
