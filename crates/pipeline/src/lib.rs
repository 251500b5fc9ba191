//! Reading pipeline shared by replay and live ingestion.
//!
//! - [`ingest::ReadingProcessor`]: classify, escalate, persist and notify
//!   one reading.
//! - [`history::load_series`]: stored readings for charting, downsampled.
//! - [`limits::update_limit`]: single-bound edits of the active limits.

pub mod error;
pub mod history;
pub mod ingest;
pub mod limits;

pub use error::PipelineError;
pub use ingest::{PersistenceFailure, ProcessedReading, ReadingProcessor};
