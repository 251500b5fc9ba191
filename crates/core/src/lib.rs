//! Vibewatch domain logic.
//!
//! Everything in this crate is pure or talks to storage only through the
//! [`store::VibrationStore`] trait, so it can be tested without a database.

pub mod alert;
pub mod classifier;
pub mod error;
pub mod escalation;
pub mod limits;
pub mod predictor;
pub mod reading;
pub mod sampling;
pub mod severity;
pub mod store;
pub mod types;
