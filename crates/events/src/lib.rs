//! Vibewatch event bus and alert notification.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`MonitorEvent`]: the event envelope for alerts and replay lifecycle.
//! - [`notifier::run_alert_logger`]: background task that reports raised
//!   alerts with their notification priority.

pub mod bus;
pub mod notifier;

pub use bus::{event_types, EventBus, MonitorEvent};
