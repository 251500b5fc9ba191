//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! Shared via `Arc<EventBus>` between the reading pipeline, the replay
//! manager and any listeners.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use vibewatch_core::types::DbId;

/// Dot-separated event names published on the bus.
pub mod event_types {
    /// A reading produced an alert. Payload carries `severity`, `alert_id`,
    /// `reading_id`, `escalated` and `message`.
    pub const ALERT_RAISED: &str = "alert.raised";
    pub const REPLAY_STARTED: &str = "replay.started";
    pub const REPLAY_COMPLETED: &str = "replay.completed";
    pub const REPLAY_STOPPED: &str = "replay.stopped";
    pub const REPLAY_FAILED: &str = "replay.failed";
}

// ---------------------------------------------------------------------------
// MonitorEvent
// ---------------------------------------------------------------------------

/// Something that happened in the monitoring pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorEvent {
    /// One of the names in [`event_types`].
    pub event_type: String,

    /// Sensor the event concerns, if any.
    pub sensor_id: Option<DbId>,

    /// Event-specific data.
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl MonitorEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            sensor_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_sensor(mut self, sensor_id: DbId) -> Self {
        self.sensor_id = Some(sensor_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// When the buffer is full the oldest un-consumed events are dropped and slow
/// receivers observe `RecvError::Lagged`.
pub struct EventBus {
    sender: broadcast::Sender<MonitorEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. Dropped silently if there are none.
    pub fn publish(&self, event: MonitorEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            MonitorEvent::new(event_types::ALERT_RAISED)
                .with_sensor(4)
                .with_payload(serde_json::json!({"severity": 2})),
        );

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, "alert.raised");
        assert_eq!(received.sensor_id, Some(4));
        assert_eq!(received.payload["severity"], 2);
    }

    #[tokio::test]
    async fn every_subscriber_sees_the_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(MonitorEvent::new(event_types::REPLAY_STARTED));

        assert_eq!(rx1.recv().await.unwrap().event_type, "replay.started");
        assert_eq!(rx2.recv().await.unwrap().event_type, "replay.started");
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        EventBus::default().publish(MonitorEvent::new(event_types::REPLAY_STOPPED));
    }

    #[test]
    fn bare_event_has_empty_payload() {
        let event = MonitorEvent::new("x");
        assert!(event.sensor_id.is_none());
        assert!(event.payload.is_object());
    }
}
