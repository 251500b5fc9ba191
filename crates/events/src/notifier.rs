//! Alert notification logger.
//!
//! Listens for `alert.raised` events and reports each with the priority
//! derived from its severity. Delivery channels (mail, push) are not part of
//! this crate; the log line is the notification.

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use vibewatch_core::alert::AlertPriority;
use vibewatch_core::severity::Severity;

use crate::bus::{event_types, MonitorEvent};

/// Run until `cancel` fires or the bus is dropped. Returns how many alerts
/// were reported.
pub async fn run_alert_logger(
    mut receiver: broadcast::Receiver<MonitorEvent>,
    cancel: CancellationToken,
) -> usize {
    let mut reported = 0;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(reported, "Alert logger stopping");
                break;
            }
            received = receiver.recv() => match received {
                Ok(event) if event.event_type == event_types::ALERT_RAISED => {
                    if report(&event) {
                        reported += 1;
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Alert logger lagged, some alerts were not reported");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!(reported, "Event bus closed, alert logger shutting down");
                    break;
                }
            }
        }
    }
    reported
}

fn report(event: &MonitorEvent) -> bool {
    let severity = event
        .payload
        .get("severity")
        .and_then(|v| v.as_i64())
        .and_then(|level| i16::try_from(level).ok())
        .and_then(|level| Severity::from_level(level).ok());

    let Some(priority) = severity.and_then(AlertPriority::for_severity) else {
        tracing::warn!(payload = %event.payload, "alert.raised event without a usable severity");
        return false;
    };

    let message = event
        .payload
        .get("message")
        .and_then(|v| v.as_str())
        .unwrap_or_default();

    match priority {
        AlertPriority::High => tracing::warn!(
            sensor_id = ?event.sensor_id,
            priority = priority.as_str(),
            detail = message,
            "Vibration alert"
        ),
        AlertPriority::Medium | AlertPriority::Low => tracing::info!(
            sensor_id = ?event.sensor_id,
            priority = priority.as_str(),
            detail = message,
            "Vibration alert"
        ),
    }
    true
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::bus::EventBus;

    fn alert(severity: i64) -> MonitorEvent {
        MonitorEvent::new(event_types::ALERT_RAISED)
            .with_sensor(1)
            .with_payload(serde_json::json!({"severity": severity, "message": "test"}))
    }

    #[tokio::test]
    async fn counts_alerts_and_ignores_other_events() {
        let bus = EventBus::default();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_alert_logger(bus.subscribe(), cancel.clone()));

        bus.publish(alert(1));
        bus.publish(MonitorEvent::new(event_types::REPLAY_STARTED));
        bus.publish(alert(3));
        bus.publish(alert(0));
        drop(bus);

        let reported = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("logger should exit when the bus closes")
            .unwrap();
        assert_eq!(reported, 2);
    }

    #[tokio::test]
    async fn stops_on_cancel() {
        let bus = EventBus::default();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_alert_logger(bus.subscribe(), cancel.clone()));

        cancel.cancel();
        let reported = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("logger should exit on cancel")
            .unwrap();
        assert_eq!(reported, 0);
    }
}
