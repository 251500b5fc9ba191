//! Per-reading processing: classify → escalate → persist → notify.
//!
//! Persistence failures never fail [`ReadingProcessor::process`]; they are
//! logged and reported in [`ProcessedReading::persistence_failures`] so a
//! replay or ingestion loop can keep going while the store is down.

use std::sync::Arc;

use vibewatch_core::alert::NewAlert;
use vibewatch_core::classifier::classify;
use vibewatch_core::error::CoreError;
use vibewatch_core::escalation::{EscalationDecision, Escalator};
use vibewatch_core::limits::LimitConfig;
use vibewatch_core::predictor::{PredictorMode, SeverityPredictor};
use vibewatch_core::reading::{Axis, Reading};
use vibewatch_core::severity::Severity;
use vibewatch_core::store::{StoreError, VibrationStore};
use vibewatch_core::types::DbId;
use vibewatch_events::{event_types, EventBus, MonitorEvent};

/// Which write failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistTarget {
    Reading,
    Alert,
}

#[derive(Debug, Clone)]
pub struct PersistenceFailure {
    pub target: PersistTarget,
    pub error: StoreError,
}

/// Outcome of processing one reading.
#[derive(Debug, Clone)]
pub struct ProcessedReading {
    pub reading: Reading,
    /// `None` if the reading insert failed.
    pub reading_id: Option<DbId>,
    /// `None` for Normal readings or if the alert insert failed.
    pub alert_id: Option<DbId>,
    /// Final severity, after escalation.
    pub severity: Severity,
    /// Severity before escalation.
    pub raw_severity: Severity,
    pub triggering_axis: Option<Axis>,
    pub confidence: f64,
    pub escalation: EscalationDecision,
    pub magnitude: f64,
    /// Alert message, present whenever `severity` is not Normal.
    pub message: Option<String>,
    pub persistence_failures: Vec<PersistenceFailure>,
}

impl ProcessedReading {
    pub fn escalated(&self) -> bool {
        self.escalation.escalates()
    }
}

/// Runs the pipeline for individual readings against a shared store.
pub struct ReadingProcessor {
    store: Arc<dyn VibrationStore>,
    escalator: Escalator,
    predictor: Option<(Arc<dyn SeverityPredictor>, PredictorMode)>,
    events: Option<Arc<EventBus>>,
}

impl ReadingProcessor {
    pub fn new(store: Arc<dyn VibrationStore>, escalator: Escalator) -> Self {
        Self {
            store,
            escalator,
            predictor: None,
            events: None,
        }
    }

    /// Combine a model-backed predictor with the threshold classifier.
    pub fn with_predictor(mut self, predictor: Arc<dyn SeverityPredictor>, mode: PredictorMode) -> Self {
        self.predictor = Some((predictor, mode));
        self
    }

    /// Publish `alert.raised` events on `bus`.
    pub fn with_events(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn store(&self) -> &Arc<dyn VibrationStore> {
        &self.store
    }

    /// Process one reading against a limit snapshot.
    ///
    /// Fails only for readings with non-finite values.
    pub async fn process(
        &self,
        reading: &Reading,
        limits: Option<&LimitConfig>,
    ) -> Result<ProcessedReading, CoreError> {
        let classification = classify(reading, limits)?;
        let (raw_severity, confidence) = self.combine_with_predictor(reading, classification.severity);

        let escalation = if raw_severity == Severity::Level2 {
            match self
                .escalator
                .should_escalate(self.store.as_ref(), reading.sensor_id, reading.timestamp)
                .await
            {
                Ok(decision) => decision,
                Err(e) => {
                    tracing::warn!(
                        sensor_id = reading.sensor_id,
                        error = %e,
                        "Alert history unavailable, skipping escalation check"
                    );
                    EscalationDecision::None
                }
            }
        } else {
            EscalationDecision::None
        };

        let severity = if escalation.escalates() {
            tracing::info!(
                sensor_id = reading.sensor_id,
                decision = ?escalation,
                "Escalating Level 2 reading to Level 3"
            );
            Severity::Level3
        } else {
            raw_severity
        };

        let magnitude = reading.magnitude();
        let mut persistence_failures = Vec::new();

        let reading_id = match self.store.insert_reading(reading, severity).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(sensor_id = reading.sensor_id, error = %e, "Failed to store reading");
                persistence_failures.push(PersistenceFailure {
                    target: PersistTarget::Reading,
                    error: e,
                });
                None
            }
        };

        let mut alert_id = None;
        let mut message = None;
        if severity.is_alert() {
            let text = alert_message(severity, magnitude, escalation.escalates());
            let alert = NewAlert {
                sensor_id: reading.sensor_id,
                severity,
                timestamp: reading.timestamp,
                source_reading_id: reading_id,
                message: text.clone(),
            };
            match self.store.insert_alert(&alert).await {
                Ok(id) => {
                    tracing::info!(alert_id = id, sensor_id = reading.sensor_id, %severity, "Alert created");
                    alert_id = Some(id);
                }
                Err(e) => {
                    tracing::warn!(sensor_id = reading.sensor_id, error = %e, "Failed to store alert");
                    persistence_failures.push(PersistenceFailure {
                        target: PersistTarget::Alert,
                        error: e,
                    });
                }
            }
            self.publish_alert(&alert, alert_id, escalation.escalates());
            message = Some(text);
        }

        Ok(ProcessedReading {
            reading: reading.clone(),
            reading_id,
            alert_id,
            severity,
            raw_severity,
            triggering_axis: classification.triggering_axis,
            confidence,
            escalation,
            magnitude,
            message,
            persistence_failures,
        })
    }

    fn combine_with_predictor(&self, reading: &Reading, threshold: Severity) -> (Severity, f64) {
        let Some((predictor, mode)) = &self.predictor else {
            return (threshold, 1.0);
        };
        match predictor.predict(reading.accel_x, reading.accel_y, reading.accel_z) {
            Ok(prediction) => match mode {
                PredictorMode::Replace => (prediction.severity, prediction.confidence),
                PredictorMode::Augment if prediction.severity > threshold => {
                    (prediction.severity, prediction.confidence)
                }
                PredictorMode::Augment => (threshold, 1.0),
            },
            Err(e) => {
                tracing::warn!(
                    predictor = predictor.name(),
                    error = %e,
                    "Predictor failed, using threshold classification"
                );
                (threshold, 1.0)
            }
        }
    }

    fn publish_alert(&self, alert: &NewAlert, alert_id: Option<DbId>, escalated: bool) {
        let Some(bus) = &self.events else {
            return;
        };
        bus.publish(
            MonitorEvent::new(event_types::ALERT_RAISED)
                .with_sensor(alert.sensor_id)
                .with_payload(serde_json::json!({
                    "alert_id": alert_id,
                    "reading_id": alert.source_reading_id,
                    "severity": alert.severity.level(),
                    "escalated": escalated,
                    "message": alert.message,
                })),
        );
    }
}

fn alert_message(severity: Severity, magnitude: f64, escalated: bool) -> String {
    let mut message = format!("Vibration alert {} - magnitude {magnitude:.2}", severity.label());
    if escalated {
        message.push_str(" (escalated from Level 2 by repeated Level 2 alerts)");
    }
    message
}
