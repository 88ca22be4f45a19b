//! Validation Event Logger
//!
//! Audit events for document checks and submissions, emitted through
//! `tracing` under the `validation_events` target.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ValidationEvent {
    DocumentValidated {
        doc_type: String,
        validated: usize,
        mismatched: Vec<String>,
    },
    ExtractionFailed {
        doc_type: String,
        reason: String,
    },
    SubmissionStored {
        submission_id: String,
        documents: usize,
        has_mismatches: bool,
    },
}

#[derive(Debug, Serialize)]
pub struct ValidationLogEntry {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: ValidationEvent,
}

impl ValidationLogEntry {
    /// Build an entry, redacting free text in the event.
    pub fn new(request_id: &str, mut event: ValidationEvent) -> Self {
        if let ValidationEvent::ExtractionFailed { reason, .. } = &mut event {
            *reason = redact_sensitive_data(reason);
        }
        Self {
            request_id: request_id.into(),
            timestamp: Utc::now(),
            event,
        }
    }
}

pub struct ValidationEventLogger;

impl ValidationEventLogger {
    /// Log one audit event.
    pub fn log_event(request_id: &str, event: ValidationEvent) {
        let entry = ValidationLogEntry::new(request_id, event);
        let payload = serde_json::to_string(&entry).unwrap_or_default();
        info!(target: "validation_events", event = %payload, "Validation audit event");
    }
}
