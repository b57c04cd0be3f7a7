//! Scan Event Logger
//!
//! One structured record per scanning milestone, emitted on the
//! `scan_events` target so the JSON log can be filtered into an audit trail.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::redact::redact_sensitive_data;

pub const SCAN_EVENTS_TARGET: &str = "scan_events";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanEvent {
    SessionStarted {
        date: String,
        truck_number: String,
    },
    TagsRecognized {
        tags: Vec<String>,
        session_total: usize,
    },
    CaptureFailed {
        error_msg: String,
    },
    SessionFinished {
        new_records: usize,
    },
    Exported {
        path: String,
        mime_type: String,
        records: usize,
    },
}

#[derive(Debug, Serialize)]
pub struct ScanEventEntry {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: ScanEvent,
}

pub struct ScanEventLogger;

impl ScanEventLogger {
    pub fn entry(session_id: Option<Uuid>, mut event: ScanEvent) -> ScanEventEntry {
        if let ScanEvent::CaptureFailed { error_msg } = &mut event {
            *error_msg = redact_sensitive_data(error_msg);
        }
        ScanEventEntry {
            session_id: session_id.map(|id| id.to_string()).unwrap_or_default(),
            timestamp: Utc::now(),
            event,
        }
    }

    /// Log a scan event. Exports happen outside a session, so the id is optional.
    pub fn log_event(session_id: Option<Uuid>, event: ScanEvent) {
        let entry = Self::entry(session_id, event);
        match serde_json::to_string(&entry) {
            Ok(json) => info!(target: SCAN_EVENTS_TARGET, event = %json, "Scan event"),
            Err(_) => info!(target: SCAN_EVENTS_TARGET, event = ?entry, "Scan event"),
        }
    }
}
