//! Archive Event Logger
//!
//! Structured archive events (batch received, item saved, item failed, batch
//! completed) emitted through `tracing` so they land in the NDJSON log.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArchiveEvent {
    BatchReceived {
        group: String,
        messages: usize,
        media_items: usize,
    },
    ItemSaved {
        message_id: i32,
        file: String,
        size: String,
    },
    ItemFailed {
        message_id: i32,
        reason: String,
    },
    BatchCompleted {
        group: String,
        saved: usize,
        failed: usize,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub chat_id: i64,
    pub timestamp: DateTime<Utc>,
    pub event: ArchiveEvent,
}

impl EventLogEntry {
    pub fn new(chat_id: i64, mut event: ArchiveEvent) -> Self {
        if let ArchiveEvent::ItemFailed { reason, .. } = &mut event {
            *reason = redact_sensitive_data(reason);
        }
        Self {
            chat_id,
            timestamp: Utc::now(),
            event,
        }
    }
}

pub struct EventLogger;

impl EventLogger {
    /// Emit an archive event, redacting free-form error text first.
    pub fn log_event(chat_id: i64, event: ArchiveEvent) {
        let entry = EventLogEntry::new(chat_id, event);
        let payload = serde_json::to_string(&entry).unwrap_or_default();
        info!(target: "archive_events", chat_id, event = %payload, "Archive event");
    }
}
