//! Structured logging for the archiver.
//!
//! Handles secret redaction, console plus rolling NDJSON output, and
//! structured archive events.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{ArchiveEvent, EventLogEntry, EventLogger};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
