//! Structured logging for tagscan.
//!
//! Handles log redaction, the rolling JSON log file, and scan event logging.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{ScanEvent, ScanEventEntry, ScanEventLogger};
pub use logger::{LOG_FILE_PREFIX, init_logger};
pub use redact::redact_sensitive_data;
