//! Structured logging for DocVerify.
//!
//! Handles log redaction, console/NDJSON output, and validation audit events.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{ValidationEvent, ValidationEventLogger, ValidationLogEntry};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
