//! Log Redaction Layer
//!
//! Masks identity numbers and credentials in strings prior to logging.

use regex::Regex;
use std::sync::LazyLock;

static AADHAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}[ -]?\d{4}[ -]?(\d{4})\b").unwrap());
static PAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b[A-Z]{5}\d{4}[A-Z]\b").unwrap());
static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9\-_]{16,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)").unwrap()
});

/// Redacts sensitive patterns in a string.
///
/// Aadhaar numbers keep their last four digits so log lines stay traceable.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = API_KEY_RE.replace_all(input, "[REDACTED_TOKEN]");
    let redacted = AADHAR_RE.replace_all(&redacted, "XXXX XXXX $1");
    PAN_RE.replace_all(&redacted, "[REDACTED_PAN]").into_owned()
}
