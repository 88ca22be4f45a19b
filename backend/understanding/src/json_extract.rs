//! Pull a JSON object out of free-form model output.
//!
//! Vision models wrap their answer in prose or code fences; the object is
//! taken to span from the first `{` to the last `}`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use docverify_core::ExtractedDocument;

static JSON_OBJECT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON object found in model response")]
    NoJsonObject,

    #[error("model response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Locate the outermost `{...}` span in `text`.
pub fn locate_json_object(text: &str) -> Option<&str> {
    JSON_OBJECT_RE.find(text).map(|m| m.as_str())
}

/// Parse a model response into extracted document fields.
pub fn parse_extracted(text: &str) -> Result<ExtractedDocument, ParseError> {
    let candidate = locate_json_object(text).ok_or(ParseError::NoJsonObject)?;
    // The span starts with `{`, so anything that parses is an object.
    let map: Map<String, Value> = serde_json::from_str(candidate)?;
    Ok(ExtractedDocument::from(map))
}
