//! Field comparison rules.
//!
//! Every rule returns a plain `bool`. Missing, empty, or unparsable values
//! are never a match, so the user always sees the discrepancy.

use crate::types::{CompareStrategy, FieldId};

/// Largest difference at which two numeric scores count as equal.
const SCORE_TOLERANCE: f64 = 0.01;

/// Decide whether a form value and a document value agree for `field`.
pub fn compare(field: FieldId, form_value: Option<&str>, doc_value: Option<&str>) -> bool {
    let (Some(form), Some(doc)) = (form_value, doc_value) else {
        return false;
    };
    if form.is_empty() || doc.is_empty() {
        return false;
    }

    match field.strategy() {
        CompareStrategy::Numeric => scores_match(form, doc),
        CompareStrategy::Date => dates_match(form, doc),
        CompareStrategy::SpacelessIdentifier => strip_whitespace(form) == strip_whitespace(doc),
        CompareStrategy::Text => form.trim().to_lowercase() == doc.trim().to_lowercase(),
    }
}

fn scores_match(form: &str, doc: &str) -> bool {
    match (form.trim().parse::<f64>(), doc.trim().parse::<f64>()) {
        (Ok(a), Ok(b)) => (a - b).abs() < SCORE_TOLERANCE,
        _ => false,
    }
}

fn dates_match(form: &str, doc: &str) -> bool {
    let form_date = form.split('T').next().unwrap_or(form);
    let Some(doc_date) = normalize_doc_date(doc) else {
        return false;
    };
    form_date.to_lowercase() == doc_date.to_lowercase()
}

/// Reorder `DD/MM/YYYY` into `YYYY-MM-DD`. Values without a slash pass
/// through; slashed values without exactly three parts cannot match.
fn normalize_doc_date(doc: &str) -> Option<String> {
    if !doc.contains('/') {
        return Some(doc.to_string());
    }
    let parts: Vec<&str> = doc.split('/').collect();
    match parts.as_slice() {
        [day, month, year] => Some(format!("{year}-{month}-{day}")),
        _ => None,
    }
}

fn strip_whitespace(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}
