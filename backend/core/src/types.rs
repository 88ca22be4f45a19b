use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DocVerifyError;

/// The fixed document categories a user can upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Aadhar,
    Pan,
    Marksheet,
}

impl DocumentType {
    /// All document types, in the order a submission processes them.
    pub const ALL: [DocumentType; 3] = [
        DocumentType::Aadhar,
        DocumentType::Pan,
        DocumentType::Marksheet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Aadhar => "aadhar",
            DocumentType::Pan => "pan",
            DocumentType::Marksheet => "marksheet",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = DocVerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aadhar" => Ok(DocumentType::Aadhar),
            "pan" => Ok(DocumentType::Pan),
            "marksheet" => Ok(DocumentType::Marksheet),
            other => Err(DocVerifyError::UnknownDocumentType(other.to_string())),
        }
    }
}

/// A named datum expected both from the user and from the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldId {
    Name,
    Dob,
    Gender,
    Aadhar,
    Pan,
    Semester,
    RollNumber,
    Cgpa,
    Sgpa,
}

/// How two raw values of a field are normalized before comparing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareStrategy {
    /// Parsed as floats, equal within 0.01.
    Numeric,
    /// Form date with optional `T...` time part vs. `DD/MM/YYYY` or ISO date.
    Date,
    /// All whitespace removed, case-insensitive.
    SpacelessIdentifier,
    /// Ends trimmed, case-insensitive.
    Text,
}

impl FieldId {
    /// Every field of the submission form, in form order.
    pub const ALL: [FieldId; 9] = [
        FieldId::Name,
        FieldId::Dob,
        FieldId::Gender,
        FieldId::Aadhar,
        FieldId::Pan,
        FieldId::Semester,
        FieldId::RollNumber,
        FieldId::Cgpa,
        FieldId::Sgpa,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldId::Name => "name",
            FieldId::Dob => "dob",
            FieldId::Gender => "gender",
            FieldId::Aadhar => "aadhar",
            FieldId::Pan => "pan",
            FieldId::Semester => "semester",
            FieldId::RollNumber => "rollNumber",
            FieldId::Cgpa => "cgpa",
            FieldId::Sgpa => "sgpa",
        }
    }

    pub fn strategy(&self) -> CompareStrategy {
        match self {
            FieldId::Cgpa | FieldId::Sgpa => CompareStrategy::Numeric,
            FieldId::Dob => CompareStrategy::Date,
            // PAN and roll numbers deliberately keep the plain text rule.
            FieldId::Aadhar => CompareStrategy::SpacelessIdentifier,
            _ => CompareStrategy::Text,
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldId {
    type Err = DocVerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldId::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| DocVerifyError::InvalidInput(format!("unknown field: {s}")))
    }
}

/// Key/value data read off a document by the extraction capability.
///
/// Keys are whatever the model returned; only keys naming a [`FieldId`] of
/// the document type take part in reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedDocument(BTreeMap<String, Value>);

impl ExtractedDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn contains(&self, field: FieldId) -> bool {
        self.0.contains_key(field.as_str())
    }

    pub fn get(&self, field: FieldId) -> Option<&Value> {
        self.0.get(field.as_str())
    }

    /// The field's value as comparable text.
    ///
    /// `null`, `false`, zero and empty arrays or objects render as absent.
    pub fn text(&self, field: FieldId) -> Option<String> {
        self.get(field).and_then(render_value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<serde_json::Map<String, Value>> for ExtractedDocument {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self(map.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ExtractedDocument {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Array(items) if items.is_empty() => None,
        Value::Object(map) if map.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Values the user typed into the form.
///
/// A key can be present with no value: the field was part of the request but
/// left blank. Reconciliation only skips fields whose key is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormInput(BTreeMap<FieldId, Option<String>>);

impl FormInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an input holding every listed field, looking each value up.
    pub fn collect<F>(fields: &[FieldId], mut lookup: F) -> Self
    where
        F: FnMut(FieldId) -> Option<String>,
    {
        Self(fields.iter().map(|&field| (field, lookup(field))).collect())
    }

    pub fn set(&mut self, field: FieldId, value: Option<String>) {
        self.0.insert(field, value);
    }

    pub fn with(mut self, field: FieldId, value: impl Into<String>) -> Self {
        self.set(field, Some(value.into()));
        self
    }

    pub fn contains(&self, field: FieldId) -> bool {
        self.0.contains_key(&field)
    }

    pub fn value(&self, field: FieldId) -> Option<&str> {
        self.0.get(&field).and_then(|v| v.as_deref())
    }
}

/// A field whose form and document values disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MismatchRecord {
    pub field: FieldId,
    pub form_value: Option<String>,
    pub doc_value: Value,
}

/// Outcome of reconciling one document against the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub mismatches: Vec<MismatchRecord>,
    pub validated_fields: Vec<FieldId>,
    pub doc_data: ExtractedDocument,
}

impl ReconciliationReport {
    pub fn has_mismatches(&self) -> bool {
        !self.mismatches.is_empty()
    }
}
