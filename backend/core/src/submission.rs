use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DocVerifyError;
use crate::reconcile::Reconciler;
use crate::types::{DocumentType, ExtractedDocument, FormInput};

/// An uploaded document as stored on a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub filename: String,
    /// `None` when extraction produced nothing.
    pub data: Option<ExtractedDocument>,
}

/// The persisted record of one form submission. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Uuid,
    pub form: FormInput,
    pub has_mismatches: bool,
    pub documents: BTreeMap<DocumentType, DocumentRecord>,
    pub submission_date: DateTime<Utc>,
}

/// Accumulates documents for a submission, OR-ing their mismatch flags.
///
/// Once any document mismatches the flag stays set.
#[derive(Debug)]
pub struct SubmissionBuilder<'a> {
    reconciler: &'a Reconciler,
    form: FormInput,
    has_mismatches: bool,
    documents: BTreeMap<DocumentType, DocumentRecord>,
}

impl<'a> SubmissionBuilder<'a> {
    /// `flagged` carries mismatches the client already saw while validating.
    pub fn new(reconciler: &'a Reconciler, form: FormInput, flagged: bool) -> Self {
        Self {
            reconciler,
            form,
            has_mismatches: flagged,
            documents: BTreeMap::new(),
        }
    }

    /// Record a processed document and fold its mismatches into the flag.
    ///
    /// A document without extracted data is stored but contributes nothing.
    pub fn attach(
        &mut self,
        doc_type: DocumentType,
        filename: impl Into<String>,
        data: Option<ExtractedDocument>,
    ) -> Result<bool, DocVerifyError> {
        let mismatched = match &data {
            Some(extracted) => self
                .reconciler
                .reconcile(doc_type, extracted, &self.form)?
                .has_mismatches(),
            None => false,
        };
        self.has_mismatches |= mismatched;
        self.documents.insert(
            doc_type,
            DocumentRecord {
                filename: filename.into(),
                data,
            },
        );
        Ok(mismatched)
    }

    pub fn has_mismatches(&self) -> bool {
        self.has_mismatches
    }

    pub fn build(self) -> Submission {
        Submission {
            id: Uuid::new_v4(),
            form: self.form,
            has_mismatches: self.has_mismatches,
            documents: self.documents,
            submission_date: Utc::now(),
        }
    }
}
