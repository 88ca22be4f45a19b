use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::compare::compare;
use crate::error::DocVerifyError;
use crate::registry::DocumentRegistry;
use crate::types::{
    DocumentType, ExtractedDocument, FormInput, MismatchRecord, ReconciliationReport,
};

/// Compares extracted document data against form input, field by field.
#[derive(Debug, Clone)]
pub struct Reconciler {
    registry: Arc<DocumentRegistry>,
}

impl Reconciler {
    pub fn new(registry: Arc<DocumentRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    /// Partition the type's fields into validated and mismatched.
    ///
    /// Fields follow the registry's order. A field missing from either side
    /// is left out of both lists.
    pub fn reconcile(
        &self,
        doc_type: DocumentType,
        extracted: &ExtractedDocument,
        form: &FormInput,
    ) -> Result<ReconciliationReport, DocVerifyError> {
        let fields = self.registry.fields_for(doc_type)?;

        let mut mismatches = Vec::new();
        let mut validated_fields = Vec::new();

        for &field in fields {
            if !extracted.contains(field) || !form.contains(field) {
                debug!(doc_type = %doc_type, field = %field, "Field not on both sides, skipping");
                continue;
            }

            let doc_text = extracted.text(field);
            if compare(field, form.value(field), doc_text.as_deref()) {
                validated_fields.push(field);
            } else {
                mismatches.push(MismatchRecord {
                    field,
                    form_value: form.value(field).map(str::to_string),
                    doc_value: extracted.get(field).cloned().unwrap_or(Value::Null),
                });
            }
        }

        debug!(
            doc_type = %doc_type,
            validated = validated_fields.len(),
            mismatched = mismatches.len(),
            "Reconciled document"
        );

        Ok(ReconciliationReport {
            mismatches,
            validated_fields,
            doc_data: extracted.clone(),
        })
    }
}
