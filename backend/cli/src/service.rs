//! Request orchestration: staging, extraction, reconciliation, persistence.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use docverify_core::{
    DocVerifyError, DocumentExtractor, DocumentRegistry, DocumentType, ExtractionOutcome, FieldId,
    FormInput, ReconciliationReport, Reconciler, Submission, SubmissionBuilder,
};
use docverify_logging::{ValidationEvent, ValidationEventLogger};
use docverify_store::SubmissionStore;

use crate::upload::{StagedUpload, UploadForm, UploadedFile};

/// Handles document checks and final submissions.
pub struct DocumentService {
    reconciler: Reconciler,
    extractor: Arc<dyn DocumentExtractor>,
    store: Arc<SubmissionStore>,
    upload_dir: PathBuf,
}

impl DocumentService {
    pub fn new(
        registry: Arc<DocumentRegistry>,
        extractor: Arc<dyn DocumentExtractor>,
        store: Arc<SubmissionStore>,
        upload_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            reconciler: Reconciler::new(registry),
            extractor,
            store,
            upload_dir: upload_dir.into(),
        }
    }

    pub fn extractor_name(&self) -> &str {
        self.extractor.name()
    }

    pub fn submission_count(&self) -> anyhow::Result<usize> {
        self.store.count()
    }

    /// Stage one upload, run extraction on it, and remove the staged copy.
    ///
    /// Returns the sanitised filename with the outcome.
    async fn extract_upload(
        &self,
        doc_type: DocumentType,
        upload: &UploadedFile,
    ) -> Result<(String, ExtractionOutcome), DocVerifyError> {
        let prompt = self.reconciler.registry().prompt_for(doc_type)?;
        let staged = StagedUpload::stage(&self.upload_dir, upload).await?;
        let outcome = self.extractor.extract(staged.path(), prompt).await;
        Ok((staged.filename.clone(), outcome))
    }

    /// Check one uploaded document against the form fields sent with it.
    pub async fn validate_document(
        &self,
        request_id: &str,
        form: &UploadForm,
    ) -> Result<ReconciliationReport, DocVerifyError> {
        let upload = form
            .file("file")
            .ok_or_else(|| DocVerifyError::InvalidInput("No file provided".into()))?;
        let doc_type = self
            .reconciler
            .registry()
            .resolve(form.field("type").unwrap_or_default())?;
        if upload.filename.is_empty() {
            return Err(DocVerifyError::InvalidInput("No file selected".into()));
        }

        let extracted = match self.extract_upload(doc_type, upload).await? {
            (_, ExtractionOutcome::Success(doc)) => doc,
            (filename, ExtractionOutcome::Failure(reason)) => {
                warn!(doc_type = %doc_type, filename = %filename, "Extraction returned no data");
                ValidationEventLogger::log_event(
                    request_id,
                    ValidationEvent::ExtractionFailed {
                        doc_type: doc_type.to_string(),
                        reason: reason.clone(),
                    },
                );
                return Err(DocVerifyError::ExtractionFailed {
                    doc_type: doc_type.to_string(),
                    reason,
                });
            }
        };

        let fields = self.reconciler.registry().fields_for(doc_type)?;
        let input = form_input(form, fields);
        let report = self.reconciler.reconcile(doc_type, &extracted, &input)?;

        ValidationEventLogger::log_event(
            request_id,
            ValidationEvent::DocumentValidated {
                doc_type: doc_type.to_string(),
                validated: report.validated_fields.len(),
                mismatched: report.mismatches.iter().map(|m| m.field.to_string()).collect(),
            },
        );
        Ok(report)
    }

    /// Extract every attached document, aggregate mismatches, and persist.
    pub async fn submit(
        &self,
        request_id: &str,
        form: &UploadForm,
    ) -> Result<Submission, DocVerifyError> {
        let input = form_input(form, &FieldId::ALL);
        let flagged = form
            .field("hasMismatches")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));
        let mut builder = SubmissionBuilder::new(&self.reconciler, input, flagged);

        for doc_type in DocumentType::ALL {
            let Some(upload) = form.file(doc_type.as_str()) else {
                continue;
            };
            if upload.filename.is_empty() {
                continue;
            }

            let (filename, outcome) = self.extract_upload(doc_type, upload).await?;
            let extracted = outcome.is_success();
            if let ExtractionOutcome::Failure(reason) = &outcome {
                ValidationEventLogger::log_event(
                    request_id,
                    ValidationEvent::ExtractionFailed {
                        doc_type: doc_type.to_string(),
                        reason: reason.clone(),
                    },
                );
            }
            let mismatched = builder.attach(doc_type, filename, outcome.into_document())?;
            info!(doc_type = %doc_type, extracted, mismatched, "Processed submission document");
        }

        let submission = builder.build();
        let store = Arc::clone(&self.store);
        let record = submission.clone();
        tokio::task::spawn_blocking(move || store.insert(&record))
            .await
            .map_err(|e| DocVerifyError::Persistence(e.to_string()))?
            .map_err(|e| DocVerifyError::Persistence(format!("{e:#}")))?;

        ValidationEventLogger::log_event(
            request_id,
            ValidationEvent::SubmissionStored {
                submission_id: submission.id.to_string(),
                documents: submission.documents.len(),
                has_mismatches: submission.has_mismatches,
            },
        );
        Ok(submission)
    }
}

/// Collect the listed fields from the request; fields not sent stay blank.
fn form_input(form: &UploadForm, fields: &[FieldId]) -> FormInput {
    FormInput::collect(fields, |field| form.field(field.as_str()).map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use docverify_core::ExtractedDocument;
    use docverify_understanding::FixtureExtractor;

    fn png(name: &str) -> UploadedFile {
        UploadedFile {
            filename: name.into(),
            bytes: Bytes::from_static(b"\x89PNG"),
        }
    }

    fn service(extractor: FixtureExtractor, dir: &std::path::Path) -> DocumentService {
        DocumentService::new(
            Arc::new(DocumentRegistry::builtin()),
            Arc::new(extractor),
            Arc::new(SubmissionStore::in_memory().unwrap()),
            dir.join("uploads"),
        )
    }

    fn aadhar_fixture() -> FixtureExtractor {
        let registry = DocumentRegistry::builtin();
        FixtureExtractor::new().with_response(
            registry.prompt_for(DocumentType::Aadhar).unwrap(),
            ExtractedDocument::new()
                .with("name", "John Doe")
                .with("dob", "15/05/1990")
                .with("gender", "Male")
                .with("aadhar", "1234 5678 9012"),
        )
    }

    #[tokio::test]
    async fn aadhar_end_to_end_has_no_mismatches() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(aadhar_fixture(), dir.path());
        let form = UploadForm::default()
            .with_field("type", "aadhar")
            .with_field("name", "John Doe")
            .with_field("dob", "1990-05-15")
            .with_field("gender", "Male")
            .with_field("aadhar", "123456789012")
            .with_file("file", png("aadhar.png"));

        let report = service.validate_document("t1", &form).await.unwrap();
        assert!(report.mismatches.is_empty());
        assert_eq!(
            report.validated_fields,
            vec![FieldId::Name, FieldId::Dob, FieldId::Gender, FieldId::Aadhar]
        );
        let staged: Vec<_> = std::fs::read_dir(dir.path().join("uploads")).unwrap().collect();
        assert!(staged.is_empty());
    }

    #[tokio::test]
    async fn field_left_out_of_request_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(aadhar_fixture(), dir.path());
        let form = UploadForm::default()
            .with_field("type", "aadhar")
            .with_field("name", "John Doe")
            .with_file("file", png("aadhar.png"));

        let report = service.validate_document("t2", &form).await.unwrap();
        let flagged: Vec<FieldId> = report.mismatches.iter().map(|m| m.field).collect();
        assert_eq!(flagged, vec![FieldId::Dob, FieldId::Gender, FieldId::Aadhar]);
    }

    #[tokio::test]
    async fn rejects_bad_requests_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(aadhar_fixture(), dir.path());

        let err = service
            .validate_document("t3", &UploadForm::default().with_field("type", "aadhar"))
            .await
            .unwrap_err();
        assert!(matches!(err, DocVerifyError::InvalidInput(m) if m == "No file provided"));

        let form = UploadForm::default().with_field("type", "passport").with_file("file", png(""));
        let err = service.validate_document("t3", &form).await.unwrap_err();
        assert!(matches!(err, DocVerifyError::UnknownDocumentType(_)));

        let form = UploadForm::default().with_field("type", "pan").with_file("file", png(""));
        let err = service.validate_document("t3", &form).await.unwrap_err();
        assert!(matches!(err, DocVerifyError::InvalidInput(m) if m == "No file selected"));
    }

    #[tokio::test]
    async fn extraction_failure_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(FixtureExtractor::new(), dir.path());
        let form = UploadForm::default()
            .with_field("type", "pan")
            .with_file("file", png("pan.png"));

        let err = service.validate_document("t4", &form).await.unwrap_err();
        assert!(matches!(
            err,
            DocVerifyError::ExtractionFailed { ref doc_type, .. } if doc_type == "pan"
        ));
        let staged: Vec<_> = std::fs::read_dir(dir.path().join("uploads")).unwrap().collect();
        assert!(staged.is_empty());
    }

    #[tokio::test]
    async fn submit_ors_flags_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let registry = DocumentRegistry::builtin();
        let extractor = FixtureExtractor::new()
            .with_response(
                registry.prompt_for(DocumentType::Pan).unwrap(),
                ExtractedDocument::new().with("name", "John Doe").with("pan", "ZZZZZ9999Z"),
            )
            .with_response(
                registry.prompt_for(DocumentType::Marksheet).unwrap(),
                ExtractedDocument::new().with("cgpa", "8.75").with("sgpa", "9.0"),
            );
        let service = service(extractor, dir.path());
        let form = UploadForm::default()
            .with_field("name", "John Doe")
            .with_field("pan", "ABCDE1234F")
            .with_field("cgpa", "8.75")
            .with_field("sgpa", "9")
            .with_file("pan", png("pan.png"))
            .with_file("marksheet", png("marks.png"))
            .with_file("aadhar", png(""));

        let submission = service.submit("t5", &form).await.unwrap();
        assert!(submission.has_mismatches);
        assert_eq!(submission.documents.len(), 2);
        assert!(!submission.documents.contains_key(&DocumentType::Aadhar));
        assert_eq!(service.submission_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn submit_keeps_failed_extraction_as_null() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(FixtureExtractor::new(), dir.path());
        let form = UploadForm::default()
            .with_field("hasMismatches", "TRUE")
            .with_file("aadhar", png("card.png"));

        let submission = service.submit("t6", &form).await.unwrap();
        assert!(submission.has_mismatches);
        let record = &submission.documents[&DocumentType::Aadhar];
        assert_eq!(record.filename, "card.png");
        assert!(record.data.is_none());
    }

    #[tokio::test]
    async fn submit_without_documents_uses_client_flag() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(FixtureExtractor::new(), dir.path());
        let form = UploadForm::default().with_field("name", "John Doe");

        let submission = service.submit("t7", &form).await.unwrap();
        assert!(!submission.has_mismatches);
        assert!(submission.documents.is_empty());
        assert_eq!(submission.form.value(FieldId::Name), Some("John Doe"));
        assert!(submission.form.contains(FieldId::Sgpa));
    }
}
