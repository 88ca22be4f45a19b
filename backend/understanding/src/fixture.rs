use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use docverify_core::{
    DocumentExtractor, DocumentRegistry, DocumentType, ExtractedDocument, ExtractionOutcome,
};

/// An extractor that answers from a fixed table keyed by prompt.
///
/// Used for offline runs and tests; never touches a model.
#[derive(Debug, Default)]
pub struct FixtureExtractor {
    responses: HashMap<String, ExtractedDocument>,
}

impl FixtureExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, prompt: impl Into<String>, doc: ExtractedDocument) -> Self {
        self.responses.insert(prompt.into(), doc);
        self
    }

    /// Sample data for each registered document type.
    pub fn sample(registry: &DocumentRegistry) -> Self {
        DocumentType::ALL
            .into_iter()
            .filter_map(|doc_type| {
                let prompt = registry.prompt_for(doc_type).ok()?;
                Some((prompt.to_string(), sample_document(doc_type)))
            })
            .fold(Self::new(), |fixture, (prompt, doc)| fixture.with_response(prompt, doc))
    }
}

fn sample_document(doc_type: DocumentType) -> ExtractedDocument {
    match doc_type {
        DocumentType::Aadhar => ExtractedDocument::new()
            .with("name", "John Doe")
            .with("dob", "1990-05-15")
            .with("gender", "Male")
            .with("aadhar", "1234 5678 9012"),
        DocumentType::Pan => ExtractedDocument::new()
            .with("name", "John Doe")
            .with("pan", "ABCDE1234F"),
        DocumentType::Marksheet => ExtractedDocument::new()
            .with("semester", "VI")
            .with("rollNumber", "CS2023001")
            .with("cgpa", "8.75")
            .with("sgpa", "9.0"),
    }
}

#[async_trait]
impl DocumentExtractor for FixtureExtractor {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn extract(&self, image_path: &Path, prompt: &str) -> ExtractionOutcome {
        if !image_path.exists() {
            return ExtractionOutcome::Failure(format!("{} does not exist", image_path.display()));
        }
        debug!(path = %image_path.display(), "Answering from fixture table");
        match self.responses.get(prompt) {
            Some(doc) => ExtractionOutcome::Success(doc.clone()),
            None => ExtractionOutcome::Failure("no fixture for prompt".to_string()),
        }
    }
}
