use std::path::Path;

use async_trait::async_trait;

use crate::types::ExtractedDocument;

/// Result of asking the extraction capability to read a document.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    Success(ExtractedDocument),
    /// No usable data; the reason is for logs, not for the user.
    Failure(String),
}

impl ExtractionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExtractionOutcome::Success(_))
    }

    pub fn into_document(self) -> Option<ExtractedDocument> {
        match self {
            ExtractionOutcome::Success(doc) => Some(doc),
            ExtractionOutcome::Failure(_) => None,
        }
    }
}

/// Reads structured fields off a document image.
///
/// Implementations never fail with an error: anything that goes wrong is
/// reported as [`ExtractionOutcome::Failure`].
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Extractor name (e.g., "ollama", "fixture").
    fn name(&self) -> &str;

    /// Extract fields from the image at `image_path` as instructed by `prompt`.
    async fn extract(&self, image_path: &Path, prompt: &str) -> ExtractionOutcome;
}
