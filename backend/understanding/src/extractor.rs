use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tracing::{info, warn};

use docverify_core::{DocumentExtractor, ExtractedDocument, ExtractionOutcome};

use crate::json_extract::parse_extracted;
use crate::mime::{detect_mime_type, is_image};
use crate::vision::{VisionModel, VisionRequest};

/// Extracts document fields by asking a vision model for JSON.
pub struct VisionExtractor {
    model: Arc<dyn VisionModel>,
    max_tokens: u32,
    temperature: f32,
}

impl VisionExtractor {
    pub fn new(model: Arc<dyn VisionModel>) -> Self {
        Self {
            model,
            max_tokens: 500,
            temperature: 0.0,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    async fn try_extract(&self, image_path: &Path, prompt: &str) -> Result<ExtractedDocument> {
        let mime_type = detect_mime_type(image_path);
        if !is_image(mime_type) {
            bail!("unsupported file type {mime_type}");
        }

        let image = tokio::fs::read(image_path)
            .await
            .with_context(|| format!("failed to read {}", image_path.display()))?;

        let request = VisionRequest {
            image: &image,
            mime_type,
            prompt,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        let response = self
            .model
            .describe(&request)
            .await
            .with_context(|| format!("{} model call failed", self.model.name()))?;

        Ok(parse_extracted(&response)?)
    }
}

#[async_trait]
impl DocumentExtractor for VisionExtractor {
    fn name(&self) -> &str {
        self.model.name()
    }

    async fn extract(&self, image_path: &Path, prompt: &str) -> ExtractionOutcome {
        match self.try_extract(image_path, prompt).await {
            Ok(doc) => {
                info!(model = %self.model.name(), fields = doc.len(), "Extracted document fields");
                ExtractionOutcome::Success(doc)
            }
            Err(e) => {
                warn!(model = %self.model.name(), error = %format!("{e:#}"), "Extraction failed");
                ExtractionOutcome::Failure(format!("{e:#}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::CannedVision;
    use docverify_core::FieldId;
    use std::io::Write;

    fn image_file(suffix: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(b"\x89PNG fake").unwrap();
        file
    }

    #[tokio::test]
    async fn parses_model_json() {
        let model = CannedVision::new("Sure! {\"name\": \"John Doe\", \"pan\": \"ABCDE1234F\"}");
        let extractor = VisionExtractor::new(Arc::new(model));
        let file = image_file(".png");

        let doc = extractor.extract(file.path(), "prompt").await.into_document().unwrap();
        assert_eq!(doc.text(FieldId::Pan).as_deref(), Some("ABCDE1234F"));
    }

    #[tokio::test]
    async fn prose_answer_is_failure() {
        let extractor = VisionExtractor::new(Arc::new(CannedVision::new("The card is blurry.")));
        let file = image_file(".jpg");

        match extractor.extract(file.path(), "prompt").await {
            ExtractionOutcome::Failure(reason) => assert!(reason.contains("no JSON object")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_image_is_failure() {
        let extractor = VisionExtractor::new(Arc::new(CannedVision::new("{}")));
        let file = image_file(".pdf");
        assert!(!extractor.extract(file.path(), "prompt").await.is_success());
    }

    #[tokio::test]
    async fn missing_file_is_failure() {
        let extractor = VisionExtractor::new(Arc::new(CannedVision::new("{}")));
        let outcome = extractor.extract(Path::new("/nonexistent/card.png"), "prompt").await;
        match outcome {
            ExtractionOutcome::Failure(reason) => assert!(reason.contains("failed to read")),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
