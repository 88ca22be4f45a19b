use thiserror::Error;

/// Top-level error type for document validation.
///
/// A value that fails to parse during comparison is not an error: the
/// comparator reports it as a mismatch and nothing propagates.
#[derive(Debug, Error)]
pub enum DocVerifyError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown document type: {0}")]
    UnknownDocumentType(String),

    #[error("extraction failed for {doc_type}: {reason}")]
    ExtractionFailed { doc_type: String, reason: String },

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DocVerifyError {
    /// Whether the caller is at fault (maps to a 400-class response).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DocVerifyError::InvalidInput(_)
                | DocVerifyError::UnknownDocumentType(_)
                | DocVerifyError::ExtractionFailed { .. }
        )
    }
}
