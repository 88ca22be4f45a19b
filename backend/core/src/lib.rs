//! `docverify-core` — document types, field comparison, and reconciliation.
//!
//! Everything here is synchronous and free of I/O except the
//! [`DocumentExtractor`] trait, which adapters implement elsewhere.

pub mod compare;
pub mod error;
pub mod reconcile;
pub mod registry;
pub mod submission;
pub mod traits;
pub mod types;

pub use compare::compare;
pub use error::DocVerifyError;
pub use reconcile::Reconciler;
pub use registry::{DocumentRegistry, DocumentSpec};
pub use submission::{DocumentRecord, Submission, SubmissionBuilder};
pub use traits::{DocumentExtractor, ExtractionOutcome};
pub use types::{
    CompareStrategy, DocumentType, ExtractedDocument, FieldId, FormInput, MismatchRecord,
    ReconciliationReport,
};
