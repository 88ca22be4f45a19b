//! Document understanding: turns an uploaded image into extracted fields.

pub mod extractor;
pub mod fixture;
pub mod json_extract;
pub mod mime;
pub mod vision;

pub use extractor::VisionExtractor;
pub use fixture::FixtureExtractor;
pub use json_extract::{ParseError, locate_json_object, parse_extracted};
pub use mime::{detect_mime_type, is_image};
pub use vision::{CannedVision, OllamaVision, OpenAiVision, VisionModel, VisionRequest};
