//! Config validation with field paths in every message.

use thiserror::Error;

use crate::schema::{DocVerifyConfig, ExtractionProvider};

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &DocVerifyConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_extraction(config, &mut report);
    validate_storage(config, &mut report);
    report
}

fn validate_server(config: &DocVerifyConfig, report: &mut ValidationReport) {
    let server = &config.server;
    if server.port == 0 {
        report.error("server.port", "Port must be non-zero");
    }
    if server.max_upload_bytes == 0 {
        report.error("server.maxUploadBytes", "Upload limit must be non-zero");
    }
    if server.upload_dir.trim().is_empty() {
        report.error("server.uploadDir", "Upload directory cannot be empty");
    }
}

fn validate_extraction(config: &DocVerifyConfig, report: &mut ValidationReport) {
    let extraction = &config.extraction;
    if extraction.provider == ExtractionProvider::Fixture {
        report.warn(
            "extraction.provider",
            "Fixture provider returns sample data; documents are not read",
        );
        return;
    }

    if extraction.model.trim().is_empty() {
        report.error("extraction.model", "Model cannot be empty");
    }
    if !(extraction.base_url.starts_with("http://")
        || extraction.base_url.starts_with("https://"))
    {
        report.error("extraction.baseUrl", "Base URL must start with http:// or https://");
    }
    if extraction.provider == ExtractionProvider::OpenAi
        && extraction.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
    {
        report.error("extraction.apiKey", "The openai provider requires an API key");
    }
    if extraction.max_tokens == 0 {
        report.error("extraction.maxTokens", "maxTokens must be non-zero");
    }
    if !(0.0..=2.0).contains(&extraction.temperature) {
        report.warn("extraction.temperature", "Temperature outside 0..=2 is unusual");
    }
    if extraction.timeout_secs == 0 {
        report.warn("extraction.timeoutSecs", "A zero timeout fails every model call");
    }
}

fn validate_storage(config: &DocVerifyConfig, report: &mut ValidationReport) {
    if config.storage.db_path.trim().is_empty() {
        report.error("storage.dbPath", "Database path cannot be empty");
    }
}
