//! `docverify-config` — DocVerify runtime configuration.
//!
//! Provides:
//! - Typed config schema (server, extraction, storage, logging)
//! - YAML loading with `${ENV_VAR}` substitution
//! - Validation with per-field error paths

pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use env::{resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, load_config_with, parse_config};
pub use schema::{
    DocVerifyConfig, ExtractionConfig, ExtractionProvider, LoggingConfig, ServerConfig,
    StorageConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Result};

/// Log validation findings and fail if any of them is an error.
pub fn check(config: &DocVerifyConfig) -> Result<()> {
    let report = validate(config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.first() {
        bail!("{} config error(s); first: {}", report.errors.len(), first);
    }
    Ok(())
}
