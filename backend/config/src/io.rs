//! Config file discovery and loading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info};

use crate::env::resolve_env_vars_with;
use crate::schema::DocVerifyConfig;

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the DocVerify config directory.
/// Priority: `DOCVERIFY_CONFIG_DIR` env > `~/.docverify/`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("DOCVERIFY_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".docverify"),
        None => PathBuf::from(".docverify"),
    }
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Load a config file, substituting `${VAR}` references from the process
/// environment.
///
/// Returns defaults if the file doesn't exist.
pub async fn load_config(path: &Path) -> Result<DocVerifyConfig> {
    load_config_with(path, &std::env::vars().collect()).await
}

/// Like [`load_config`] with an explicit environment.
pub async fn load_config_with(
    path: &Path,
    env: &HashMap<String, String>,
) -> Result<DocVerifyConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(DocVerifyConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&raw, env)
        .with_context(|| format!("Failed to load config at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Parse YAML text into a config, resolving env references first.
pub fn parse_config(raw: &str, env: &HashMap<String, String>) -> Result<DocVerifyConfig> {
    if raw.trim().is_empty() {
        return Ok(DocVerifyConfig::default());
    }

    let value: Value = serde_yaml::from_str(raw).context("Invalid config YAML")?;
    if value.is_null() {
        return Ok(DocVerifyConfig::default());
    }

    let value = resolve_env_vars_with(&value, env)?;
    serde_json::from_value(value).context("Config does not match schema")
}
