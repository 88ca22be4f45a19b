use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use docverify_config::{DocVerifyConfig, ExtractionConfig, ExtractionProvider};
use docverify_core::{DocumentExtractor, DocumentRegistry};
use docverify_understanding::{
    FixtureExtractor, OllamaVision, OpenAiVision, VisionExtractor, VisionModel,
};

/// Load the config file, or the default location when no path is given.
///
/// Validation is left to the caller so findings reach the installed logger.
pub async fn load(path: Option<PathBuf>) -> Result<DocVerifyConfig> {
    let path = path
        .unwrap_or_else(|| docverify_config::config_file_path(&docverify_config::config_dir()));
    docverify_config::load_config(&path)
        .await
        .with_context(|| format!("Failed to load config {}", path.display()))
}

/// Build the document extractor selected by the `extraction` section.
pub fn build_extractor(
    config: &ExtractionConfig,
    registry: &DocumentRegistry,
) -> Result<Arc<dyn DocumentExtractor>> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let model: Arc<dyn VisionModel> = match config.provider {
        ExtractionProvider::Fixture => {
            info!("Using fixture extractor");
            return Ok(Arc::new(FixtureExtractor::sample(registry)));
        }
        ExtractionProvider::Ollama => Arc::new(
            OllamaVision::new(&config.model)
                .with_base_url(&config.base_url)
                .with_timeout(timeout),
        ),
        ExtractionProvider::OpenAi => {
            let api_key = config
                .api_key
                .as_deref()
                .context("extraction.apiKey is required for the openai provider")?;
            let mut vision = OpenAiVision::new(api_key, &config.model).with_timeout(timeout);
            // The default base URL points at a local Ollama.
            if config.base_url != ExtractionConfig::default().base_url {
                vision = vision.with_base_url(&config.base_url);
            }
            Arc::new(vision)
        }
    };

    info!(provider = model.name(), model = %config.model, "Using vision extractor");
    Ok(Arc::new(
        VisionExtractor::new(model)
            .with_max_tokens(config.max_tokens)
            .with_temperature(config.temperature),
    ))
}
