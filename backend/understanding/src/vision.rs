//! Vision-language model clients.
//!
//! Each client sends one image plus a text prompt and returns the model's raw
//! text answer. Parsing that answer is the extractor's job.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One image-plus-prompt request.
#[derive(Debug, Clone)]
pub struct VisionRequest<'a> {
    pub image: &'a [u8],
    pub mime_type: &'a str,
    pub prompt: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// A model that can answer a prompt about an image.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Backend name (e.g., "ollama", "openai").
    fn name(&self) -> &str;

    /// Send the request and return the response text.
    async fn describe(&self, request: &VisionRequest<'_>) -> Result<String>;
}

fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Ollama
// ---------------------------------------------------------------------------

/// Local Ollama server running a vision model such as `llama3.2-vision`.
pub struct OllamaVision {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaVision {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: http_client(Duration::from_secs(120)),
            base_url: "http://localhost:11434".to_string(),
            model: model.into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Serialize, Deserialize)]
struct OllamaChatMessage {
    role: String,
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaChatMessage,
}

#[async_trait]
impl VisionModel for OllamaVision {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn describe(&self, request: &VisionRequest<'_>) -> Result<String> {
        let start = Instant::now();
        let body = OllamaChatRequest {
            model: &self.model,
            messages: vec![OllamaChatMessage {
                role: "user".to_string(),
                content: request.prompt.to_string(),
                images: vec![STANDARD.encode(request.image)],
            }],
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        debug!(model = %self.model, bytes = request.image.len(), "Sending image to Ollama");

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .context("Ollama HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {}: {}", status, error_body);
        }

        let chat: OllamaChatResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        debug!(latency_ms = start.elapsed().as_millis() as u64, "Ollama responded");
        Ok(chat.message.content)
    }
}

// ---------------------------------------------------------------------------
// OpenAI-compatible
// ---------------------------------------------------------------------------

/// Any `/chat/completions` endpoint that accepts `image_url` content parts
/// (OpenAI, OpenRouter, vLLM).
pub struct OpenAiVision {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiVision {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: http_client(Duration::from_secs(120)),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: model.into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl VisionModel for OpenAiVision {
    fn name(&self) -> &str {
        "openai"
    }

    async fn describe(&self, request: &VisionRequest<'_>) -> Result<String> {
        let data_url = format!(
            "data:{};base64,{}",
            request.mime_type,
            STANDARD.encode(request.image)
        );
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": request.prompt },
                    { "type": "image_url", "image_url": { "url": data_url } }
                ]
            }],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        debug!(model = %self.model, "Sending image to chat completions endpoint");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Chat completions request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Chat completions returned {}: {}", status, error_body);
        }

        let chat: ChatResponse = response
            .json()
            .await
            .context("Failed to parse chat completions response")?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .context("Chat completions response had no content")
    }
}

/// A model that answers every request with the same text.
pub struct CannedVision {
    response: String,
}

impl CannedVision {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl VisionModel for CannedVision {
    fn name(&self) -> &str {
        "canned"
    }

    async fn describe(&self, _request: &VisionRequest<'_>) -> Result<String> {
        Ok(self.response.clone())
    }
}
