//! OpenAI-compatible HTTP backends for chat completion, image generation
//! and text embedding. Any endpoint that speaks the same wire format can be
//! targeted through `base_url`.

use async_trait::async_trait;
use base64::engine::general_purpose;
use base64::Engine;
use campaign_core::backend::{BackendError, Embedder, ImageGenerator, TextGenerator, TextRequest};
use campaign_core::config::{EmbeddingConfig, ImageBackendConfig, TextBackendConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn build_http_client(timeout_secs: u64) -> Result<Client, BackendError> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| BackendError::Unavailable(format!("failed to create HTTP client: {e}")))
}

pub(crate) fn map_http_error(error: reqwest::Error) -> BackendError {
    if error.is_timeout() {
        BackendError::Request(format!("request timeout: {error}"))
    } else if error.is_connect() {
        BackendError::Unavailable(format!("connection error: {error}"))
    } else if error.is_decode() {
        BackendError::Malformed(format!("undecodable body: {error}"))
    } else {
        BackendError::Request(format!("HTTP error: {error}"))
    }
}

/// Turn a non-success response into a [`BackendError`].
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(match status.as_u16() {
        401 | 403 => BackendError::Unavailable(format!("authentication failed: {body}")),
        _ => BackendError::Request(format!("status {status}: {body}")),
    })
}

fn require_key(api_key: &Option<String>) -> Result<&str, BackendError> {
    api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| BackendError::Unavailable("missing API key".to_string()))
}

// ─── Chat completion ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    n: u8,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
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

/// Chat-completion copywriting backend.
pub struct OpenAiTextClient {
    client: Client,
    model: String,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiTextClient {
    pub fn new(config: &TextBackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: build_http_client(config.timeout_secs)?,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiTextClient {
    async fn complete(&self, request: &TextRequest) -> Result<String, BackendError> {
        let api_key = require_key(&self.api_key)?;
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            n: 1,
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, "Requesting copy completion");
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_http_error)?;
        let completion: ChatCompletionResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Malformed(format!("chat response: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| BackendError::Malformed("no choices in response".to_string()))
    }

    fn backend_name(&self) -> &str {
        "openai_chat"
    }
}

// ─── Image generation ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct ImagesGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
}

#[derive(Deserialize)]
struct ImagesGenerateResponse {
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Image-generation backend. Accepts base64 payloads or a download URL.
pub struct OpenAiImageClient {
    client: Client,
    model: String,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiImageClient {
    pub fn new(config: &ImageBackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: build_http_client(config.timeout_secs)?,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageClient {
    async fn generate(&self, prompt: &str, size: &str) -> Result<Vec<u8>, BackendError> {
        let api_key = require_key(&self.api_key)?;
        let body = ImagesGenerateRequest {
            model: &self.model,
            prompt,
            n: 1,
            size,
        };

        let url = format!("{}/images/generations", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_http_error)?;
        let parsed: ImagesGenerateResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Malformed(format!("images response: {e}")))?;

        let first = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Malformed("no image data returned".to_string()))?;

        if let Some(b64) = first.b64_json {
            general_purpose::STANDARD
                .decode(b64)
                .map_err(|e| BackendError::Malformed(format!("invalid base64 image: {e}")))
        } else if let Some(url) = first.url {
            let response = self.client.get(&url).send().await.map_err(map_http_error)?;
            let bytes = check_status(response)
                .await?
                .bytes()
                .await
                .map_err(map_http_error)?;
            Ok(bytes.to_vec())
        } else {
            Err(BackendError::Malformed(
                "image response missing b64_json and url".to_string(),
            ))
        }
    }

    fn backend_name(&self) -> &str {
        "openai_images"
    }
}

// ─── Embeddings ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Text-embedding backend.
pub struct OpenAiEmbeddingClient {
    client: Client,
    model: String,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiEmbeddingClient {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: build_http_client(config.timeout_secs)?,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError> {
        let api_key = require_key(&self.api_key)?;
        let url = format!("{}/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .await
            .map_err(map_http_error)?;
        let parsed: EmbeddingResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Malformed(format!("embedding response: {e}")))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| BackendError::Malformed("empty embedding response".to_string()))
    }

    fn backend_name(&self) -> &str {
        "openai_embeddings"
    }
}
