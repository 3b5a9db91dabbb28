//! Capability traits for the pluggable generation services.
//!
//! Every external service the pipeline talks to (text generation, image
//! generation, text embedding, vision embedding, artifact storage) sits
//! behind one of these traits so the creative pipeline can be wired
//! identically against live HTTP backends, deterministic offline backends,
//! or a fallback chain of both.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chat-style request sent to a text-generation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Text-generation backend (copywriting model).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Return the raw completion text for the request.
    async fn complete(&self, request: &TextRequest) -> Result<String, BackendError>;

    /// Backend name for metrics/logging.
    fn backend_name(&self) -> &str;
}

/// Image-generation backend.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Render the prompt at the given size (e.g. `1024x1024`) and return encoded image bytes.
    async fn generate(&self, prompt: &str, size: &str) -> Result<Vec<u8>, BackendError>;

    fn backend_name(&self) -> &str;
}

/// Text-embedding backend.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError>;

    fn backend_name(&self) -> &str;
}

/// Direct image-embedding backend. Returned vectors are L2-normalized.
#[async_trait]
pub trait VisionEmbedder: Send + Sync {
    async fn embed_image(&self, image: &[u8]) -> Result<Vec<f32>, BackendError>;

    fn backend_name(&self) -> &str;
}

/// Location of a stored artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub location: String,
    pub url: String,
}

/// Sink for rendered image bytes.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist the bytes under a fresh unique name.
    async fn put(&self, bytes: &[u8]) -> Result<StoredArtifact, BackendError>;

    /// Read back an artifact by the location returned from [`ArtifactStore::put`].
    async fn read(&self, location: &str) -> Result<Vec<u8>, BackendError>;
}

/// Errors raised by pluggable backends.
#[derive(Error, Debug, Clone)]
pub enum BackendError {
    /// Missing credentials, offline mode, or unreachable service.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    /// The service answered but the payload could not be used.
    #[error("malformed response: {0}")]
    Malformed(String),
    /// Transport-level or non-success HTTP failure.
    #[error("request failed: {0}")]
    Request(String),
}
