//! "Try primary, on failure delegate to secondary" decorator.
//!
//! One generic wrapper implements the text, image and embedding traits.

use async_trait::async_trait;
use campaign_core::backend::{BackendError, Embedder, ImageGenerator, TextGenerator, TextRequest};
use tracing::warn;

/// Composes two backends of the same capability.
#[derive(Debug, Clone)]
pub struct Fallback<P, S> {
    primary: P,
    secondary: S,
    name: String,
}

impl<P, S> Fallback<P, S> {
    pub fn new(primary: P, secondary: S, name: impl Into<String>) -> Self {
        Self {
            primary,
            secondary,
            name: name.into(),
        }
    }

    fn record(&self, capability: &'static str, error: &BackendError) {
        warn!(chain = %self.name, capability, error = %error, "Primary backend failed, falling back");
        metrics::counter!("backend.fallback", "capability" => capability).increment(1);
    }
}

#[async_trait]
impl<P, S> TextGenerator for Fallback<P, S>
where
    P: TextGenerator,
    S: TextGenerator,
{
    async fn complete(&self, request: &TextRequest) -> Result<String, BackendError> {
        match self.primary.complete(request).await {
            Ok(text) => Ok(text),
            Err(e) => {
                self.record("text", &e);
                self.secondary.complete(request).await
            }
        }
    }

    fn backend_name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl<P, S> ImageGenerator for Fallback<P, S>
where
    P: ImageGenerator,
    S: ImageGenerator,
{
    async fn generate(&self, prompt: &str, size: &str) -> Result<Vec<u8>, BackendError> {
        match self.primary.generate(prompt, size).await {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                self.record("image", &e);
                self.secondary.generate(prompt, size).await
            }
        }
    }

    fn backend_name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl<P, S> Embedder for Fallback<P, S>
where
    P: Embedder,
    S: Embedder,
{
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError> {
        match self.primary.embed(text).await {
            Ok(vector) => Ok(vector),
            Err(e) => {
                self.record("embedding", &e);
                self.secondary.embed(text).await
            }
        }
    }

    fn backend_name(&self) -> &str {
        &self.name
    }
}
