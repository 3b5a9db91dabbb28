//! Deterministic offline backends.
//!
//! Used when no credentials are configured or as the tail of a fallback
//! chain. None of these touch the network and all of them are pure
//! functions of their input.

use async_trait::async_trait;
use campaign_core::backend::{BackendError, Embedder, ImageGenerator, TextGenerator, TextRequest};
use campaign_core::config::ImageBackendConfig;
use image::{ImageFormat, Rgb, RgbImage};
use sha2::{Digest, Sha256};
use std::io::Cursor;

/// Text backend for offline mode. It never produces copy, so the copy
/// generator pads every slot with its deterministic templates.
#[derive(Debug, Clone, Default)]
pub struct OfflineTextGenerator;

#[async_trait]
impl TextGenerator for OfflineTextGenerator {
    async fn complete(&self, _request: &TextRequest) -> Result<String, BackendError> {
        Err(BackendError::Unavailable("offline text backend".to_string()))
    }

    fn backend_name(&self) -> &str {
        "offline_text"
    }
}

/// Solid-colour square PNG placeholder.
#[derive(Debug, Clone)]
pub struct PlaceholderImageGenerator {
    size: u32,
    color: [u8; 3],
}

impl PlaceholderImageGenerator {
    pub fn new(size: u32, color: [u8; 3]) -> Self {
        Self {
            size: size.max(1),
            color,
        }
    }

    pub fn from_config(config: &ImageBackendConfig) -> Self {
        Self::new(config.placeholder_size, config.placeholder_color)
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, BackendError> {
        let image = RgbImage::from_pixel(self.size, self.size, Rgb(self.color));
        let mut buf = Cursor::new(Vec::new());
        image
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| BackendError::Unavailable(format!("placeholder encode failed: {e}")))?;
        Ok(buf.into_inner())
    }
}

#[async_trait]
impl ImageGenerator for PlaceholderImageGenerator {
    async fn generate(&self, _prompt: &str, _size: &str) -> Result<Vec<u8>, BackendError> {
        self.encode_png()
    }

    fn backend_name(&self) -> &str {
        "placeholder_image"
    }
}

/// Pseudo-embedding from the SHA-256 digest of the text: each digest byte
/// becomes one component, zero-padded to `dimension`.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let digest = Sha256::digest(text.as_bytes());
        let mut vector: Vec<f32> = digest.iter().map(|b| f32::from(*b)).collect();
        vector.resize(self.dimension.max(digest.len()), 0.0);
        vector
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError> {
        Ok(self.vector(text))
    }

    fn backend_name(&self) -> &str {
        "hash_embedding"
    }
}
