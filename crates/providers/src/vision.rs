//! HTTP client for a CLIP-style vision-embedding service.
//!
//! Wire format: `POST <url>` with `{"image": "<base64>"}`, answered by
//! `{"embedding": [f32, ...]}`. Vectors are L2-normalized on receipt.

use async_trait::async_trait;
use base64::engine::general_purpose;
use base64::Engine;
use campaign_core::backend::{BackendError, VisionEmbedder};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::openai::{build_http_client, check_status, map_http_error};

const NORM_EPSILON: f32 = 1e-10;

#[derive(Serialize)]
struct VisionRequest {
    image: String,
}

#[derive(Deserialize)]
struct VisionResponse {
    embedding: Vec<f32>,
}

pub struct HttpVisionEmbedder {
    client: Client,
    url: String,
}

impl HttpVisionEmbedder {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Result<Self, BackendError> {
        Ok(Self {
            client: build_http_client(timeout_secs)?,
            url: url.into(),
        })
    }
}

/// Scale `vector` to unit length.
pub fn l2_normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt() + NORM_EPSILON;
    for v in vector.iter_mut() {
        *v /= norm;
    }
    vector
}

#[async_trait]
impl VisionEmbedder for HttpVisionEmbedder {
    async fn embed_image(&self, image: &[u8]) -> Result<Vec<f32>, BackendError> {
        let body = VisionRequest {
            image: general_purpose::STANDARD.encode(image),
        };
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(map_http_error)?;
        let parsed: VisionResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Malformed(format!("vision response: {e}")))?;
        if parsed.embedding.is_empty() {
            return Err(BackendError::Malformed("empty vision embedding".to_string()));
        }
        Ok(l2_normalize(parsed.embedding))
    }

    fn backend_name(&self) -> &str {
        "http_vision"
    }
}
