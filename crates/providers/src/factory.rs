//! Assembles backend chains from configuration.
//!
//! Live providers are always wrapped in a [`Fallback`] whose tail is the
//! matching offline backend.

use crate::fallback::Fallback;
use crate::offline::{HashEmbedder, OfflineTextGenerator, PlaceholderImageGenerator};
use crate::openai::{OpenAiEmbeddingClient, OpenAiImageClient, OpenAiTextClient};
use crate::vision::HttpVisionEmbedder;
use campaign_core::backend::{Embedder, ImageGenerator, TextGenerator, VisionEmbedder};
use campaign_core::config::{EmbeddingConfig, ImageBackendConfig, TextBackendConfig};
use std::sync::Arc;
use tracing::{info, warn};

pub fn text_generator(config: &TextBackendConfig) -> Arc<dyn TextGenerator> {
    match config.provider.as_str() {
        "openai" => match OpenAiTextClient::new(config) {
            Ok(client) => {
                info!(model = %config.model, "Text backend: openai with offline fallback");
                Arc::new(Fallback::new(client, OfflineTextGenerator, "openai_chat+offline"))
            }
            Err(e) => {
                warn!(error = %e, "OpenAI text client unavailable, using offline backend");
                Arc::new(OfflineTextGenerator)
            }
        },
        "offline" => Arc::new(OfflineTextGenerator),
        other => {
            warn!(provider = other, "Unknown text provider, using offline backend");
            Arc::new(OfflineTextGenerator)
        }
    }
}

pub fn image_generator(config: &ImageBackendConfig) -> Arc<dyn ImageGenerator> {
    let placeholder = PlaceholderImageGenerator::from_config(config);
    match config.provider.as_str() {
        "openai" => match OpenAiImageClient::new(config) {
            Ok(client) => {
                info!(model = %config.model, "Image backend: openai with placeholder fallback");
                Arc::new(Fallback::new(client, placeholder, "openai_images+placeholder"))
            }
            Err(e) => {
                warn!(error = %e, "OpenAI image client unavailable, using placeholder");
                Arc::new(placeholder)
            }
        },
        "placeholder" => Arc::new(placeholder),
        other => {
            warn!(provider = other, "Unknown image provider, using placeholder");
            Arc::new(placeholder)
        }
    }
}

pub fn embedder(config: &EmbeddingConfig) -> Arc<dyn Embedder> {
    let offline = HashEmbedder::new(config.dimension);
    match config.provider.as_str() {
        "openai" => match OpenAiEmbeddingClient::new(config) {
            Ok(client) => {
                info!(model = %config.model, "Embedding backend: openai with hash fallback");
                Arc::new(Fallback::new(client, offline, "openai_embeddings+hash"))
            }
            Err(e) => {
                warn!(error = %e, "OpenAI embedding client unavailable, using hash embeddings");
                Arc::new(offline)
            }
        },
        "offline" => Arc::new(offline),
        other => {
            warn!(provider = other, "Unknown embedding provider, using hash embeddings");
            Arc::new(offline)
        }
    }
}

/// Vision backend, present only when a service URL is configured.
pub fn vision_embedder(config: &EmbeddingConfig) -> Option<Arc<dyn VisionEmbedder>> {
    let url = config.vision_url.as_deref()?;
    match HttpVisionEmbedder::new(url, config.timeout_secs) {
        Ok(client) => {
            info!(url, "Vision embedding backend enabled");
            Some(Arc::new(client))
        }
        Err(e) => {
            warn!(error = %e, "Vision embedding backend disabled");
            None
        }
    }
}
