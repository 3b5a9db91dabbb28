use campaign_core::backend::{ArtifactStore, ImageGenerator};
use campaign_core::config::ImageBackendConfig;
use campaign_core::types::RenderedImage;
use campaign_providers::PlaceholderImageGenerator;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Renders image prompts into stored artifacts. Never fails: backend errors
/// degrade to a placeholder image, and a failing artifact store degrades to
/// an empty reference.
pub struct ImageRenderer {
    backend: Arc<dyn ImageGenerator>,
    store: Arc<dyn ArtifactStore>,
    placeholder: PlaceholderImageGenerator,
    size: String,
}

impl ImageRenderer {
    pub fn new(
        backend: Arc<dyn ImageGenerator>,
        store: Arc<dyn ArtifactStore>,
        config: &ImageBackendConfig,
    ) -> Self {
        Self {
            backend,
            store,
            placeholder: PlaceholderImageGenerator::from_config(config),
            size: config.size.clone(),
        }
    }

    pub async fn render(&self, prompt: &str) -> RenderedImage {
        let bytes = match self.backend.generate(prompt, &self.size).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(
                    backend = self.backend.backend_name(),
                    error = %e,
                    "Image generation failed, rendering placeholder"
                );
                metrics::counter!("render.backend.fallback").increment(1);
                self.placeholder
                    .encode_png()
                    .map_err(|e| error!(error = %e, "Placeholder encoding failed"))
                    .ok()
            }
        };

        let stored = match bytes {
            Some(bytes) => self
                .store
                .put(&bytes)
                .await
                .map_err(|e| error!(error = %e, "Artifact store rejected image"))
                .ok(),
            None => None,
        };

        match stored {
            Some(artifact) => {
                debug!(location = %artifact.location, "Image rendered");
                RenderedImage {
                    artifact_location: artifact.location,
                    external_url: artifact.url,
                    source_prompt: prompt.to_string(),
                }
            }
            None => RenderedImage {
                artifact_location: String::new(),
                external_url: String::new(),
                source_prompt: prompt.to_string(),
            },
        }
    }
}
