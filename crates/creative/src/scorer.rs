use campaign_core::backend::{ArtifactStore, Embedder, VisionEmbedder};
use campaign_core::config::{EmbeddingConfig, PipelineConfig};
use campaign_core::error::{CampaignError, CampaignResult};
use std::sync::Arc;
use tracing::{debug, warn};

const COSINE_EPSILON: f64 = 1e-12;

/// Scores text/image coherence as normalized embedding similarity.
///
/// The score for a pair is `clamp((cos(text, image) + 1) / 2, 0, 1)` where
///   - the text vector comes from the embedding backend, and
///   - the image vector comes from the vision backend when one is wired,
///     otherwise from embedding a fixed caption through the text path.
///
/// Any failure inside scoring yields the neutral score instead of an error.
pub struct CoherenceScorer {
    embedder: Arc<dyn Embedder>,
    vision: Option<Arc<dyn VisionEmbedder>>,
    store: Arc<dyn ArtifactStore>,
    caption: String,
    neutral_score: f64,
}

impl CoherenceScorer {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vision: Option<Arc<dyn VisionEmbedder>>,
        store: Arc<dyn ArtifactStore>,
        embedding: &EmbeddingConfig,
        pipeline: &PipelineConfig,
    ) -> Self {
        Self {
            embedder,
            vision,
            store,
            caption: embedding.caption.clone(),
            neutral_score: pipeline.neutral_score,
        }
    }

    /// Coherence of `text` with the image at `image_location`, in [0, 1].
    pub async fn score(&self, text: &str, image_location: &str) -> f64 {
        match self.try_score(text, image_location).await {
            Ok(score) if score.is_finite() => score.clamp(0.0, 1.0),
            Ok(score) => {
                warn!(score, "Non-finite coherence score, using neutral score");
                metrics::counter!("scorer.neutral").increment(1);
                self.neutral_score
            }
            Err(e) => {
                warn!(error = %e, "Coherence scoring failed, using neutral score");
                metrics::counter!("scorer.neutral").increment(1);
                self.neutral_score
            }
        }
    }

    async fn try_score(&self, text: &str, image_location: &str) -> CampaignResult<f64> {
        let text_embedding = self.embedder.embed(text).await?;
        let image_embedding = self.image_embedding(image_location).await?;
        let similarity = cosine_similarity(&text_embedding, &image_embedding)?;
        Ok(((similarity + 1.0) / 2.0).clamp(0.0, 1.0))
    }

    async fn image_embedding(&self, image_location: &str) -> CampaignResult<Vec<f32>> {
        if let Some(vision) = &self.vision {
            let direct = match self.store.read(image_location).await {
                Ok(bytes) => vision.embed_image(&bytes).await,
                Err(e) => Err(e),
            };
            match direct {
                Ok(vector) => return Ok(vector),
                Err(e) => {
                    debug!(error = %e, "Vision embedding unavailable, embedding caption instead");
                }
            }
        }
        Ok(self.embedder.embed(&self.caption).await?)
    }
}

/// Cosine similarity with an epsilon-guarded denominator.
///
/// Vectors of different or zero length are rejected rather than compared.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> CampaignResult<f64> {
    if a.is_empty() || a.len() != b.len() {
        return Err(CampaignError::MalformedResponse(format!(
            "embedding dimensions differ: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    Ok(dot / (norm_a.sqrt() * norm_b.sqrt() + COSINE_EPSILON))
}
