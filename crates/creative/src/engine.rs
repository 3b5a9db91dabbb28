use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use campaign_cache::ContentCache;
use campaign_core::config::AppConfig;
use campaign_core::error::{CampaignError, CampaignResult};
use campaign_core::stage::{PipelineStage, StageTracker};
use campaign_core::types::{Brief, PipelineResult, RenderedImage, RunStats, ScoredAsset};
use chrono::Utc;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info};
use uuid::Uuid;

use crate::artifacts::LocalArtifactStore;
use crate::copy::CopyGenerator;
use crate::prompt::PromptSynthesizer;
use crate::renderer::ImageRenderer;
use crate::scorer::CoherenceScorer;

/// Orchestrates one brief through copy generation, prompt synthesis,
/// cached concurrent rendering, cross-product scoring and ranking.
pub struct CreativePipeline {
    copy: CopyGenerator,
    prompts: PromptSynthesizer,
    renderer: ImageRenderer,
    scorer: CoherenceScorer,
    cache: Arc<ContentCache>,
    top_k: usize,
    render_limit: Option<Arc<Semaphore>>,
}

impl CreativePipeline {
    pub fn new(
        copy: CopyGenerator,
        prompts: PromptSynthesizer,
        renderer: ImageRenderer,
        scorer: CoherenceScorer,
        cache: Arc<ContentCache>,
        top_k: usize,
        max_concurrent_renders: Option<usize>,
    ) -> Self {
        Self {
            copy,
            prompts,
            renderer,
            scorer,
            cache,
            top_k,
            render_limit: max_concurrent_renders.map(|n| Arc::new(Semaphore::new(n.max(1)))),
        }
    }

    /// Wire every component from configuration using the provider factories.
    pub async fn from_config(config: &AppConfig) -> CampaignResult<Self> {
        let store = Arc::new(LocalArtifactStore::new(Path::new(&config.image.output_dir)));
        let cache = Arc::new(ContentCache::open(&config.cache).await?);

        let copy = CopyGenerator::new(campaign_providers::text_generator(&config.text), &config.text);
        let renderer = ImageRenderer::new(
            campaign_providers::image_generator(&config.image),
            store.clone(),
            &config.image,
        );
        let scorer = CoherenceScorer::new(
            campaign_providers::embedder(&config.embedding),
            campaign_providers::vision_embedder(&config.embedding),
            store,
            &config.embedding,
            &config.pipeline,
        );

        Ok(Self::new(
            copy,
            PromptSynthesizer::new(),
            renderer,
            scorer,
            cache,
            config.pipeline.top_k,
            config.pipeline.max_concurrent_renders,
        ))
    }

    /// Run the full pipeline for a pre-validated brief.
    ///
    /// Sub-components absorb backend failures, so an error here means a
    /// broken invariant (e.g. a corrupt cache entry), not an outage.
    pub async fn run(&self, brief: &Brief) -> CampaignResult<PipelineResult> {
        let start = Instant::now();
        let run_id = Uuid::new_v4();
        let mut stage = StageTracker::new();

        // 1. Copy
        let copies = self.copy.generate(brief).await.items();
        stage.advance(PipelineStage::CopyGenerated)?;
        info!(%run_id, product = %brief.product, copies = copies.len(), "Copy generated");

        // 2. One prompt per copy
        let prompts: Vec<String> = copies
            .iter()
            .map(|c| self.prompts.synthesize(brief, &c.text))
            .collect();
        stage.advance(PipelineStage::PromptsSynthesized)?;

        // 3. Fan out over distinct prompts, join before scoring
        stage.advance(PipelineStage::ImagesRendering)?;
        let (images, cache_hits) = self.render_all(&prompts).await?;
        stage.advance(PipelineStage::ImagesComplete)?;
        info!(
            %run_id,
            images = images.len(),
            cache_hits,
            "Images resolved"
        );

        // 4. Every copy against every image
        let mut assets = Vec::with_capacity(copies.len() * images.len());
        for copy in &copies {
            for image in &images {
                let score = self.scorer.score(&copy.text, &image.artifact_location).await;
                assets.push(ScoredAsset {
                    copy: copy.text.clone(),
                    image_location: image.artifact_location.clone(),
                    image_url: image.external_url.clone(),
                    score,
                });
            }
        }
        let scored_pairs = assets.len();
        stage.advance(PipelineStage::Scored)?;

        // 5. Stable sort keeps enumeration order among equal scores
        let top_assets = rank(assets, self.top_k);
        stage.advance(PipelineStage::Ranked)?;

        let latency_ms = start.elapsed().as_millis() as u64;
        metrics::histogram!("pipeline.latency_ms").record(latency_ms as f64);
        info!(
            %run_id,
            scored_pairs,
            returned = top_assets.len(),
            latency_ms,
            "Pipeline run complete"
        );

        Ok(PipelineResult {
            run_id,
            top_assets,
            stats: RunStats {
                copies: copies.len(),
                distinct_prompts: images.len(),
                scored_pairs,
                cache_hits,
                renders: images.len() - cache_hits,
            },
            latency_ms,
            generated_at: Utc::now(),
        })
    }

    /// Resolve one image per distinct prompt, in first-occurrence order.
    /// Returns the images and how many came from the cache.
    async fn render_all(&self, prompts: &[String]) -> CampaignResult<(Vec<RenderedImage>, usize)> {
        let mut seen = HashSet::new();
        let distinct: Vec<&str> = prompts
            .iter()
            .map(String::as_str)
            .filter(|p| seen.insert(*p))
            .collect();

        let resolved = join_all(distinct.iter().map(|p| self.resolve_image(p))).await;

        let mut images = Vec::with_capacity(resolved.len());
        let mut hits = 0;
        for result in resolved {
            let (image, hit) = result?;
            if hit {
                hits += 1;
            }
            images.push(image);
        }
        Ok((images, hits))
    }

    async fn resolve_image(&self, prompt: &str) -> CampaignResult<(RenderedImage, bool)> {
        let _permit = match &self.render_limit {
            Some(limit) => Some(limit.acquire().await.map_err(|e| {
                CampaignError::InvariantViolation(format!("render limiter closed: {e}"))
            })?),
            None => None,
        };

        let lookup = self
            .cache
            .get_or_insert_with(prompt, || async {
                let image = self.renderer.render(prompt).await;
                Ok(serde_json::to_value(&image)?)
            })
            .await?;

        let image: RenderedImage = serde_json::from_value(lookup.value).map_err(|e| {
            CampaignError::InvariantViolation(format!("cached render has unexpected shape: {e}"))
        })?;
        if image.source_prompt != prompt {
            return Err(CampaignError::InvariantViolation(
                "cached render belongs to a different prompt".to_string(),
            ));
        }
        if lookup.hit {
            debug!(location = %image.artifact_location, "Reusing cached render");
        }
        Ok((image, lookup.hit))
    }
}

/// Sort by descending score, keeping input order among ties, and keep `top_k`.
pub fn rank(mut assets: Vec<ScoredAsset>, top_k: usize) -> Vec<ScoredAsset> {
    assets.sort_by(|a, b| b.score.total_cmp(&a.score));
    assets.truncate(top_k);
    assets
}
