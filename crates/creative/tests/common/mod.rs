//! Shared fixtures for pipeline integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use campaign_cache::ContentCache;
use campaign_core::backend::{BackendError, ImageGenerator, TextGenerator, TextRequest};
use campaign_core::config::{EmbeddingConfig, ImageBackendConfig, PipelineConfig, TextBackendConfig};
use campaign_core::types::Brief;
use campaign_creative::{
    CoherenceScorer, CopyGenerator, CreativePipeline, ImageRenderer, LocalArtifactStore,
    PromptSynthesizer,
};
use campaign_providers::{HashEmbedder, OfflineTextGenerator};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Image backend that counts calls and tracks peak concurrency.
#[derive(Default)]
pub struct CountingImageGenerator {
    pub calls: AtomicUsize,
    active: AtomicUsize,
    pub peak: AtomicUsize,
}

impl CountingImageGenerator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for CountingImageGenerator {
    async fn generate(&self, prompt: &str, _size: &str) -> Result<Vec<u8>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(15)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(prompt.as_bytes().to_vec())
    }

    fn backend_name(&self) -> &str {
        "counting"
    }
}

/// Image backend that always fails.
pub struct BrokenImageGenerator;

#[async_trait]
impl ImageGenerator for BrokenImageGenerator {
    async fn generate(&self, _prompt: &str, _size: &str) -> Result<Vec<u8>, BackendError> {
        Err(BackendError::Unavailable("no credentials".to_string()))
    }

    fn backend_name(&self) -> &str {
        "broken"
    }
}

/// Text backend returning a fixed completion.
pub struct CannedText(pub String);

#[async_trait]
impl TextGenerator for CannedText {
    async fn complete(&self, _request: &TextRequest) -> Result<String, BackendError> {
        Ok(self.0.clone())
    }

    fn backend_name(&self) -> &str {
        "canned"
    }
}

pub fn brief(num_headlines: usize, num_long: usize) -> Brief {
    Brief {
        product: "Aqua".to_string(),
        audience: "teens".to_string(),
        tone: "fun".to_string(),
        goal: "awareness".to_string(),
        platforms: vec!["web".to_string()],
        extra: Default::default(),
        num_headlines,
        num_long,
    }
}

pub async fn open_cache(root: &Path) -> Arc<ContentCache> {
    Arc::new(ContentCache::open_at(root.join("cache"), 64).await.unwrap())
}

pub struct PipelineBuilder {
    pub text: Arc<dyn TextGenerator>,
    pub image: Arc<dyn ImageGenerator>,
    pub top_k: usize,
    pub max_concurrent_renders: Option<usize>,
}

impl PipelineBuilder {
    pub fn new(image: Arc<dyn ImageGenerator>) -> Self {
        Self {
            text: Arc::new(OfflineTextGenerator),
            image,
            top_k: PipelineConfig::default().top_k,
            max_concurrent_renders: None,
        }
    }

    pub fn text(mut self, text: Arc<dyn TextGenerator>) -> Self {
        self.text = text;
        self
    }

    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn max_concurrent_renders(mut self, limit: usize) -> Self {
        self.max_concurrent_renders = Some(limit);
        self
    }

    pub fn build(self, root: &Path, cache: Arc<ContentCache>) -> CreativePipeline {
        let store = Arc::new(LocalArtifactStore::new(root.join("outputs")));
        let image_config = ImageBackendConfig {
            placeholder_size: 8,
            ..Default::default()
        };
        let renderer = ImageRenderer::new(self.image, store.clone(), &image_config);
        let scorer = CoherenceScorer::new(
            Arc::new(HashEmbedder::new(1536)),
            None,
            store,
            &EmbeddingConfig::default(),
            &PipelineConfig::default(),
        );
        CreativePipeline::new(
            CopyGenerator::new(self.text, &TextBackendConfig::default()),
            PromptSynthesizer::new(),
            renderer,
            scorer,
            cache,
            self.top_k,
            self.max_concurrent_renders,
        )
    }
}
