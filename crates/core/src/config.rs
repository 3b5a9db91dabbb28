use serde::Deserialize;
use std::path::Path;

use crate::error::CampaignResult;

/// Root application configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `CAMPAIGN_EXPRESS__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub text: TextBackendConfig,
    #[serde(default)]
    pub image: ImageBackendConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Upper bound on simultaneous render calls. `None` fans out one task per distinct prompt.
    #[serde(default)]
    pub max_concurrent_renders: Option<usize>,
    #[serde(default = "default_neutral_score")]
    pub neutral_score: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextBackendConfig {
    #[serde(default = "default_text_provider")]
    pub provider: String,
    #[serde(default = "default_chat_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageBackendConfig {
    #[serde(default = "default_image_provider")]
    pub provider: String,
    #[serde(default = "default_image_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_image_size")]
    pub size: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_placeholder_size")]
    pub placeholder_size: u32,
    #[serde(default = "default_placeholder_color")]
    pub placeholder_color: [u8; 3],
    #[serde(default = "default_image_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_text_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Endpoint of a vision-embedding service. Unset disables direct image embedding.
    #[serde(default)]
    pub vision_url: Option<String>,
    #[serde(default = "default_caption")]
    pub caption: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_dir")]
    pub dir: String,
    #[serde(default = "default_memory_entries")]
    pub memory_entries: usize,
}

// Default functions
fn default_top_k() -> usize {
    6
}
fn default_neutral_score() -> f64 {
    0.4
}
fn default_text_provider() -> String {
    "openai".to_string()
}
fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_temperature() -> f32 {
    0.9
}
fn default_max_tokens() -> u32 {
    400
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_image_provider() -> String {
    "placeholder".to_string()
}
fn default_image_model() -> String {
    "gpt-image-1".to_string()
}
fn default_image_size() -> String {
    "1024x1024".to_string()
}
fn default_output_dir() -> String {
    "./outputs".to_string()
}
fn default_placeholder_size() -> u32 {
    1024
}
fn default_placeholder_color() -> [u8; 3] {
    [255, 80, 80]
}
fn default_image_timeout_secs() -> u64 {
    180
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_dimension() -> usize {
    1536
}
fn default_caption() -> String {
    "A high-energy image with product in focus and vibrant colors.".to_string()
}
fn default_cache_dir() -> String {
    "./cache".to_string()
}
fn default_memory_entries() -> usize {
    10_000
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_concurrent_renders: None,
            neutral_score: default_neutral_score(),
        }
    }
}

impl Default for TextBackendConfig {
    fn default() -> Self {
        Self {
            provider: default_text_provider(),
            model: default_chat_model(),
            base_url: default_base_url(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ImageBackendConfig {
    fn default() -> Self {
        Self {
            provider: default_image_provider(),
            model: default_image_model(),
            base_url: default_base_url(),
            api_key: None,
            size: default_image_size(),
            output_dir: default_output_dir(),
            placeholder_size: default_placeholder_size(),
            placeholder_color: default_placeholder_color(),
            timeout_secs: default_image_timeout_secs(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_text_provider(),
            model: default_embedding_model(),
            base_url: default_base_url(),
            api_key: None,
            dimension: default_dimension(),
            vision_url: None,
            caption: default_caption(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            memory_entries: default_memory_entries(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            text: TextBackendConfig::default(),
            image: ImageBackendConfig::default(),
            embedding: EmbeddingConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional TOML file overlaid with environment variables.
    pub fn load_from(path: Option<&Path>) -> CampaignResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("CAMPAIGN_EXPRESS")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("image.placeholder_color"),
        );

        let config = builder.build()?;
        let mut loaded: AppConfig = config.try_deserialize()?;
        loaded.fill_api_key(std::env::var("OPENAI_API_KEY").ok());
        Ok(loaded)
    }

    /// Use `key` for every backend section that has no explicit credential.
    pub fn fill_api_key(&mut self, key: Option<String>) {
        let Some(key) = key.filter(|k| !k.trim().is_empty()) else {
            return;
        };
        for slot in [
            &mut self.text.api_key,
            &mut self.image.api_key,
            &mut self.embedding.api_key,
        ] {
            if slot.is_none() {
                *slot = Some(key.clone());
            }
        }
    }

    /// Switch every backend to its offline variant.
    pub fn force_offline(&mut self) {
        self.text.provider = "offline".to_string();
        self.image.provider = "placeholder".to_string();
        self.embedding.provider = "offline".to_string();
        self.embedding.vision_url = None;
    }
}
