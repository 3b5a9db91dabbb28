use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CampaignError, CampaignResult};

/// Campaign brief: the immutable input to a single pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brief {
    pub product: String,
    pub audience: String,
    pub tone: String,
    pub goal: String,
    #[serde(default, alias = "platform")]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
    #[serde(default = "default_num_headlines")]
    pub num_headlines: usize,
    #[serde(default = "default_num_long")]
    pub num_long: usize,
}

fn default_num_headlines() -> usize {
    5
}
fn default_num_long() -> usize {
    3
}

impl Brief {
    /// Reject briefs with blank required fields.
    pub fn validate(&self) -> CampaignResult<()> {
        let required = [
            ("product", &self.product),
            ("audience", &self.audience),
            ("tone", &self.tone),
            ("goal", &self.goal),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CampaignError::Validation(format!("{field} must not be empty")));
            }
        }
        Ok(())
    }

    /// Platform list as a single comma-joined string.
    pub fn platform_list(&self) -> String {
        self.platforms.join(",")
    }
}

/// Which generation phase produced a piece of copy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CopyKind {
    Headline,
    Long,
}

/// A piece of generated advertising text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CopyItem {
    pub text: String,
    pub kind: CopyKind,
}

/// Output of the copy generation stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CopySet {
    pub headlines: Vec<String>,
    pub long_copies: Vec<String>,
}

impl CopySet {
    /// All copy in pipeline order: headlines first, then long copies.
    pub fn items(&self) -> Vec<CopyItem> {
        let headlines = self.headlines.iter().map(|text| CopyItem {
            text: text.clone(),
            kind: CopyKind::Headline,
        });
        let long = self.long_copies.iter().map(|text| CopyItem {
            text: text.clone(),
            kind: CopyKind::Long,
        });
        headlines.chain(long).collect()
    }

    pub fn len(&self) -> usize {
        self.headlines.len() + self.long_copies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A rendered image artifact. This is also the JSON shape stored in the content cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenderedImage {
    pub artifact_location: String,
    pub external_url: String,
    pub source_prompt: String,
}

/// One scored (copy, image) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredAsset {
    pub copy: String,
    pub image_location: String,
    pub image_url: String,
    pub score: f64,
}

/// Counters describing what a pipeline run did.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunStats {
    pub copies: usize,
    pub distinct_prompts: usize,
    pub scored_pairs: usize,
    pub cache_hits: usize,
    pub renders: usize,
}

/// Ranked output of a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub top_assets: Vec<ScoredAsset>,
    pub stats: RunStats,
    pub latency_ms: u64,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_brief() -> Brief {
        Brief {
            product: "Aqua".to_string(),
            audience: "teens".to_string(),
            tone: "fun".to_string(),
            goal: "awareness".to_string(),
            platforms: vec!["web".to_string(), "instagram".to_string()],
            extra: serde_json::Map::new(),
            num_headlines: 1,
            num_long: 0,
        }
    }

    #[test]
    fn test_brief_defaults_and_platform_alias() {
        let json = r#"{"product":"Aqua","audience":"teens","tone":"fun","goal":"awareness","platform":["web"]}"#;
        let brief: Brief = serde_json::from_str(json).unwrap();
        assert_eq!(brief.platforms, vec!["web".to_string()]);
        assert_eq!(brief.num_headlines, 5);
        assert_eq!(brief.num_long, 3);
        assert!(brief.extra.is_empty());
    }

    #[test]
    fn test_brief_validation() {
        assert!(sample_brief().validate().is_ok());

        let mut brief = sample_brief();
        brief.goal = "   ".to_string();
        let err = brief.validate().unwrap_err();
        assert!(err.to_string().contains("goal"));
    }

    #[test]
    fn test_platform_list() {
        assert_eq!(sample_brief().platform_list(), "web,instagram");
    }

    #[test]
    fn test_copy_set_order() {
        let set = CopySet {
            headlines: vec!["h1".to_string(), "h2".to_string()],
            long_copies: vec!["l1".to_string()],
        };
        let items = set.items();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].kind, CopyKind::Headline);
        assert_eq!(items[1].text, "h2");
        assert_eq!(items[2].kind, CopyKind::Long);
    }
}
