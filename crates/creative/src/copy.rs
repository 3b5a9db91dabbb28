//! Headline and long-form copy generation with deterministic padding.

use campaign_core::backend::{TextGenerator, TextRequest};
use campaign_core::config::TextBackendConfig;
use campaign_core::types::{Brief, CopySet};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

const SYSTEM_INSTRUCTION: &str = "You are a creative marketing copywriter. \
Given a short brief, produce the requested number of short headline variations \
and long copy variations. Output only valid JSON with keys 'headlines' and 'long'.";

#[derive(Debug, Deserialize)]
struct CopyPayload {
    #[serde(default)]
    headlines: Vec<String>,
    #[serde(default)]
    long: Vec<String>,
}

/// Produces exactly `num_headlines` headlines and `num_long` long copies
/// for a brief, whatever the backend does.
pub struct CopyGenerator {
    backend: Arc<dyn TextGenerator>,
    max_tokens: u32,
    temperature: f32,
}

impl CopyGenerator {
    pub fn new(backend: Arc<dyn TextGenerator>, config: &TextBackendConfig) -> Self {
        Self {
            backend,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// Generate copy. Never fails and always returns the requested counts.
    pub async fn generate(&self, brief: &Brief) -> CopySet {
        if brief.num_headlines == 0 && brief.num_long == 0 {
            return CopySet::default();
        }

        let request = self.build_request(brief);
        let parsed = match self.backend.complete(&request).await {
            Ok(raw) => parse_copy(&raw, brief.num_headlines, brief.num_long),
            Err(e) => {
                warn!(
                    backend = self.backend.backend_name(),
                    error = %e,
                    "Copy generation failed, using templated copy"
                );
                CopySet::default()
            }
        };

        let generated = parsed.len();
        let copy = pad_copy(parsed, brief);
        debug!(
            generated,
            padded = copy.len() - generated,
            "Copy set ready"
        );
        copy
    }

    fn build_request(&self, brief: &Brief) -> TextRequest {
        let user = format!(
            "Brief:\nProduct: {}\nAudience: {}\nTone: {}\nGoal: {}\nPlatforms: {}\n\n\
             Instructions: Return a JSON object like {{\"headlines\": [..], \"long\": [..]}} with \
             {} short headline variations (keep them <=8 words) and {} long copy variations (1-2 sentences).",
            brief.product,
            brief.audience,
            brief.tone,
            brief.goal,
            brief.platform_list(),
            brief.num_headlines,
            brief.num_long,
        );
        TextRequest {
            system: SYSTEM_INSTRUCTION.to_string(),
            user,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

/// Parse a raw completion into at most `num_headlines` + `num_long` items.
///
/// Tries, in order: the whole text as JSON, the outermost `{...}` span as
/// JSON, and finally one item per non-empty line (headlines first).
pub fn parse_copy(raw: &str, num_headlines: usize, num_long: usize) -> CopySet {
    let payload = serde_json::from_str::<CopyPayload>(raw.trim())
        .ok()
        .or_else(|| embedded_object(raw).and_then(|s| serde_json::from_str(s).ok()));

    let mut set = match payload {
        Some(payload) => CopySet {
            headlines: clean(payload.headlines),
            long_copies: clean(payload.long),
        },
        None => {
            let mut lines = raw.lines().filter_map(strip_bullet);
            let headlines = lines.by_ref().take(num_headlines).collect();
            let long_copies = lines.take(num_long).collect();
            CopySet {
                headlines,
                long_copies,
            }
        }
    };
    set.headlines.truncate(num_headlines);
    set.long_copies.truncate(num_long);
    set
}

fn embedded_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

fn clean(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Strip list markers (`-`, `*`, `•`, `1.`, `2)`) and quotes from a line.
fn strip_bullet(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with("```") {
        return None;
    }
    let without_marker = line.trim_start_matches(&['-', '*', '•'][..]).trim_start();
    let digits = without_marker
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .count();
    let without_number = match without_marker[digits..].chars().next() {
        Some('.') | Some(')') if digits > 0 => without_marker[digits + 1..].trim_start(),
        _ => without_marker,
    };
    let text = without_number.trim().trim_matches('"').trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Fill missing slots with templated copy derived from the product name.
pub fn pad_copy(mut set: CopySet, brief: &Brief) -> CopySet {
    while set.headlines.len() < brief.num_headlines {
        let n = set.headlines.len() + 1;
        set.headlines
            .push(format!("{} - Unleash Energy #{n}", brief.product));
    }
    while set.long_copies.len() < brief.num_long {
        let n = set.long_copies.len() + 1;
        set.long_copies
            .push(format!("{} long copy version {n}", brief.product));
    }
    set
}
