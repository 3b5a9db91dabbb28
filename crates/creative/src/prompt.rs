use campaign_core::types::Brief;

/// Turns a piece of copy plus brief context into an image-generation
/// instruction. Pure: the same inputs always yield the same prompt, which
/// is what makes the render cache effective.
#[derive(Debug, Clone, Default)]
pub struct PromptSynthesizer;

impl PromptSynthesizer {
    pub fn new() -> Self {
        Self
    }

    pub fn synthesize(&self, brief: &Brief, copy: &str) -> String {
        let platforms = if brief.platforms.is_empty() {
            "general".to_string()
        } else {
            brief.platforms.join(", ")
        };
        format!(
            "Ad image for {product} targeting {audience}. \
             Scene: {product} as the in-frame hero, visually expressing the line \"{copy}\". \
             Style: vibrant, dynamic, bold colors, clear product focus with visible branding. \
             Mood: {tone}. \
             Framing: composed for {platforms} placements, product centered with room for headline text.",
            product = brief.product,
            audience = brief.audience,
            copy = copy.trim(),
            tone = brief.tone,
        )
    }
}
