//! Creative asset generation: turns one campaign brief into ranked
//! (copy, image) pairs through copy generation, prompt synthesis, cached
//! concurrent rendering and text/image coherence scoring.

pub mod artifacts;
pub mod copy;
pub mod engine;
pub mod prompt;
pub mod renderer;
pub mod scorer;

pub use artifacts::LocalArtifactStore;
pub use copy::CopyGenerator;
pub use engine::CreativePipeline;
pub use prompt::PromptSynthesizer;
pub use renderer::ImageRenderer;
pub use scorer::CoherenceScorer;
