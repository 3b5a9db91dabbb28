//! Concrete generation backends.
//!
//! Each module implements one or more of the capability traits in
//! [`campaign_core::backend`]: OpenAI-compatible HTTP clients for live
//! generation, deterministic offline backends for credential-less runs, and
//! the [`Fallback`] decorator that chains the two.

pub mod factory;
pub mod fallback;
pub mod offline;
pub mod openai;
pub mod vision;

pub use factory::{embedder, image_generator, text_generator, vision_embedder};
pub use fallback::Fallback;
pub use offline::{HashEmbedder, OfflineTextGenerator, PlaceholderImageGenerator};
pub use openai::{OpenAiEmbeddingClient, OpenAiImageClient, OpenAiTextClient};
pub use vision::HttpVisionEmbedder;
