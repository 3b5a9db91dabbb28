#![warn(clippy::unwrap_used)]

pub mod content;
pub mod inflight;
pub mod local;

pub use content::{content_key, CacheLookup, ContentCache};
pub use inflight::{InflightGuard, InflightGuards};
pub use local::{EntryStamp, LocalCache};
