pub mod backend;
pub mod config;
pub mod error;
pub mod stage;
pub mod types;

pub use config::AppConfig;
pub use error::{CampaignError, CampaignResult};
