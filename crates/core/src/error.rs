use thiserror::Error;

use crate::backend::BackendError;

pub type CampaignResult<T> = Result<T, CampaignError>;

#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Brief validation error: {0}")]
    Validation(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("Pipeline invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Content cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<BackendError> for CampaignError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Malformed(msg) => CampaignError::MalformedResponse(msg),
            other => CampaignError::BackendUnavailable(other.to_string()),
        }
    }
}

impl From<config::ConfigError> for CampaignError {
    fn from(err: config::ConfigError) -> Self {
        CampaignError::Config(err.to_string())
    }
}
