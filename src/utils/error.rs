use thiserror::Error;

use crate::extract::ExtractError;
use crate::fetcher::FetchError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
