use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    // Network errors
    #[error("Content API error: {0}")]
    Api(#[from] facts_api::ApiError),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    // Storage errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    // User input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<tokio::task::JoinError> for FeedError {
    fn from(err: tokio::task::JoinError) -> Self {
        FeedError::Storage(err.to_string())
    }
}

pub type FeedResult<T> = Result<T, FeedError>;
