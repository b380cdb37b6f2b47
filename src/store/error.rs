use thiserror::Error;

use super::MatchId;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("match {0} not found")]
    NotFound(MatchId),

    #[error("match {0} already exists")]
    AlreadyExists(MatchId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether retrying the same request later may succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            StoreError::Io(_) => true,
            StoreError::Unavailable(_) => true,
            StoreError::NotFound(_) => false,
            StoreError::AlreadyExists(_) => false,
            StoreError::Serialization(_) => false,
        }
    }
}
