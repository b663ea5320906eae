// ABOUTME: Error types for the persistent template and message store
// ABOUTME: Distinguishes missing rows and undecodable rows from storage failures

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Can't decode {entity} {key}: {message}")]
    Decode {
        entity: &'static str,
        key: String,
        message: String,
    },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StoreError {
    /// Expected, recoverable lookup outcomes (missing or malformed row)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StoreError::NotFound { .. } | StoreError::Decode { .. })
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
