// ABOUTME: Error types for loading mass email recipient sources
// ABOUTME: Covers unreadable or malformed user directory files

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecipientError {
    #[error("Failed to read user directory {path}: {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid user directory {path}: {source}")]
    ParseError {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

pub type Result<T> = std::result::Result<T, RecipientError>;
