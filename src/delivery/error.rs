// ABOUTME: Error types raised by delivery gateways
// ABOUTME: Transport failures are swallowed or propagated depending on the caller's fail-silently choice

use thiserror::Error;

use crate::email::MessageError;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Invalid message: {0}")]
    InvalidMessage(#[from] MessageError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DeliveryError>;
