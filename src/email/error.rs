// ABOUTME: Error types for building and sending templated emails
// ABOUTME: Wraps registry, template, store and delivery failures plus MIME building errors

use thiserror::Error;

use crate::delivery::DeliveryError;
use crate::registry::RegistryError;
use crate::store::StoreError;
use crate::template::TemplateError;

#[derive(Error, Debug)]
pub enum EmailError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Attachment error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Failures turning an [`EmailMessage`](super::EmailMessage) into MIME text.
#[derive(Error, Debug)]
pub enum MessageError {
    #[error("Invalid address '{address}': {message}")]
    Address { address: String, message: String },

    #[error("Invalid content type '{mimetype}' for attachment {filename}")]
    ContentType { filename: String, mimetype: String },

    #[error("Failed to build email message: {message}")]
    Build { message: String },
}

pub type Result<T> = std::result::Result<T, EmailError>;
