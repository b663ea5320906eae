// ABOUTME: Error types for administrative template and mass email operations
// ABOUTME: Validation errors name the offending field so callers can show them next to it

use thiserror::Error;

use crate::email::EmailError;
use crate::store::StoreError;
use crate::template::TemplateError;

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Email error: {0}")]
    Email(#[from] EmailError),
}

impl AdminError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AdminError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Field a validation error refers to
    pub fn field(&self) -> Option<&'static str> {
        match self {
            AdminError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AdminError>;
