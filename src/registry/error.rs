// ABOUTME: Error types for the email template registry
// ABOUTME: Separates duplicate registrations from lookups of unknown template paths

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("The template {path} is already registered")]
    AlreadyRegistered { path: String },

    #[error("Email template not registered: {path}")]
    NotRegistered { path: String },
}

pub type Result<T> = std::result::Result<T, RegistryError>;
