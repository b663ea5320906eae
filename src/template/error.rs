// ABOUTME: Error types for template loading and rendering
// ABOUTME: Covers missing default templates, syntax errors and handlebars render failures

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template not found: {name}")]
    NotFound { name: String },

    #[error("Template syntax error: {0}")]
    SyntaxError(String),

    #[error("Template context error: {0}")]
    ContextError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Handlebars error: {0}")]
    HandlebarsError(#[from] handlebars::RenderError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TemplateError>;
