// ABOUTME: Template engine module for email rendering
// ABOUTME: Provides the rendering context, handlebars engine, helpers and default template loaders

pub mod context;
pub mod engine;
pub mod error;
pub mod helpers;
pub mod loader;

pub use context::{EmailContext, DATE_KEY, DEFAULT_ATTACHMENTS_KEY};
pub use engine::TemplateEngine;
pub use error::{Result, TemplateError};
pub use loader::{FilesystemLoader, MemoryLoader, TemplateLoader};
