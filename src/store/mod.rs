// ABOUTME: Persistent store abstraction for template overrides and mass email jobs
// ABOUTME: Provides an in-memory store and a JSON file store behind the same traits

pub mod error;
pub mod json;
pub mod memory;
mod tables;

pub use error::{Result, StoreError};
pub use json::JsonStore;
pub use memory::MemoryStore;

use crate::models::{MassEmailMessage, StoredTemplate};

/// Database overrides of email templates, unique per (title, language).
pub trait TemplateStore: Send + Sync {
    /// Look up the override for a template name and language
    fn find(&self, title: &str, language: &str) -> Result<StoredTemplate>;

    fn get_template(&self, id: u64) -> Result<StoredTemplate>;

    fn list_templates(&self) -> Result<Vec<StoredTemplate>>;

    /// Insert or update; assigns ids to new rows and attachments.
    /// `template` is only updated once the row is stored.
    fn save_template(&self, template: &mut StoredTemplate) -> Result<()>;
}

/// Persisted mass email jobs.
pub trait MassMessageStore: Send + Sync {
    fn get_message(&self, id: u64) -> Result<MassEmailMessage>;

    fn list_messages(&self) -> Result<Vec<MassEmailMessage>>;

    fn save_message(&self, message: &mut MassEmailMessage) -> Result<()>;
}

/// Everything the mailer persists.
pub trait Store: TemplateStore + MassMessageStore {}

impl<T: TemplateStore + MassMessageStore> Store for T {}
