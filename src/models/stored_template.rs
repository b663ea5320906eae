// ABOUTME: Database override of an email template for one language
// ABOUTME: Fills blank content and subject from the filesystem default and the registry on first save

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::error;

use super::attachment::Attachment;
use super::TemplateObject;
use crate::registry::{EmailTemplateRegistry, RegistryError};
use crate::template::TemplateLoader;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTemplate {
    #[serde(default)]
    pub id: Option<u64>,
    pub title: String,
    pub language: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl StoredTemplate {
    pub fn new(title: impl Into<String>, language: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            title: title.into(),
            language: language.into(),
            subject: String::new(),
            content: String::new(),
            attachments: Vec::new(),
            created: now,
            modified: now,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Not saved yet
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Source of the bundled template with the same title, or empty
    pub fn get_default_content(&self, loader: &dyn TemplateLoader) -> String {
        match loader.load_default(&self.title) {
            Ok(source) => source,
            Err(e) => {
                error!("Error loading template {}. Details: {}", self.title, e);
                String::new()
            }
        }
    }

    /// Registered default subject for the title, or empty when not registered
    pub fn get_default_subject(&self, registry: &EmailTemplateRegistry) -> String {
        match registry.get_subject(&self.title) {
            Ok(subject) => subject,
            Err(RegistryError::NotRegistered { .. }) => String::new(),
            Err(e) => {
                error!("Error reading default subject for {}: {}", self.title, e);
                String::new()
            }
        }
    }

    /// Populate blank content and subject with their defaults
    pub fn apply_defaults(&mut self, loader: &dyn TemplateLoader, registry: &EmailTemplateRegistry) {
        if self.content.is_empty() {
            self.content = self.get_default_content(loader);
        }
        if self.subject.is_empty() {
            self.subject = self.get_default_subject(registry);
        }
    }
}

impl fmt::Display for StoredTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.title, self.language)
    }
}

impl TemplateObject for StoredTemplate {
    fn subject(&self) -> &str {
        &self.subject
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registration;
    use crate::template::MemoryLoader;

    const DEFAULT_CONTENT: &str = "<h1>TEST DEFAULT CONTENT</h1>";

    fn loader() -> MemoryLoader {
        MemoryLoader::new().with_template("template-1.html", DEFAULT_CONTENT)
    }

    fn registry() -> EmailTemplateRegistry {
        let registry = EmailTemplateRegistry::new();
        registry
            .register(Registration::new("template-1.html").subject("Subject"))
            .unwrap();
        registry
    }

    #[test]
    fn test_get_default_content() {
        let template = StoredTemplate::new("template-1.html", "en");
        assert_eq!(template.get_default_content(&loader()), DEFAULT_CONTENT);

        let unknown = StoredTemplate::new("other.html", "en");
        assert_eq!(unknown.get_default_content(&loader()), "");
    }

    #[test]
    fn test_get_default_subject() {
        let template = StoredTemplate::new("template-1.html", "en");
        assert_eq!(template.get_default_subject(&registry()), "Subject");

        let unknown = StoredTemplate::new("other.html", "en");
        assert_eq!(unknown.get_default_subject(&registry()), "");
    }

    #[test]
    fn test_apply_defaults_keeps_existing_values() {
        let mut blank = StoredTemplate::new("template-1.html", "en");
        blank.apply_defaults(&loader(), &registry());
        assert_eq!(blank.content, DEFAULT_CONTENT);
        assert_eq!(blank.subject, "Subject");

        let mut filled = StoredTemplate::new("template-1.html", "en")
            .with_content("<h1>New content</h1>")
            .with_subject("Custom");
        filled.apply_defaults(&loader(), &registry());
        assert_eq!(filled.content, "<h1>New content</h1>");
        assert_eq!(filled.subject, "Custom");
    }

    #[test]
    fn test_display() {
        let template = StoredTemplate::new("support_respond.html", "pl");
        assert_eq!(template.to_string(), "support_respond.html -> pl");
        assert_eq!(template.created, template.modified);
        assert!(template.is_new());
    }
}
