// ABOUTME: Administrative operations on stored templates and mass email jobs
// ABOUTME: Validates edits before saving, previews templates and triggers mass sends with user notices

pub mod error;

pub use error::{AdminError, Result};

use serde::Serialize;
use std::fmt;
use tracing::error;

use crate::email::Mailer;
use crate::models::StoredTemplate;
use crate::registry::RegistryError;
use crate::store::{MassMessageStore, TemplateStore};
use crate::template::{EmailContext, TemplateEngine};

pub const ALREADY_SENT: &str =
    "Mass email was already sent. Create new mail message or force sending from shell.";
pub const SENT_SUCCESSFULLY: &str = "Mass email sent successfully";
pub const SEND_FAILED: &str = "Error occurred when trying to send mass email message.";

/// A message shown to the administrator after an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "level", content = "message", rename_all = "lowercase")]
pub enum Notice {
    Info(String),
    Success(String),
    Warning(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Info(message) | Notice::Success(message) | Notice::Warning(message) => message,
        }
    }

    pub fn level(&self) -> &'static str {
        match self {
            Notice::Info(_) => "info",
            Notice::Success(_) => "success",
            Notice::Warning(_) => "warning",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level(), self.message())
    }
}

/// Administrative view over the mailer's store and registry.
#[derive(Debug, Clone)]
pub struct TemplateAdmin {
    mailer: Mailer,
    languages: Vec<String>,
}

impl TemplateAdmin {
    pub fn new(mailer: Mailer) -> Self {
        Self {
            mailer,
            languages: Vec::new(),
        }
    }

    /// Restrict stored templates to these language codes
    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.languages = languages;
        self
    }

    pub fn mailer(&self) -> &Mailer {
        &self.mailer
    }

    /// (path, display name) pairs for the template selector
    pub fn template_choices(&self) -> Vec<(String, String)> {
        self.mailer.registry().email_template_choices()
    }

    /// Usage and context help for the selected template, empty when unknown
    pub fn form_help_text(&self, title: Option<&str>) -> String {
        title
            .map(|title| self.mailer.registry().get_form_help_text(title))
            .unwrap_or_default()
    }

    /// Check a template edit without saving it
    pub fn validate(&self, template: &StoredTemplate) -> Result<()> {
        if !self.mailer.registry().is_registered(&template.title) {
            return Err(AdminError::validation(
                "title",
                format!("{} is not a registered email template", template.title),
            ));
        }

        if !self.languages.is_empty() && !self.languages.contains(&template.language) {
            return Err(AdminError::validation(
                "language",
                format!("{} is not one of the available languages", template.language),
            ));
        }

        let engine = TemplateEngine::new()?;
        engine.validate_template(&template.content).map_err(|e| {
            AdminError::validation(
                "content",
                format!("Syntax error in custom email template: {}", e),
            )
        })?;

        Ok(())
    }

    /// Validate and persist a template, filling defaults on first save
    pub fn save_template(&self, template: &mut StoredTemplate) -> Result<()> {
        self.validate(template)?;
        if template.is_new() {
            template.apply_defaults(self.mailer.loader().as_ref(), self.mailer.registry());
        }
        self.mailer.store().save_template(template)?;
        Ok(())
    }

    /// Render a stored template with its registered example context
    pub fn preview(&self, id: u64) -> Result<String> {
        let template = self.mailer.store().get_template(id)?;
        let context = match self.mailer.registry().get_help_content(&template.title) {
            Ok(content) => EmailContext::from(content),
            Err(RegistryError::NotRegistered { .. }) => EmailContext::new(),
            Err(e) => {
                error!("Can't read help content for {}: {}", template.title, e);
                EmailContext::new()
            }
        };

        let engine = TemplateEngine::new()?;
        Ok(engine.render_template(&template.content, &context)?)
    }

    /// Send a stored mass email job once, reporting the outcome as a notice
    pub fn send_mass_email(&self, id: u64) -> Result<Notice> {
        let mut message = self.mailer.store().get_message(id)?;
        if message.sent() {
            return Ok(Notice::Info(ALREADY_SENT.to_string()));
        }

        match message.send(&self.mailer, None, false) {
            Ok(true) => Ok(Notice::Success(SENT_SUCCESSFULLY.to_string())),
            Ok(false) => Ok(Notice::Warning(SEND_FAILED.to_string())),
            Err(e) => {
                error!("Mass email {} failed: {}", id, e);
                Ok(Notice::Warning(SEND_FAILED.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::MemoryOutbox;
    use crate::mass::StaticRecipients;
    use crate::models::MassEmailMessage;
    use crate::registry::{EmailTemplateRegistry, Registration};
    use crate::store::{MassMessageStore, MemoryStore, TemplateStore};
    use crate::template::MemoryLoader;
    use serde_json::json;
    use std::sync::Arc;

    const DEFAULT_CONTENT: &str = "<h1>TEST DEFAULT CONTENT</h1>";

    fn admin(outbox: Arc<MemoryOutbox>) -> (TemplateAdmin, Arc<MemoryStore>) {
        let registry = Arc::new(EmailTemplateRegistry::new());
        registry
            .register(
                Registration::new("hello_template.html")
                    .help_text("Hello template")
                    .subject("Hello {{ username }}")
                    .context_example("username", "Name of user", json!("Alibaba")),
            )
            .unwrap();
        let store = Arc::new(MemoryStore::new());
        let loader = MemoryLoader::new().with_template("hello_template.html", DEFAULT_CONTENT);
        let mailer = Mailer::new(store.clone(), Arc::new(loader), outbox)
            .with_registry(registry)
            .with_recipients(Arc::new(StaticRecipients(vec!["a@x.com".to_string()])));
        let admin = TemplateAdmin::new(mailer).with_languages(vec!["en".to_string(), "pl".to_string()]);
        (admin, store)
    }

    #[test]
    fn test_save_applies_defaults() {
        let (admin, store) = admin(Arc::new(MemoryOutbox::new()));
        let mut template = StoredTemplate::new("hello_template.html", "en");
        admin.save_template(&mut template).unwrap();

        let saved = store.find("hello_template.html", "en").unwrap();
        assert_eq!(saved.content, DEFAULT_CONTENT);
        assert_eq!(saved.subject, "Hello {{ username }}");
    }

    #[test]
    fn test_validation_errors() {
        let (admin, _) = admin(Arc::new(MemoryOutbox::new()));

        let unknown = StoredTemplate::new("unknown.html", "en");
        assert_eq!(admin.validate(&unknown).unwrap_err().field(), Some("title"));

        let german = StoredTemplate::new("hello_template.html", "de");
        assert_eq!(admin.validate(&german).unwrap_err().field(), Some("language"));

        let broken = StoredTemplate::new("hello_template.html", "en").with_content("{{#if username}}Hi{{/each}}");
        let err = admin.validate(&broken).unwrap_err();
        assert_eq!(err.field(), Some("content"));
        assert!(err.to_string().contains("Syntax error in custom email template"));
    }

    #[test]
    fn test_preview_uses_help_content() {
        let (admin, store) = admin(Arc::new(MemoryOutbox::new()));
        let mut template = StoredTemplate::new("hello_template.html", "en")
            .with_content("<p>Hello {{ username }}</p>");
        store.save_template(&mut template).unwrap();

        let html = admin.preview(template.id.unwrap()).unwrap();
        assert_eq!(html, "<p>Hello Alibaba</p>");
    }

    #[test]
    fn test_send_mass_email_notices() {
        let outbox = Arc::new(MemoryOutbox::new());
        let (admin, store) = admin(outbox.clone());
        let mut message = MassEmailMessage::new("Subject", "Body");
        store.save_message(&mut message).unwrap();
        let id = message.id.unwrap();

        assert_eq!(
            admin.send_mass_email(id).unwrap(),
            Notice::Success(SENT_SUCCESSFULLY.to_string())
        );
        assert_eq!(
            admin.send_mass_email(id).unwrap(),
            Notice::Info(ALREADY_SENT.to_string())
        );
        assert_eq!(outbox.len(), 1);
    }

    #[test]
    fn test_send_mass_email_failure_is_a_warning() {
        let outbox = Arc::new(MemoryOutbox::new());
        outbox.fail_deliveries(true);
        let (admin, store) = admin(outbox);
        let mut message = MassEmailMessage::new("Subject", "Body");
        store.save_message(&mut message).unwrap();

        let notice = admin.send_mass_email(message.id.unwrap()).unwrap();
        assert_eq!(notice, Notice::Warning(SEND_FAILED.to_string()));
    }

    #[test]
    fn test_form_help_text() {
        let (admin, _) = admin(Arc::new(MemoryOutbox::new()));
        assert!(admin
            .form_help_text(Some("hello_template.html"))
            .starts_with("USAGE: Hello template"));
        assert_eq!(admin.form_help_text(Some("unknown.html")), "");
        assert_eq!(admin.form_help_text(None), "");
        assert_eq!(admin.template_choices().len(), 1);
    }
}
