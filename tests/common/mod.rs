// ABOUTME: Common utilities and helpers for integration tests
// ABOUTME: Provides temporary template, media and store directories plus a wired-up test mailer

#![allow(dead_code)]

use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use emailtemplates::delivery::MemoryOutbox;
use emailtemplates::email::{MailSettings, Mailer};
use emailtemplates::models::MediaStorage;
use emailtemplates::registry::{EmailTemplateRegistry, Registration};
use emailtemplates::store::JsonStore;
use emailtemplates::template::FilesystemLoader;

pub const HELLO_TEMPLATE: &str = "hello_template.html";
pub const SUPPORT_TEMPLATE: &str = "support_respond.html";

pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.path().join("templates")
    }

    pub fn media_dir(&self) -> PathBuf {
        self.path().join("media")
    }

    pub fn store_path(&self) -> PathBuf {
        self.path().join("emailtemplates.json")
    }

    /// Write a default template under the `emailtemplates` prefix directory
    pub fn write_template(&self, name: &str, content: &str) -> PathBuf {
        self.write_file(&Path::new("templates").join("emailtemplates").join(name), content)
    }

    pub fn write_media(&self, name: &str, content: &str) -> PathBuf {
        self.write_file(&Path::new("media").join(name), content)
    }

    pub fn write_file(&self, relative: &Path, content: &str) -> PathBuf {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create directory");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }
}

pub fn registrations() -> Vec<Registration> {
    vec![
        Registration::new(HELLO_TEMPLATE)
            .help_text("Hello template")
            .subject("Hello {{ username }}")
            .context_example("username", "Name of user in hello expression", json!("Alibaba")),
        Registration::new(SUPPORT_TEMPLATE)
            .name("Support response")
            .help_text("Sent after a support request is answered")
            .context("user_name", "Name of the user")
            .context("personal_message", "Message from the support team"),
    ]
}

pub struct TestMailer {
    pub registry: Arc<EmailTemplateRegistry>,
    pub store: Arc<JsonStore>,
    pub outbox: Arc<MemoryOutbox>,
    pub mailer: Mailer,
}

impl TestMailer {
    pub fn new(env: &TestEnvironment) -> Self {
        let registry = Arc::new(EmailTemplateRegistry::new());
        registry
            .register_all(registrations())
            .expect("Failed to register templates");

        let store = Arc::new(JsonStore::new(env.store_path()));
        let outbox = Arc::new(MemoryOutbox::new());
        let loader = FilesystemLoader::new(vec![env.templates_dir()]).with_prefix("emailtemplates");

        let mailer = Mailer::new(store.clone(), Arc::new(loader), outbox.clone())
            .with_registry(registry.clone())
            .with_media(MediaStorage::new(env.media_dir(), "/media/"))
            .with_settings(MailSettings {
                default_from_email: "noreply@example.com".to_string(),
                default_reply_to_email: Some("support@example.com".to_string()),
                language_code: "en".to_string(),
                base_url: "http://example.com".to_string(),
            });

        Self {
            registry,
            store,
            outbox,
            mailer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_creation() {
        let env = TestEnvironment::new();
        assert!(env.path().exists());

        let template = env.write_template(HELLO_TEMPLATE, "Hello");
        assert!(template.ends_with("templates/emailtemplates/hello_template.html"));
    }
}
