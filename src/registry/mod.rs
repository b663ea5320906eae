// ABOUTME: Catalog of known email templates keyed by template path
// ABOUTME: Validates template names and supplies help text, default subjects and preview context

pub mod error;
pub mod item;

pub use error::{RegistryError, Result};
pub use item::{HelpContextEntry, Registration, RegistrationItem};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use tracing::debug;

static EMAIL_TEMPLATES: Lazy<Arc<EmailTemplateRegistry>> =
    Lazy::new(|| Arc::new(EmailTemplateRegistry::new()));

/// Process-wide registry populated at startup.
pub fn email_templates() -> Arc<EmailTemplateRegistry> {
    Arc::clone(&EMAIL_TEMPLATES)
}

#[derive(Debug, Default)]
pub struct EmailTemplateRegistry {
    items: RwLock<IndexMap<String, Arc<RegistrationItem>>>,
}

impl EmailTemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexMap<String, Arc<RegistrationItem>>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an email template.
    ///
    /// Fails with [`RegistryError::AlreadyRegistered`] when the path is known.
    pub fn register(&self, registration: Registration) -> Result<()> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        if items.contains_key(&registration.path) {
            return Err(RegistryError::AlreadyRegistered {
                path: registration.path,
            });
        }

        let item = RegistrationItem::new(registration);
        debug!("Registered email template: {}", item.path());
        items.insert(item.path().to_string(), Arc::new(item));
        Ok(())
    }

    /// Register several templates, stopping at the first duplicate
    pub fn register_all<I>(&self, registrations: I) -> Result<()>
    where
        I: IntoIterator<Item = Registration>,
    {
        for registration in registrations {
            self.register(registration)?;
        }
        Ok(())
    }

    pub fn is_registered(&self, path: &str) -> bool {
        self.read().contains_key(path)
    }

    pub fn get_registration(&self, path: &str) -> Result<Arc<RegistrationItem>> {
        self.read()
            .get(path)
            .cloned()
            .ok_or_else(|| RegistryError::NotRegistered {
                path: path.to_string(),
            })
    }

    pub fn get_subject(&self, path: &str) -> Result<String> {
        Ok(self.get_registration(path)?.subject().to_string())
    }

    pub fn get_help_text(&self, path: &str) -> Result<String> {
        Ok(self.get_registration(path)?.help_text().to_string())
    }

    pub fn get_help_context(&self, path: &str) -> Result<BTreeMap<String, String>> {
        Ok(self.get_registration(path)?.help_context())
    }

    pub fn get_help_content(&self, path: &str) -> Result<Map<String, JsonValue>> {
        Ok(self.get_registration(path)?.help_content())
    }

    /// All registrations in registration order
    pub fn get_email_templates(&self) -> Vec<Arc<RegistrationItem>> {
        self.read().values().cloned().collect()
    }

    pub fn get_email_template_names(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// `(path, display name)` pairs for populating a selection control
    pub fn email_template_choices(&self) -> Vec<(String, String)> {
        self.read()
            .values()
            .map(|item| item.as_form_choice())
            .collect()
    }

    /// Usage and context help for a path; empty for unknown paths.
    pub fn get_form_help_text(&self, path: &str) -> String {
        match self.get_registration(path) {
            Ok(item) => item.as_form_help_text(),
            Err(_) => String::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
