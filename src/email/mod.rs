// ABOUTME: Templated email composition and the shared mailer dependencies
// ABOUTME: Bundles registry, store, loader and gateway so builders can resolve and send

pub mod builder;
pub mod error;
pub mod message;

pub use builder::{
    AttachmentPayload, EmailFromTemplate, EmailFromTemplateBuilder, SendOptions, TemplateSource,
};
pub use error::{EmailError, MessageError, Result};
pub use message::{ContentType, EmailMessage, MessageAttachment};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::delivery::DeliveryGateway;
use crate::mass::{RecipientProvider, StaticRecipients};
use crate::models::MediaStorage;
use crate::registry::{self, EmailTemplateRegistry};
use crate::store::Store;
use crate::template::{EmailContext, TemplateLoader};

/// Site-wide defaults applied to every outgoing message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailSettings {
    #[serde(default = "default_from_email")]
    pub default_from_email: String,
    #[serde(default)]
    pub default_reply_to_email: Option<String>,
    #[serde(default = "default_language")]
    pub language_code: String,
    #[serde(default)]
    pub base_url: String,
}

fn default_from_email() -> String {
    "webmaster@localhost".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            default_from_email: default_from_email(),
            default_reply_to_email: None,
            language_code: default_language(),
            base_url: String::new(),
        }
    }
}

/// Everything a templated email needs to resolve, render and deliver.
#[derive(Clone)]
pub struct Mailer {
    registry: Arc<EmailTemplateRegistry>,
    store: Arc<dyn Store>,
    loader: Arc<dyn TemplateLoader>,
    gateway: Arc<dyn DeliveryGateway>,
    recipients: Arc<dyn RecipientProvider>,
    media: MediaStorage,
    settings: MailSettings,
}

impl Mailer {
    /// Create a mailer backed by the process-wide template registry
    pub fn new(
        store: Arc<dyn Store>,
        loader: Arc<dyn TemplateLoader>,
        gateway: Arc<dyn DeliveryGateway>,
    ) -> Self {
        Self {
            registry: registry::email_templates(),
            store,
            loader,
            gateway,
            recipients: Arc::new(StaticRecipients::default()),
            media: MediaStorage::default(),
            settings: MailSettings::default(),
        }
    }

    pub fn with_registry(mut self, registry: Arc<EmailTemplateRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Source of mass email recipients when none are passed explicitly
    pub fn with_recipients(mut self, recipients: Arc<dyn RecipientProvider>) -> Self {
        self.recipients = recipients;
        self
    }

    pub fn with_media(mut self, media: MediaStorage) -> Self {
        self.media = media;
        self
    }

    pub fn with_settings(mut self, settings: MailSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn registry(&self) -> &Arc<EmailTemplateRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn loader(&self) -> &Arc<dyn TemplateLoader> {
        &self.loader
    }

    pub fn gateway(&self) -> &Arc<dyn DeliveryGateway> {
        &self.gateway
    }

    pub fn recipients(&self) -> &Arc<dyn RecipientProvider> {
        &self.recipients
    }

    pub fn media(&self) -> &MediaStorage {
        &self.media
    }

    pub fn settings(&self) -> &MailSettings {
        &self.settings
    }

    /// Start building an email for a registered template name
    pub fn template(&self, name: impl Into<String>) -> EmailFromTemplateBuilder {
        EmailFromTemplate::builder(name)
    }
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer")
            .field("registered_templates", &self.registry.len())
            .field("gateway", &self.gateway.name())
            .field("media", &self.media)
            .field("settings", &self.settings)
            .finish()
    }
}

/// Resolve, render and send `name` in one call.
///
/// With the default options delivery failures are logged and reported as
/// zero sent messages.
pub fn send_email(
    mailer: &Mailer,
    name: &str,
    context: EmailContext,
    send_to: &[String],
    subject: &str,
    options: SendOptions,
) -> Result<usize> {
    let mut email = EmailFromTemplate::builder(name)
        .subject(subject)
        .context(context)
        .build(mailer)?;
    email.get_object()?;
    email.render_message(&EmailContext::new())?;
    email.send_email(send_to, &[], options)
}
