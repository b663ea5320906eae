// ABOUTME: Builds an email from a named template resolved through database, filesystem and default tiers
// ABOUTME: Renders subject and body against a context and hands the message to the delivery gateway

use serde::Serialize;
use serde_json::json;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use url::Url;

use super::error::Result;
use super::message::{ContentType, EmailMessage, MessageAttachment};
use super::Mailer;
use crate::models::attachment::is_absolute_url;
use crate::models::TemplateObject;
use crate::store::{StoreError, TemplateStore};
use crate::template::{EmailContext, TemplateEngine, DEFAULT_ATTACHMENTS_KEY};

const BODY_TEMPLATE: &str = "body";

/// Tier that supplied the body template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateSource {
    #[default]
    Default,
    Filesystem,
    Database,
}

impl TemplateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateSource::Default => "default",
            TemplateSource::Filesystem => "filesystem",
            TemplateSource::Database => "database",
        }
    }
}

impl fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A default attachment, either linked or inlined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentPayload {
    Url(String),
    Bytes(Vec<u8>),
}

/// Per-send options for [`EmailFromTemplate::send_email`].
#[derive(Debug, Clone)]
pub struct SendOptions {
    pub reply_to: Option<Vec<String>>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub attachments: Vec<MessageAttachment>,
    pub fail_silently: bool,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            reply_to: None,
            cc: Vec::new(),
            bcc: Vec::new(),
            attachments: Vec::new(),
            fail_silently: true,
        }
    }
}

impl SendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply_to(mut self, reply_to: Vec<String>) -> Self {
        self.reply_to = Some(reply_to);
        self
    }

    pub fn cc(mut self, cc: Vec<String>) -> Self {
        self.cc = cc;
        self
    }

    pub fn bcc(mut self, bcc: Vec<String>) -> Self {
        self.bcc = bcc;
        self
    }

    pub fn attachment(mut self, attachment: MessageAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn fail_silently(mut self, fail_silently: bool) -> Self {
        self.fail_silently = fail_silently;
        self
    }
}

/// Collects construction parameters for [`EmailFromTemplate`].
#[derive(Debug)]
pub struct EmailFromTemplateBuilder {
    name: String,
    language: Option<String>,
    from_email: Option<String>,
    subject: String,
    base_url: Option<String>,
    registry_validation: bool,
    template_object: Option<Arc<dyn TemplateObject>>,
    template: Option<String>,
    content_subtype: ContentType,
    context: EmailContext,
}

impl EmailFromTemplateBuilder {
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn from_email(mut self, from_email: impl Into<String>) -> Self {
        self.from_email = Some(from_email.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Require the template name to be registered (on by default)
    pub fn registry_validation(mut self, enabled: bool) -> Self {
        self.registry_validation = enabled;
        self
    }

    /// Use this entity as the content source instead of a database lookup
    pub fn template_object(mut self, object: Arc<dyn TemplateObject>) -> Self {
        self.template_object = Some(object);
        self
    }

    /// Literal body used when neither the database nor the filesystem has the template
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn content_subtype(mut self, content_subtype: ContentType) -> Self {
        self.content_subtype = content_subtype;
        self
    }

    pub fn context(mut self, context: EmailContext) -> Self {
        self.context.extend(context);
        self
    }

    /// Validate against the registry and create the email
    pub fn build(self, mailer: &Mailer) -> Result<EmailFromTemplate> {
        if self.registry_validation {
            mailer.registry().get_registration(&self.name)?;
        }

        let settings = mailer.settings();
        let mut context = EmailContext::with_defaults();
        context.extend(self.context);

        Ok(EmailFromTemplate {
            mailer: mailer.clone(),
            language: self.language.unwrap_or_else(|| settings.language_code.clone()),
            from_email: self
                .from_email
                .unwrap_or_else(|| settings.default_from_email.clone()),
            base_url: self.base_url.unwrap_or_else(|| settings.base_url.clone()),
            subject: self.subject.clone(),
            subject_template: self.subject,
            name: self.name,
            template: self.template,
            engine: TemplateEngine::with_escaping(self.content_subtype.escapes_html())?,
            subject_engine: TemplateEngine::plain()?,
            compiled: false,
            context,
            message: String::new(),
            sent: 0,
            content_subtype: self.content_subtype,
            template_source: TemplateSource::Default,
            template_object: self.template_object,
            resolved: None,
        })
    }
}

/// An email rendered from a named template.
///
/// The usual flow is [`get_object`](Self::get_object), then
/// [`render_message`](Self::render_message), then
/// [`send_email`](Self::send_email); [`send`](Self::send) runs all three.
pub struct EmailFromTemplate {
    mailer: Mailer,
    name: String,
    language: String,
    from_email: String,
    base_url: String,
    subject_template: String,
    subject: String,
    template: Option<String>,
    engine: TemplateEngine,
    subject_engine: TemplateEngine,
    compiled: bool,
    context: EmailContext,
    message: String,
    sent: usize,
    content_subtype: ContentType,
    template_source: TemplateSource,
    template_object: Option<Arc<dyn TemplateObject>>,
    resolved: Option<Arc<dyn TemplateObject>>,
}

impl EmailFromTemplate {
    pub fn builder(name: impl Into<String>) -> EmailFromTemplateBuilder {
        EmailFromTemplateBuilder {
            name: name.into(),
            language: None,
            from_email: None,
            subject: String::new(),
            base_url: None,
            registry_validation: true,
            template_object: None,
            template: None,
            content_subtype: ContentType::default(),
            context: EmailContext::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn from_email(&self) -> &str {
        &self.from_email
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Subject as it will appear on the outgoing message
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) {
        let subject = subject.into();
        self.subject_template = subject.clone();
        self.subject = subject;
    }

    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn set_template(&mut self, template: impl Into<String>) {
        self.template = Some(template.into());
        self.compiled = false;
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Messages delivered by the last send
    pub fn sent(&self) -> usize {
        self.sent
    }

    pub fn template_source(&self) -> TemplateSource {
        self.template_source
    }

    pub fn content_subtype(&self) -> ContentType {
        self.content_subtype
    }

    pub fn set_content_subtype(&mut self, content_subtype: ContentType) -> Result<()> {
        if content_subtype != self.content_subtype {
            self.engine = TemplateEngine::with_escaping(content_subtype.escapes_html())?;
            self.content_subtype = content_subtype;
            self.compiled = false;
        }
        Ok(())
    }

    pub fn context(&self) -> &EmailContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut EmailContext {
        &mut self.context
    }

    /// Join a relative URL onto the configured base URL
    pub fn build_absolute_uri(&self, url: &str) -> String {
        if is_absolute_url(url) || self.base_url.is_empty() {
            return url.to_string();
        }
        match Url::parse(&self.base_url).and_then(|base| base.join(url)) {
            Ok(absolute) => absolute.to_string(),
            Err(e) => {
                debug!("Can't join {} onto base url {}: {}", url, self.base_url, e);
                url.to_string()
            }
        }
    }

    fn lookup_template_object(&self) -> Result<Option<Arc<dyn TemplateObject>>> {
        if let Some(object) = self.resolved.as_ref().or(self.template_object.as_ref()) {
            return Ok(Some(Arc::clone(object)));
        }
        match self.mailer.store().find(&self.name, &self.language) {
            Ok(stored) => Ok(Some(Arc::new(stored))),
            Err(e) if e.is_recoverable() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve the body template, trying the database and then the filesystem
    pub fn get_object(&mut self) -> Result<TemplateSource> {
        let object = match &self.template_object {
            Some(object) => Some(Arc::clone(object)),
            None => match self.mailer.store().find(&self.name, &self.language) {
                Ok(stored) => Some(Arc::new(stored) as Arc<dyn TemplateObject>),
                Err(StoreError::Decode { message, .. }) => {
                    warn!("Can't decode EmailTemplate object from database, using default file template.");
                    debug!("Decode failure for {}: {}", self.name, message);
                    None
                }
                Err(StoreError::NotFound { .. }) => {
                    warn!("Can't find EmailTemplate object in database, using default file template.");
                    None
                }
                Err(e) => return Err(e.into()),
            },
        };

        if let Some(object) = object {
            self.template = Some(object.content().to_string());
            self.compiled = false;
            if !object.subject().is_empty() {
                self.subject_template = object.subject().to_string();
            }
            self.resolved = Some(object);
            self.subject = self.get_subject()?;
            self.template_source = TemplateSource::Database;
            debug!("Got template {} from database", self.name);
            return Ok(self.template_source);
        }

        match self.mailer.loader().load_default(&self.name) {
            Ok(source) => {
                self.template = Some(source);
                self.compiled = false;
                self.template_source = TemplateSource::Filesystem;
            }
            Err(e) => {
                warn!(
                    "Can't find {} template in the filesystem, will use very default one.",
                    self.name
                );
                debug!("Filesystem lookup for {} failed: {}", self.name, e);
                self.template_source = TemplateSource::Default;
            }
        }
        Ok(self.template_source)
    }

    /// Subject template rendered against the current context
    pub fn get_subject(&mut self) -> Result<String> {
        let context = self.get_context()?;
        Ok(self
            .subject_engine
            .render_template(&self.subject_template, &context)?)
    }

    /// Current context with the linked default attachments refreshed
    pub fn get_context(&mut self) -> Result<EmailContext> {
        let links: Vec<_> = self
            .get_default_attachments(true)?
            .into_iter()
            .filter_map(|(name, payload)| match payload {
                AttachmentPayload::Url(url) => Some(json!({ "name": name, "url": url })),
                AttachmentPayload::Bytes(_) => None,
            })
            .collect();
        self.context.insert(DEFAULT_ATTACHMENTS_KEY, links);
        Ok(self.context.clone())
    }

    /// Attachments of the resolved template with the requested link policy.
    ///
    /// Linked attachments come back as absolute URLs, inline ones as file
    /// contents keyed by basename. Empty when there is no template entity.
    pub fn get_default_attachments(
        &self,
        as_links: bool,
    ) -> Result<Vec<(String, AttachmentPayload)>> {
        let Some(object) = self.lookup_template_object()? else {
            return Ok(Vec::new());
        };

        let media = self.mailer.media();
        let mut attachments = Vec::new();
        for attachment in object.attachments_for(as_links) {
            if as_links {
                let url = self.build_absolute_uri(&media.url(attachment));
                attachments.push((attachment.get_name(), AttachmentPayload::Url(url)));
            } else {
                let content = media.read(attachment)?;
                attachments.push((attachment.file_name(), AttachmentPayload::Bytes(content)));
            }
        }
        Ok(attachments)
    }

    /// Merge `context` and render the body and subject
    pub fn render_message(&mut self, context: &EmailContext) -> Result<String> {
        self.context.extend(context.clone());
        let context = self.get_context()?;

        if !self.compiled {
            let template = self.template.as_deref().unwrap_or_default();
            self.engine.register_template(BODY_TEMPLATE, template)?;
            self.compiled = true;
        }

        self.message = self.engine.render(BODY_TEMPLATE, &context)?;
        self.subject = self
            .subject_engine
            .render_template(&self.subject_template, &context)?;
        Ok(self.message.clone())
    }

    fn message_object(
        &self,
        send_to: &[String],
        attachment_paths: &[PathBuf],
        options: SendOptions,
    ) -> Result<EmailMessage> {
        let mut message = EmailMessage::new(
            self.subject.clone(),
            self.message.clone(),
            self.from_email.clone(),
            send_to.to_vec(),
        );

        message.reply_to = match options.reply_to {
            Some(reply_to) => reply_to,
            None => self
                .mailer
                .settings()
                .default_reply_to_email
                .iter()
                .filter(|address| !address.is_empty())
                .cloned()
                .collect(),
        };
        message.cc = options.cc;
        message.bcc = options.bcc;
        for path in attachment_paths {
            message.attach_file(path)?;
        }
        for attachment in options.attachments {
            message.attach(attachment);
        }
        message.content_subtype = self.content_subtype;
        Ok(message)
    }

    /// Deliver the rendered message, returning how many messages went out
    pub fn send_email(
        &mut self,
        send_to: &[String],
        attachment_paths: &[PathBuf],
        options: SendOptions,
    ) -> Result<usize> {
        self.sent = 0;
        let fail_silently = options.fail_silently;
        let message = self.message_object(send_to, attachment_paths, options)?;

        match self.mailer.gateway().deliver(&message) {
            Ok(sent) => self.sent = sent,
            Err(e) if fail_silently => {
                error!("Problem sending email to {}: {}", send_to.join(", "), e);
            }
            Err(e) => return Err(e.into()),
        }

        Ok(self.sent)
    }

    /// Template attachments sent inside the message, read from media storage
    pub fn inline_attachments(&self) -> Result<Vec<MessageAttachment>> {
        Ok(self
            .get_default_attachments(false)?
            .into_iter()
            .filter_map(|(name, payload)| match payload {
                AttachmentPayload::Bytes(content) => Some(MessageAttachment::new(name, content)),
                AttachmentPayload::Url(_) => None,
            })
            .collect())
    }

    /// Resolve, render and deliver with the template's inline attachments
    pub fn send(
        &mut self,
        to: &[String],
        attachment_paths: &[PathBuf],
        mut options: SendOptions,
    ) -> Result<usize> {
        let mut attachments = self.inline_attachments()?;
        attachments.append(&mut options.attachments);
        options.attachments = attachments;

        self.get_object()?;
        self.render_message(&EmailContext::new())?;
        self.send_email(to, attachment_paths, options)?;

        if self.sent > 0 {
            info!("Mail has been sent to: {}", to.join(", "));
        }
        Ok(self.sent)
    }
}

impl fmt::Debug for EmailFromTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailFromTemplate")
            .field("name", &self.name)
            .field("language", &self.language)
            .field("subject", &self.subject)
            .field("template_source", &self.template_source)
            .field("sent", &self.sent)
            .finish()
    }
}
