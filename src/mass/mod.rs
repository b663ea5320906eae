// ABOUTME: Bulk sending of mass email messages, one message per recipient
// ABOUTME: Enforces a single send per job unless forced and records when the job went out

pub mod error;
pub mod recipients;

pub use error::RecipientError;
pub use recipients::{
    mass_mailing_recipients, ActiveUserRecipients, FnRecipients, RecipientProvider,
    RecipientProviders, StaticRecipients, UserDirectory, UserRecord, YamlUserDirectory,
};

use std::sync::Arc;
use tracing::{info, warn};

use crate::email::{EmailFromTemplate, Mailer, Result, SendOptions};
use crate::template::EmailContext;
use crate::models::{MassEmailMessage, TemplateObject, MASS_EMAIL_TEMPLATE};
use crate::store::MassMessageStore;

impl MassEmailMessage {
    /// Send the message to every recipient.
    ///
    /// `recipients` defaults to the mailer's recipient provider. Returns
    /// `false` without sending when the job already went out and `force` is
    /// not set. The template is resolved and rendered once for all
    /// recipients. The job is marked sent and saved once every recipient was
    /// attempted, and the result tells whether all of them succeeded.
    pub fn send(
        &mut self,
        mailer: &Mailer,
        recipients: Option<Vec<String>>,
        force: bool,
    ) -> Result<bool> {
        if self.sent() && !force {
            return Ok(false);
        }

        let recipients = recipients.unwrap_or_else(|| mailer.recipients().recipients());
        let object: Arc<dyn TemplateObject> = Arc::new(self.clone());
        let mut email = EmailFromTemplate::builder(MASS_EMAIL_TEMPLATE)
            .subject(self.subject.clone())
            .registry_validation(false)
            .template_object(object)
            .build(mailer)?;

        let attachments = email.inline_attachments()?;
        email.get_object()?;
        email.render_message(&EmailContext::new())?;

        let mut sent_count = 0;
        for recipient in &recipients {
            let to = [recipient.clone()];
            let options = SendOptions {
                attachments: attachments.clone(),
                ..SendOptions::default()
            };
            match email.send_email(&to, &[], options) {
                Ok(sent) if sent > 0 => {
                    sent_count += 1;
                    info!("Successfully sent mass email message to user {}", recipient);
                }
                Ok(_) => warn!("Error sending mass email message to user {}", recipient),
                Err(e) => warn!(
                    "Error sending mass email message to user {}: {}",
                    recipient, e
                ),
            }
        }

        let mut sent = self.clone();
        sent.mark_sent();
        mailer.store().save_message(&mut sent)?;
        *self = sent;

        Ok(sent_count == recipients.len())
    }
}
