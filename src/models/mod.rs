// ABOUTME: Persisted entities: stored templates, attachments and mass email messages
// ABOUTME: Defines the common view the email builder uses to read template content

pub mod attachment;
pub mod mass_message;
pub mod stored_template;

pub use attachment::{ordered, Attachment, MediaStorage};
pub use mass_message::{MassEmailMessage, MASS_EMAIL_TEMPLATE};
pub use stored_template::StoredTemplate;

use std::fmt::Debug;

/// Anything that can supply template content to the email builder.
pub trait TemplateObject: Debug + Send + Sync {
    fn subject(&self) -> &str;
    fn content(&self) -> &str;
    fn attachments(&self) -> &[Attachment];

    /// Attachments with the requested link policy, in enumeration order
    fn attachments_for(&self, as_links: bool) -> Vec<&Attachment> {
        ordered(self.attachments())
            .into_iter()
            .filter(|attachment| attachment.send_as_link == as_links)
            .collect()
    }
}
