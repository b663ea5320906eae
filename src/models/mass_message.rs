// ABOUTME: Bulk email job entity with a single subject and body
// ABOUTME: Tracks whether the job was sent and carries message-specific attachments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attachment::Attachment;
use super::TemplateObject;

/// Template name used when rendering mass messages.
pub const MASS_EMAIL_TEMPLATE: &str = "emailtemplates/mass_email.html";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassEmailMessage {
    #[serde(default)]
    pub id: Option<u64>,
    pub subject: String,
    pub content: String,
    #[serde(default)]
    pub date_sent: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl MassEmailMessage {
    pub fn new(subject: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: None,
            subject: subject.into(),
            content: content.into(),
            date_sent: None,
            attachments: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn sent(&self) -> bool {
        self.date_sent.is_some()
    }

    pub fn mark_sent(&mut self) {
        self.date_sent = Some(Utc::now());
    }
}

impl TemplateObject for MassEmailMessage {
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

    #[test]
    fn test_sent_follows_date_sent() {
        let mut message = MassEmailMessage::new("Temat maila", "<p>Treść emaila</p>");
        assert!(!message.sent());
        message.mark_sent();
        assert!(message.sent());
    }
}
