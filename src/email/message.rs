// ABOUTME: Fully built outgoing email message handed to a delivery gateway
// ABOUTME: Carries recipients, rendered content, attachments and an RFC 822 style rendition

use lettre::message::header::ContentType as MimeType;
use lettre::message::{Attachment as AttachmentPart, Mailbox, MultiPart, SinglePart};
use lettre::Message;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

use super::error::MessageError;

/// Content subtype of the message body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Html,
    Plain,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Html => "html",
            ContentType::Plain => "plain",
        }
    }

    pub fn escapes_html(&self) -> bool {
        matches!(self, ContentType::Html)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageAttachment {
    pub filename: String,
    #[serde(skip)]
    pub content: Vec<u8>,
    pub mimetype: String,
}

impl MessageAttachment {
    /// Attachment with a MIME type guessed from the file name
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        let filename = filename.into();
        let mimetype = mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            filename,
            content,
            mimetype,
        }
    }

    pub fn with_mimetype(mut self, mimetype: impl Into<String>) -> Self {
        self.mimetype = mimetype.into();
        self
    }

    /// Read a file from disk into an attachment named after its basename
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(filename, content))
    }

    /// Content as text when it is valid UTF-8
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub message_id: String,
    pub subject: String,
    pub body: String,
    pub from_email: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub reply_to: Vec<String>,
    pub attachments: Vec<MessageAttachment>,
    pub content_subtype: ContentType,
}

impl EmailMessage {
    pub fn new(
        subject: impl Into<String>,
        body: impl Into<String>,
        from_email: impl Into<String>,
        to: Vec<String>,
    ) -> Self {
        let from_email = from_email.into();
        let message_id = make_message_id(&from_email);
        Self {
            message_id,
            subject: subject.into(),
            body: body.into(),
            from_email,
            to,
            cc: Vec::new(),
            bcc: Vec::new(),
            reply_to: Vec::new(),
            attachments: Vec::new(),
            content_subtype: ContentType::default(),
        }
    }

    pub fn attach(&mut self, attachment: MessageAttachment) {
        self.attachments.push(attachment);
    }

    /// Read a file and attach it
    pub fn attach_file(&mut self, path: &Path) -> std::io::Result<()> {
        self.attachments.push(MessageAttachment::from_path(path)?);
        Ok(())
    }

    /// Every address the message goes to: to, cc and bcc
    pub fn recipients(&self) -> Vec<&str> {
        self.to
            .iter()
            .chain(self.cc.iter())
            .chain(self.bcc.iter())
            .map(String::as_str)
            .filter(|address| !address.is_empty())
            .collect()
    }

    /// Build the MIME message; line breaks and non-ASCII text in headers are encoded
    pub fn to_lettre(&self) -> Result<Message, MessageError> {
        let mut builder = Message::builder()
            .message_id(Some(self.message_id.clone()))
            .date_now()
            .from(mailbox(&self.from_email)?)
            .subject(self.subject.clone());
        for address in &self.to {
            builder = builder.to(mailbox(address)?);
        }
        for address in &self.cc {
            builder = builder.cc(mailbox(address)?);
        }
        for address in &self.bcc {
            builder = builder.bcc(mailbox(address)?);
        }
        for address in &self.reply_to {
            builder = builder.reply_to(mailbox(address)?);
        }

        let body_type = match self.content_subtype {
            ContentType::Html => MimeType::TEXT_HTML,
            ContentType::Plain => MimeType::TEXT_PLAIN,
        };

        let message = if self.attachments.is_empty() {
            builder.header(body_type).body(self.body.clone())
        } else {
            let mut parts = MultiPart::mixed().singlepart(
                SinglePart::builder()
                    .header(body_type)
                    .body(self.body.clone()),
            );
            for attachment in &self.attachments {
                let content_type = MimeType::parse(&attachment.mimetype).map_err(|_| {
                    MessageError::ContentType {
                        filename: attachment.filename.clone(),
                        mimetype: attachment.mimetype.clone(),
                    }
                })?;
                parts = parts.singlepart(
                    AttachmentPart::new(attachment.filename.clone())
                        .body(attachment.content.clone(), content_type),
                );
            }
            builder.multipart(parts)
        };

        message.map_err(|e| MessageError::Build {
            message: e.to_string(),
        })
    }

    /// RFC 822 rendition used by the console and file gateways
    pub fn formatted(&self) -> Result<String, MessageError> {
        let message = self.to_lettre()?;
        Ok(String::from_utf8_lossy(&message.formatted()).into_owned())
    }
}

fn mailbox(address: &str) -> Result<Mailbox, MessageError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| MessageError::Address {
            address: address.to_string(),
            message: e.to_string(),
        })
}

fn make_message_id(from_email: &str) -> String {
    let domain = from_email
        .rsplit_once('@')
        .map(|(_, domain)| domain.trim_end_matches('>'))
        .filter(|domain| !domain.is_empty())
        .unwrap_or("localhost");
    format!("<{}@{}>", Uuid::new_v4().simple(), domain)
}
