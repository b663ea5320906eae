// ABOUTME: Attachment entity shared by stored templates and mass email messages
// ABOUTME: Ordering, link-vs-inline policy and media storage lookups for attachment files

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub id: u64,
    /// Display name, falls back to the file's basename
    #[serde(default)]
    pub name: String,
    /// Storage name relative to the media root, or an absolute URL
    pub attachment_file: String,
    /// Visible only in admin
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub ordering: u32,
    #[serde(default)]
    pub send_as_link: bool,
}

impl Attachment {
    pub fn new(attachment_file: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: String::new(),
            attachment_file: attachment_file.into(),
            comment: String::new(),
            ordering: 0,
            send_as_link: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_ordering(mut self, ordering: u32) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn as_link(mut self, send_as_link: bool) -> Self {
        self.send_as_link = send_as_link;
        self
    }

    /// Basename of the stored file
    pub fn file_name(&self) -> String {
        let trimmed = self.attachment_file.trim_end_matches('/');
        trimmed
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(trimmed)
            .to_string()
    }

    pub fn get_name(&self) -> String {
        if self.name.trim().is_empty() {
            self.file_name()
        } else {
            self.name.clone()
        }
    }
}

/// Attachments in enumeration order: ascending `ordering`, ties keep insertion order.
pub fn ordered(attachments: &[Attachment]) -> Vec<&Attachment> {
    let mut ordered: Vec<&Attachment> = attachments.iter().collect();
    ordered.sort_by_key(|attachment| attachment.ordering);
    ordered
}

pub(crate) fn is_absolute_url(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Where attachment files live on disk and how they are addressed over HTTP.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    url: String,
}

impl Default for MediaStorage {
    fn default() -> Self {
        Self::new(PathBuf::from("media"), "/media/")
    }
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url: url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative (or already absolute) URL of an attachment
    pub fn url(&self, attachment: &Attachment) -> String {
        if is_absolute_url(&attachment.attachment_file) {
            return attachment.attachment_file.clone();
        }
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            attachment.attachment_file.trim_start_matches('/')
        )
    }

    pub fn path(&self, attachment: &Attachment) -> PathBuf {
        self.root.join(attachment.attachment_file.trim_start_matches('/'))
    }

    /// Read the whole attachment file
    pub fn read(&self, attachment: &Attachment) -> io::Result<Vec<u8>> {
        if is_absolute_url(&attachment.attachment_file) {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!(
                    "remote attachment {} cannot be read from media storage",
                    attachment.attachment_file
                ),
            ));
        }
        std::fs::read(self.path(attachment))
    }
}
