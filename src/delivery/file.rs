// ABOUTME: Delivery gateway writing each message to an .eml file in a directory
// ABOUTME: Useful for inspecting outgoing mail without a mail server

use std::path::{Path, PathBuf};
use tracing::info;

use super::error::Result;
use super::DeliveryGateway;
use crate::email::EmailMessage;

#[derive(Debug, Clone)]
pub struct FileGateway {
    dir: PathBuf,
}

impl FileGateway {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(message: &EmailMessage) -> String {
        let id: String = message
            .message_id
            .trim_matches(|c| c == '<' || c == '>')
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
            .collect();
        format!(
            "{}-{}.eml",
            chrono::Utc::now().format("%Y%m%d-%H%M%S"),
            id
        )
    }
}

impl DeliveryGateway for FileGateway {
    fn deliver(&self, message: &EmailMessage) -> Result<usize> {
        if message.recipients().is_empty() {
            return Ok(0);
        }

        let formatted = message.formatted()?;
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(Self::file_name(message));
        std::fs::write(&path, formatted)?;

        info!("Message written to {}", path.display());
        Ok(1)
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
