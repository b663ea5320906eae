// ABOUTME: Row tables shared by the memory and JSON file stores
// ABOUTME: Keeps rows as raw JSON so a single malformed row decodes lazily and fails alone

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::error::{Result, StoreError};
use crate::models::{Attachment, MassEmailMessage, StoredTemplate};

const TEMPLATE: &str = "EmailTemplate";
const MESSAGE: &str = "MassEmailMessage";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Tables {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    templates: Vec<JsonValue>,
    #[serde(default)]
    messages: Vec<JsonValue>,
}

fn row_id(row: &JsonValue) -> Option<u64> {
    row.get("id").and_then(JsonValue::as_u64)
}

fn row_str<'a>(row: &'a JsonValue, field: &str) -> Option<&'a str> {
    row.get(field).and_then(JsonValue::as_str)
}

fn decode<T: for<'de> Deserialize<'de>>(
    row: &JsonValue,
    entity: &'static str,
    key: String,
) -> Result<T> {
    serde_json::from_value(row.clone()).map_err(|e| StoreError::Decode {
        entity,
        key,
        message: e.to_string(),
    })
}

impl Tables {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn assign_attachment_ids(&mut self, attachments: &mut [Attachment]) {
        for attachment in attachments.iter_mut().filter(|a| a.id == 0) {
            attachment.id = self.allocate_id();
        }
    }

    pub(crate) fn find_template(&self, title: &str, language: &str) -> Result<StoredTemplate> {
        let key = format!("{} ({})", title, language);
        let row = self
            .templates
            .iter()
            .find(|row| row_str(row, "title") == Some(title) && row_str(row, "language") == Some(language))
            .ok_or_else(|| StoreError::NotFound {
                entity: TEMPLATE,
                key: key.clone(),
            })?;
        decode(row, TEMPLATE, key)
    }

    pub(crate) fn get_template(&self, id: u64) -> Result<StoredTemplate> {
        let row = self
            .templates
            .iter()
            .find(|row| row_id(row) == Some(id))
            .ok_or_else(|| StoreError::NotFound {
                entity: TEMPLATE,
                key: id.to_string(),
            })?;
        decode(row, TEMPLATE, id.to_string())
    }

    pub(crate) fn list_templates(&self) -> Result<Vec<StoredTemplate>> {
        self.templates
            .iter()
            .map(|row| {
                let key = row_id(row).map(|id| id.to_string()).unwrap_or_default();
                decode(row, TEMPLATE, key)
            })
            .collect()
    }

    /// Insert or update a row, returning the entity as stored.
    ///
    /// The caller's value is left untouched so a failed persist does not
    /// leave ids or timestamps on an unsaved entity.
    pub(crate) fn save_template(&mut self, template: &StoredTemplate) -> Result<StoredTemplate> {
        let duplicate = self.templates.iter().any(|row| {
            row_str(row, "title") == Some(template.title.as_str())
                && row_str(row, "language") == Some(template.language.as_str())
                && row_id(row) != template.id
        });
        if duplicate {
            return Err(StoreError::Conflict {
                message: format!(
                    "email template {} already exists for language {}",
                    template.title, template.language
                ),
            });
        }

        let mut saved = template.clone();
        let position = match saved.id {
            Some(id) => {
                let position = self
                    .templates
                    .iter()
                    .position(|row| row_id(row) == Some(id))
                    .ok_or_else(|| StoreError::NotFound {
                        entity: TEMPLATE,
                        key: id.to_string(),
                    })?;
                saved.modified = Utc::now();
                Some(position)
            }
            None => {
                saved.id = Some(self.allocate_id());
                None
            }
        };
        self.assign_attachment_ids(&mut saved.attachments);

        let row = serde_json::to_value(&saved)?;
        match position {
            Some(position) => self.templates[position] = row,
            None => self.templates.push(row),
        }
        Ok(saved)
    }

    pub(crate) fn get_message(&self, id: u64) -> Result<MassEmailMessage> {
        let row = self
            .messages
            .iter()
            .find(|row| row_id(row) == Some(id))
            .ok_or_else(|| StoreError::NotFound {
                entity: MESSAGE,
                key: id.to_string(),
            })?;
        decode(row, MESSAGE, id.to_string())
    }

    pub(crate) fn list_messages(&self) -> Result<Vec<MassEmailMessage>> {
        self.messages
            .iter()
            .map(|row| {
                let key = row_id(row).map(|id| id.to_string()).unwrap_or_default();
                decode(row, MESSAGE, key)
            })
            .collect()
    }

    pub(crate) fn save_message(&mut self, message: &MassEmailMessage) -> Result<MassEmailMessage> {
        let mut saved = message.clone();
        let position = match saved.id {
            Some(id) => Some(
                self.messages
                    .iter()
                    .position(|row| row_id(row) == Some(id))
                    .ok_or_else(|| StoreError::NotFound {
                        entity: MESSAGE,
                        key: id.to_string(),
                    })?,
            ),
            None => {
                saved.id = Some(self.allocate_id());
                None
            }
        };
        self.assign_attachment_ids(&mut saved.attachments);

        let row = serde_json::to_value(&saved)?;
        match position {
            Some(position) => self.messages[position] = row,
            None => self.messages.push(row),
        }
        Ok(saved)
    }

    #[cfg(test)]
    pub(crate) fn push_raw_template(&mut self, row: JsonValue) {
        self.templates.push(row);
    }
}
