// ABOUTME: In-memory store used by tests and embedding applications
// ABOUTME: Rows live for the lifetime of the store instance

use std::sync::{PoisonError, RwLock};

use super::error::Result;
use super::tables::Tables;
use super::{MassMessageStore, TemplateStore};
use crate::models::{MassEmailMessage, StoredTemplate};

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> Result<T>) -> Result<T> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        f(&tables)
    }

    fn write<T>(&self, f: impl FnOnce(&mut Tables) -> Result<T>) -> Result<T> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut tables)
    }

    #[cfg(test)]
    pub(crate) fn push_raw_template(&self, row: serde_json::Value) {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        tables.push_raw_template(row);
    }
}

impl TemplateStore for MemoryStore {
    fn find(&self, title: &str, language: &str) -> Result<StoredTemplate> {
        self.read(|tables| tables.find_template(title, language))
    }

    fn get_template(&self, id: u64) -> Result<StoredTemplate> {
        self.read(|tables| tables.get_template(id))
    }

    fn list_templates(&self) -> Result<Vec<StoredTemplate>> {
        self.read(|tables| tables.list_templates())
    }

    fn save_template(&self, template: &mut StoredTemplate) -> Result<()> {
        *template = self.write(|tables| tables.save_template(template))?;
        Ok(())
    }
}

impl MassMessageStore for MemoryStore {
    fn get_message(&self, id: u64) -> Result<MassEmailMessage> {
        self.read(|tables| tables.get_message(id))
    }

    fn list_messages(&self) -> Result<Vec<MassEmailMessage>> {
        self.read(|tables| tables.list_messages())
    }

    fn save_message(&self, message: &mut MassEmailMessage) -> Result<()> {
        *message = self.write(|tables| tables.save_message(message))?;
        Ok(())
    }
}
