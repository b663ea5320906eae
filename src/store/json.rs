// ABOUTME: JSON file backed store for the command line tool
// ABOUTME: Loads the file per operation and rewrites it atomically after each mutation

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

use super::error::Result;
use super::tables::Tables;
use super::{MassMessageStore, TemplateStore};
use crate::models::{MassEmailMessage, StoredTemplate};

#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Tables> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(Tables::default()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Tables::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn persist(&self, tables: &Tables) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let contents = serde_json::to_string_pretty(tables)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, contents)?;
        std::fs::rename(&tmp_path, &self.path)?;

        debug!("Store written to {}", self.path.display());
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> Result<T>) -> Result<T> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let tables = self.load()?;
        f(&tables)
    }

    fn write<T>(&self, f: impl FnOnce(&mut Tables) -> Result<T>) -> Result<T> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut tables = self.load()?;
        let result = f(&mut tables)?;
        self.persist(&tables)?;
        Ok(result)
    }
}

impl TemplateStore for JsonStore {
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

impl MassMessageStore for JsonStore {
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
