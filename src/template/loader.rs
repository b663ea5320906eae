// ABOUTME: Default template sources bundled with the application
// ABOUTME: Loads template files by name from configured directories, with a legacy prefix fallback

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use super::error::{Result, TemplateError};

/// Source of default (non-database) template bodies.
pub trait TemplateLoader: Send + Sync {
    /// Load the template source for `name`, failing with [`TemplateError::NotFound`]
    fn load_default(&self, name: &str) -> Result<String>;
}

/// Loads templates from a list of directories.
///
/// Each directory is tried with the bare name first and then with the name
/// joined onto the prefix, so `welcome.html` also resolves
/// `<dir>/emailtemplates/welcome.html`.
#[derive(Debug, Clone, Default)]
pub struct FilesystemLoader {
    dirs: Vec<PathBuf>,
    prefix: Option<String>,
}

impl FilesystemLoader {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs, prefix: None }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = if prefix.is_empty() { None } else { Some(prefix) };
        self
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    fn candidates(&self, name: &str) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        for dir in &self.dirs {
            candidates.push(dir.join(name));
            if let Some(prefix) = &self.prefix {
                candidates.push(dir.join(prefix).join(name));
            }
        }
        candidates
    }
}

fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && Path::new(name)
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}

impl TemplateLoader for FilesystemLoader {
    fn load_default(&self, name: &str) -> Result<String> {
        if !is_safe_name(name) {
            return Err(TemplateError::NotFound {
                name: name.to_string(),
            });
        }

        for candidate in self.candidates(name) {
            match std::fs::read_to_string(&candidate) {
                Ok(source) => {
                    debug!("Loaded template {} from {}", name, candidate.display());
                    return Ok(source);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) if candidate.is_dir() => {
                    debug!("Skipping directory {}: {}", candidate.display(), e);
                    continue;
                }
                Err(e) => return Err(TemplateError::IoError(e)),
            }
        }

        Err(TemplateError::NotFound {
            name: name.to_string(),
        })
    }
}

/// In-memory template sources, handy for embedding defaults in a binary.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    templates: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.templates.insert(name.into(), source.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.templates.insert(name.into(), source.into());
    }
}

impl TemplateLoader for MemoryLoader {
    fn load_default(&self, name: &str) -> Result<String> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| TemplateError::NotFound {
                name: name.to_string(),
            })
    }
}
