// ABOUTME: Pluggable sources of mass email recipients
// ABOUTME: Defaults to the distinct, non-empty emails of active users in a user directory

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use super::error::{RecipientError, Result};

/// Produces the addresses a mass email is sent to.
pub trait RecipientProvider: Send + Sync {
    fn recipients(&self) -> Vec<String>;
}

/// A fixed list of addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticRecipients(pub Vec<String>);

impl RecipientProvider for StaticRecipients {
    fn recipients(&self) -> Vec<String> {
        self.0.clone()
    }
}

/// Adapts a closure into a provider.
pub struct FnRecipients<F>(pub F);

impl<F> RecipientProvider for FnRecipients<F>
where
    F: Fn() -> Vec<String> + Send + Sync,
{
    fn recipients(&self) -> Vec<String> {
        (self.0)()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Where user accounts are kept.
pub trait UserDirectory: Send + Sync {
    fn users(&self) -> Vec<UserRecord>;
}

/// User accounts loaded from a YAML list.
#[derive(Debug, Clone, Default)]
pub struct YamlUserDirectory {
    users: Vec<UserRecord>,
}

impl YamlUserDirectory {
    pub fn new(users: Vec<UserRecord>) -> Self {
        Self { users }
    }

    /// Load users from a YAML file containing a list of records
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| RecipientError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| RecipientError::ParseError {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(Self {
            users: serde_yaml::from_str(content)?,
        })
    }
}

impl UserDirectory for YamlUserDirectory {
    fn users(&self) -> Vec<UserRecord> {
        self.users.clone()
    }
}

/// Distinct, non-empty emails of active users.
pub struct ActiveUserRecipients {
    directory: Arc<dyn UserDirectory>,
}

impl ActiveUserRecipients {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }
}

impl RecipientProvider for ActiveUserRecipients {
    fn recipients(&self) -> Vec<String> {
        let emails: IndexSet<String> = self
            .directory
            .users()
            .into_iter()
            .filter(|user| user.is_active)
            .filter_map(|user| user.email)
            .filter(|email| !email.is_empty())
            .collect();
        emails.into_iter().collect()
    }
}

/// Named recipient providers that configuration can select from.
#[derive(Clone, Default)]
pub struct RecipientProviders {
    providers: IndexMap<String, Arc<dyn RecipientProvider>>,
}

impl RecipientProviders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn RecipientProvider>) {
        self.providers.insert(name.into(), provider);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn RecipientProvider>> {
        self.providers.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for RecipientProviders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecipientProviders")
            .field("providers", &self.names())
            .finish()
    }
}

/// All mass email recipients.
///
/// A configured provider name takes precedence; an unknown name yields no
/// recipients. Without one, the active users of `directory` are used.
pub fn mass_mailing_recipients(
    configured: Option<&str>,
    providers: &RecipientProviders,
    directory: Option<Arc<dyn UserDirectory>>,
) -> Vec<String> {
    if let Some(name) = configured {
        return match providers.get(name) {
            Some(provider) => provider.recipients(),
            None => {
                warn!("Recipient provider {} is not registered, no recipients", name);
                Vec::new()
            }
        };
    }

    match directory {
        Some(directory) => ActiveUserRecipients::new(directory).recipients(),
        None => {
            debug!("No user directory configured, no mass email recipients");
            Vec::new()
        }
    }
}
