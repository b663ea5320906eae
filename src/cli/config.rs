// ABOUTME: Configuration management for the emailtemplates application
// ABOUTME: Loads mail settings, storage, delivery and registrations from YAML plus environment overrides

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::email::MailSettings;
use crate::registry::Registration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub default_from_email: String,
    pub default_reply_to_email: Option<String>,
    pub language_code: String,
    pub languages: Vec<String>,
    pub base_url: String,
    pub media_url: String,
    pub media_root: PathBuf,
    pub templates: TemplatesConfig,
    pub store: StoreConfig,
    pub delivery: DeliveryConfig,
    pub mass_email: MassEmailConfig,
    pub registrations: Vec<Registration>,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    pub dirs: Vec<PathBuf>,
    pub prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryBackend {
    #[default]
    Console,
    File,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub backend: DeliveryBackend,
    pub file_path: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MassEmailConfig {
    /// Name of a registered recipient provider
    pub recipients: Option<String>,
    pub users_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for Config {
    fn default() -> Self {
        let mail = MailSettings::default();
        Self {
            default_from_email: mail.default_from_email,
            default_reply_to_email: mail.default_reply_to_email,
            language_code: mail.language_code,
            languages: Vec::new(),
            base_url: mail.base_url,
            media_url: "/media/".to_string(),
            media_root: PathBuf::from("media"),
            templates: TemplatesConfig::default(),
            store: StoreConfig::default(),
            delivery: DeliveryConfig::default(),
            mass_email: MassEmailConfig::default(),
            registrations: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dirs: vec![PathBuf::from("templates")],
            prefix: "emailtemplates".to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("emailtemplates.json"),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            backend: DeliveryBackend::Console,
            file_path: PathBuf::from("outbox"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file path or default locations
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => Self::find_config_file(),
        };

        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            if contents.trim().is_empty() {
                Config::default()
            } else {
                serde_yaml::from_str(&contents)?
            }
        } else {
            Config::default()
        };

        config.merge_env();
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> PathBuf {
        let possible_paths = [
            PathBuf::from("emailtemplates.yaml"),
            PathBuf::from("emailtemplates.yml"),
            PathBuf::from(".emailtemplates.yaml"),
        ];

        for path in possible_paths {
            if path.exists() {
                return path;
            }
        }

        if let Some(home_dir) = dirs::home_dir() {
            let home_config = home_dir.join(".emailtemplates").join("config.yaml");
            if home_config.exists() {
                return home_config;
            }
        }

        // May not exist
        PathBuf::from("emailtemplates.yaml")
    }

    fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    /// Apply `EMAILTEMPLATES_*` overrides looked up through `var`
    pub fn merge_vars<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(from_email) = var("EMAILTEMPLATES_FROM_EMAIL") {
            self.default_from_email = from_email;
        }
        if let Some(reply_to) = var("EMAILTEMPLATES_REPLY_TO") {
            self.default_reply_to_email = Some(reply_to).filter(|r| !r.is_empty());
        }
        if let Some(language) = var("EMAILTEMPLATES_LANGUAGE") {
            self.language_code = language;
        }
        if let Some(base_url) = var("EMAILTEMPLATES_BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(store) = var("EMAILTEMPLATES_STORE") {
            self.store.path = PathBuf::from(store);
        }

        // Logging configuration
        if let Some(level) = var("EMAILTEMPLATES_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("EMAILTEMPLATES_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Mail defaults handed to every email builder
    pub fn mail_settings(&self) -> MailSettings {
        MailSettings {
            default_from_email: self.default_from_email.clone(),
            default_reply_to_email: self.default_reply_to_email.clone(),
            language_code: self.language_code.clone(),
            base_url: self.base_url.clone(),
        }
    }
}
