// ABOUTME: Main application orchestration for the emailtemplates CLI
// ABOUTME: Wires configuration into the registry, store, loader and gateway before running commands

use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use super::commands::{self, SendRequest};
use super::config::DeliveryBackend;
use super::{Args, Commands, Config, MassCommands};
use crate::admin::TemplateAdmin;
use crate::delivery::{ConsoleGateway, DeliveryGateway, FileGateway, MemoryOutbox};
use crate::email::Mailer;
use crate::mass::{
    mass_mailing_recipients, ActiveUserRecipients, FnRecipients, RecipientProvider,
    RecipientProviders, UserDirectory, YamlUserDirectory,
};
use crate::models::MediaStorage;
use crate::registry::{self, EmailTemplateRegistry};
use crate::store::JsonStore;
use crate::template::FilesystemLoader;

/// Name under which the active-user recipient provider is registered
pub const ACTIVE_USERS_PROVIDER: &str = "active_users";

pub struct App {
    config: Config,
    registry: Arc<EmailTemplateRegistry>,
    providers: RecipientProviders,
    outbox: Arc<MemoryOutbox>,
}

impl App {
    /// Create a new application registering configured templates in the process-wide registry
    pub fn new(config: Config) -> Result<Self> {
        Self::with_registry(config, registry::email_templates())
    }

    /// Create a new application around an explicit registry
    pub fn with_registry(config: Config, registry: Arc<EmailTemplateRegistry>) -> Result<Self> {
        registry.register_all(config.registrations.clone())?;
        Ok(Self {
            config,
            registry,
            providers: RecipientProviders::new(),
            outbox: Arc::new(MemoryOutbox::new()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Arc<EmailTemplateRegistry> {
        &self.registry
    }

    /// Messages kept by the `memory` delivery backend
    pub fn outbox(&self) -> &Arc<MemoryOutbox> {
        &self.outbox
    }

    /// Make a recipient provider selectable through `mass_email.recipients`
    pub fn register_recipients(&mut self, name: impl Into<String>, provider: Arc<dyn RecipientProvider>) {
        self.providers.register(name, provider);
    }

    /// Initialize logging based on configuration
    pub fn init_logging(&self, verbose: bool, no_color: bool) -> Result<()> {
        let log_level = if verbose {
            "debug"
        } else {
            &self.config.logging.level
        };

        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        match self.config.logging.format.as_str() {
            "compact" => {
                tracing_subscriber::fmt()
                    .compact()
                    .with_env_filter(env_filter)
                    .with_ansi(!no_color)
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .init();
            }
            _ => {
                tracing_subscriber::fmt()
                    .with_env_filter(env_filter)
                    .with_ansi(!no_color)
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .init();
            }
        }

        debug!("Logging initialized with level: {}", log_level);
        Ok(())
    }

    fn user_directory(&self) -> Result<Option<Arc<dyn UserDirectory>>> {
        match &self.config.mass_email.users_file {
            Some(path) => {
                let directory = YamlUserDirectory::load(path)?;
                Ok(Some(Arc::new(directory)))
            }
            None => Ok(None),
        }
    }

    fn gateway(&self) -> Arc<dyn DeliveryGateway> {
        match self.config.delivery.backend {
            DeliveryBackend::Console => Arc::new(ConsoleGateway::new()),
            DeliveryBackend::File => Arc::new(FileGateway::new(self.config.delivery.file_path.clone())),
            DeliveryBackend::Memory => self.outbox.clone(),
        }
    }

    /// Build the mailer described by the configuration
    pub fn mailer(&self) -> Result<Mailer> {
        let config = &self.config;
        let loader = FilesystemLoader::new(config.templates.dirs.clone())
            .with_prefix(config.templates.prefix.clone());

        let directory = self.user_directory()?;
        let mut providers = self.providers.clone();
        if let Some(directory) = &directory {
            providers.register(
                ACTIVE_USERS_PROVIDER,
                Arc::new(ActiveUserRecipients::new(directory.clone())),
            );
        }
        let configured = config.mass_email.recipients.clone();
        let recipients = FnRecipients(move || {
            mass_mailing_recipients(configured.as_deref(), &providers, directory.clone())
        });

        Ok(Mailer::new(
            Arc::new(JsonStore::new(config.store.path.clone())),
            Arc::new(loader),
            self.gateway(),
        )
        .with_registry(self.registry.clone())
        .with_recipients(Arc::new(recipients))
        .with_media(MediaStorage::new(config.media_root.clone(), config.media_url.clone()))
        .with_settings(config.mail_settings()))
    }

    pub fn admin(&self) -> Result<TemplateAdmin> {
        Ok(TemplateAdmin::new(self.mailer()?).with_languages(self.config.languages.clone()))
    }

    /// Run the application with parsed arguments
    pub fn run(&mut self, args: Args) -> Result<()> {
        self.init_logging(args.verbose, args.no_color)?;

        info!("Starting emailtemplates v{}", env!("CARGO_PKG_VERSION"));
        debug!("Configuration loaded from: {:?}", args.config);

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        self.execute(args.command, &mut out)
    }

    /// Execute one command, writing its output to `out`
    pub fn execute(&self, command: Commands, out: &mut dyn Write) -> Result<()> {
        match command {
            Commands::List => commands::list_templates(&self.registry, out),

            Commands::Describe { path } => commands::describe_template(&self.registry, &path, out),

            Commands::Save {
                title,
                language,
                subject,
                content_file,
            } => commands::save_template(&self.admin()?, title, language, subject, content_file, out),

            Commands::Preview { id } => commands::preview_template(&self.admin()?, id, out),

            Commands::Send {
                name,
                to,
                language,
                subject,
                vars,
                attachments,
                no_fail_silently,
            } => {
                let request = SendRequest {
                    name,
                    to,
                    language,
                    subject,
                    vars,
                    attachments,
                    fail_silently: !no_fail_silently,
                };
                commands::send_template(&self.mailer()?, request, out)
            }

            Commands::Mass { command } => match command {
                MassCommands::Create {
                    subject,
                    content_file,
                } => commands::create_mass_email(&self.mailer()?, subject, content_file, out),
                MassCommands::Send { id, force, to } => {
                    commands::send_mass_email(&self.admin()?, id, force, to, out)
                }
            },
        }
    }

    /// Create application from command line arguments
    pub fn from_args(args: &Args) -> Result<Self> {
        let config = Config::load(args.config.clone())?;
        Self::new(config)
    }

    /// Path of the JSON store used by this application
    pub fn store_path(&self) -> &PathBuf {
        &self.config.store.path
    }
}
