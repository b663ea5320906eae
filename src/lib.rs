// ABOUTME: Main library module for the emailtemplates crate
// ABOUTME: Exports the registry, template resolution, delivery, mass mailing and admin APIs

pub mod admin;
pub mod cli;
pub mod delivery;
pub mod email;
pub mod mass;
pub mod models;
pub mod registry;
pub mod store;
pub mod template;

// Re-export commonly used types
pub use admin::{Notice, TemplateAdmin};
pub use cli::{App, Args, Config};
pub use delivery::{DeliveryGateway, MemoryOutbox};
pub use email::{send_email, EmailFromTemplate, Mailer, MailSettings, SendOptions, TemplateSource};
pub use models::{Attachment, MassEmailMessage, StoredTemplate};
pub use registry::{email_templates, EmailTemplateRegistry, Registration, RegistrationItem};
pub use template::EmailContext;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
