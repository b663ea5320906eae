// ABOUTME: Command implementations for the emailtemplates CLI
// ABOUTME: Handles list, describe, save, preview, send and mass email commands

use anyhow::{anyhow, Context, Result};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

use super::args::Args;
use crate::admin::TemplateAdmin;
use crate::email::{EmailFromTemplate, Mailer, SendOptions};
use crate::models::{MassEmailMessage, StoredTemplate};
use crate::registry::EmailTemplateRegistry;
use crate::store::{MassMessageStore, StoreError, TemplateStore};
use crate::template::EmailContext;

/// Parameters of the `send` command
#[derive(Debug, Clone)]
pub struct SendRequest {
    pub name: String,
    pub to: Vec<String>,
    pub language: Option<String>,
    pub subject: Option<String>,
    pub vars: Vec<String>,
    pub attachments: Vec<PathBuf>,
    pub fail_silently: bool,
}

/// Print every registered template
pub fn list_templates(registry: &EmailTemplateRegistry, out: &mut dyn Write) -> Result<()> {
    let templates = registry.get_email_templates();
    if templates.is_empty() {
        writeln!(out, "No email templates registered")?;
        return Ok(());
    }

    for item in templates {
        if item.name() == item.path() {
            writeln!(out, "{}", item.path())?;
        } else {
            writeln!(out, "{} ({})", item.path(), item.name())?;
        }
        if !item.subject().is_empty() {
            writeln!(out, "  Subject: {}", item.subject())?;
        }
    }
    Ok(())
}

/// Print usage and context help of a registered template
pub fn describe_template(
    registry: &EmailTemplateRegistry,
    path: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let item = registry.get_registration(path)?;
    writeln!(out, "{}", item.path())?;
    if !item.help_text().is_empty() {
        writeln!(out, "  Usage: {}", item.help_text())?;
    }
    if !item.subject().is_empty() {
        writeln!(out, "  Subject: {}", item.subject())?;
    }

    let context = item.help_context();
    if !context.is_empty() {
        writeln!(out, "  Context:")?;
        for (key, description) in context {
            writeln!(out, "    {} - {}", key, description)?;
        }
    }
    Ok(())
}

/// Create or update the stored override of a template
pub fn save_template(
    admin: &TemplateAdmin,
    title: String,
    language: Option<String>,
    subject: Option<String>,
    content_file: Option<PathBuf>,
    out: &mut dyn Write,
) -> Result<()> {
    let mailer = admin.mailer();
    let language = language.unwrap_or_else(|| mailer.settings().language_code.clone());
    let content = match content_file {
        Some(path) => Some(
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read content file '{}'", path.display()))?,
        ),
        None => None,
    };

    let mut template = match mailer.store().find(&title, &language) {
        Ok(existing) => existing,
        Err(StoreError::NotFound { .. }) => StoredTemplate::new(title, language),
        Err(e) => return Err(e.into()),
    };
    if let Some(subject) = subject {
        template.subject = subject;
    }
    if let Some(content) = content {
        template.content = content;
    }

    admin.save_template(&mut template)?;
    info!("Saved email template {}", template);
    writeln!(
        out,
        "Saved template {} (id {})",
        template,
        template.id.unwrap_or_default()
    )?;
    Ok(())
}

/// Render a stored template with its example context
pub fn preview_template(admin: &TemplateAdmin, id: u64, out: &mut dyn Write) -> Result<()> {
    let html = admin.preview(id)?;
    writeln!(out, "{}", html)?;
    Ok(())
}

/// Resolve, render and send a template to the given recipients
pub fn send_template(mailer: &Mailer, request: SendRequest, out: &mut dyn Write) -> Result<()> {
    let variables = Args::parse_variables(&request.vars)?;

    let mut builder = EmailFromTemplate::builder(&request.name)
        .context(EmailContext::from_variables(&variables));
    if let Some(language) = request.language {
        builder = builder.language(language);
    }
    if let Some(subject) = request.subject {
        builder = builder.subject(subject);
    }
    let mut email = builder.build(mailer)?;

    let options = SendOptions::new().fail_silently(request.fail_silently);
    let sent = email.send(&request.to, &request.attachments, options)?;

    writeln!(
        out,
        "Template {} ({} source): {} message(s) sent",
        email.name(),
        email.template_source(),
        sent
    )?;
    Ok(())
}

/// Store a new mass email message
pub fn create_mass_email(
    mailer: &Mailer,
    subject: String,
    content_file: PathBuf,
    out: &mut dyn Write,
) -> Result<()> {
    let content = std::fs::read_to_string(&content_file).with_context(|| {
        format!("Failed to read content file '{}'", content_file.display())
    })?;

    let mut message = MassEmailMessage::new(subject, content);
    mailer.store().save_message(&mut message)?;
    let id = message
        .id
        .ok_or_else(|| anyhow!("Mass email message was not assigned an id"))?;

    writeln!(out, "Created mass email message {}", id)?;
    Ok(())
}

/// Send a stored mass email message
pub fn send_mass_email(
    admin: &TemplateAdmin,
    id: u64,
    force: bool,
    to: Vec<String>,
    out: &mut dyn Write,
) -> Result<()> {
    if !force && to.is_empty() {
        let notice = admin.send_mass_email(id)?;
        writeln!(out, "{}", notice.message())?;
        return Ok(());
    }

    let mailer = admin.mailer();
    let mut message = mailer.store().get_message(id)?;
    let recipients = if to.is_empty() { None } else { Some(to) };
    let success = message.send(mailer, recipients, force)?;

    if success {
        writeln!(out, "{}", crate::admin::SENT_SUCCESSFULLY)?;
    } else if message.sent() && !force {
        writeln!(out, "{}", crate::admin::ALREADY_SENT)?;
    } else {
        writeln!(out, "{}", crate::admin::SEND_FAILED)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::MemoryOutbox;
    use crate::registry::Registration;
    use crate::store::{MemoryStore, TemplateStore};
    use crate::template::MemoryLoader;
    use std::sync::Arc;

    fn setup() -> (TemplateAdmin, Arc<MemoryOutbox>) {
        let registry = Arc::new(EmailTemplateRegistry::new());
        registry
            .register(
                Registration::new("hello_template.html")
                    .name("Hello")
                    .help_text("Hello template")
                    .context("username", "Name of user in hello expression"),
            )
            .unwrap();
        let outbox = Arc::new(MemoryOutbox::new());
        let loader = MemoryLoader::new().with_template("hello_template.html", "Hello {{ username }}");
        let mailer = Mailer::new(Arc::new(MemoryStore::new()), Arc::new(loader), outbox.clone())
            .with_registry(registry);
        (TemplateAdmin::new(mailer), outbox)
    }

    fn output(buffer: Vec<u8>) -> String {
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_list_and_describe() {
        let (admin, _) = setup();
        let registry = admin.mailer().registry();

        let mut out = Vec::new();
        list_templates(registry, &mut out).unwrap();
        assert_eq!(output(out), "hello_template.html (Hello)\n");

        let mut out = Vec::new();
        describe_template(registry, "hello_template.html", &mut out).unwrap();
        let text = output(out);
        assert!(text.contains("Usage: Hello template"));
        assert!(text.contains("username - Name of user in hello expression"));

        let mut out = Vec::new();
        assert!(describe_template(registry, "unknown.html", &mut out).is_err());
    }

    #[test]
    fn test_save_creates_then_updates() {
        let (admin, _) = setup();
        let mut out = Vec::new();
        save_template(&admin, "hello_template.html".to_string(), None, None, None, &mut out)
            .unwrap();
        save_template(
            &admin,
            "hello_template.html".to_string(),
            None,
            Some("Hi {{ username }}".to_string()),
            None,
            &mut out,
        )
        .unwrap();

        let stored = admin.mailer().store().list_templates().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].content, "Hello {{ username }}");
        assert_eq!(stored[0].subject, "Hi {{ username }}");
    }

    #[test]
    fn test_send_template() {
        let (admin, outbox) = setup();
        let request = SendRequest {
            name: "hello_template.html".to_string(),
            to: vec!["ala@example.com".to_string()],
            language: None,
            subject: Some("Welcome".to_string()),
            vars: vec!["username=Ala".to_string()],
            attachments: Vec::new(),
            fail_silently: true,
        };

        let mut out = Vec::new();
        send_template(admin.mailer(), request, &mut out).unwrap();
        assert!(output(out).contains("(filesystem source): 1 message(s) sent"));

        let messages = outbox.messages();
        assert_eq!(messages[0].body, "Hello Ala");
        assert_eq!(messages[0].subject, "Welcome");
    }
}
