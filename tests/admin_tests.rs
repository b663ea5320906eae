// ABOUTME: Integration tests for administrative template editing and mass email triggers
// ABOUTME: Validates saves, previews and user-facing notices against a JSON store

use emailtemplates::admin::{AdminError, Notice, TemplateAdmin};
use emailtemplates::models::{MassEmailMessage, StoredTemplate};
use emailtemplates::store::{MassMessageStore, StoreError, TemplateStore};

mod common;
use common::{TestEnvironment, TestMailer, HELLO_TEMPLATE, SUPPORT_TEMPLATE};

fn admin(fx: &TestMailer) -> TemplateAdmin {
    TemplateAdmin::new(fx.mailer.clone()).with_languages(vec!["en".to_string(), "pl".to_string()])
}

#[test]
fn test_first_save_fills_defaults() {
    let env = TestEnvironment::new();
    env.write_template(HELLO_TEMPLATE, "<h1>TEST DEFAULT CONTENT</h1>");
    let fx = TestMailer::new(&env);
    let admin = admin(&fx);

    let mut template = StoredTemplate::new(HELLO_TEMPLATE, "en");
    admin.save_template(&mut template).unwrap();
    assert_eq!(template.content, "<h1>TEST DEFAULT CONTENT</h1>");
    assert_eq!(template.subject, "Hello {{ username }}");

    let mut custom = StoredTemplate::new(HELLO_TEMPLATE, "pl").with_content("<h1>New content</h1>");
    admin.save_template(&mut custom).unwrap();
    assert_eq!(custom.content, "<h1>New content</h1>");

    let mut duplicate = StoredTemplate::new(HELLO_TEMPLATE, "en").with_content("x");
    assert!(matches!(
        admin.save_template(&mut duplicate),
        Err(AdminError::Store(StoreError::Conflict { .. }))
    ));
}

#[test]
fn test_later_saves_keep_blank_fields() {
    let env = TestEnvironment::new();
    env.write_template(SUPPORT_TEMPLATE, "default body");
    let fx = TestMailer::new(&env);
    let admin = admin(&fx);

    let mut template = StoredTemplate::new(SUPPORT_TEMPLATE, "en").with_content("custom");
    admin.save_template(&mut template).unwrap();

    template.content = String::new();
    admin.save_template(&mut template).unwrap();
    let stored = fx.store.get_template(template.id.unwrap()).unwrap();
    assert_eq!(stored.content, "");
    assert!(stored.modified >= stored.created);
}

#[test]
fn test_syntax_errors_are_field_errors() {
    let env = TestEnvironment::new();
    let fx = TestMailer::new(&env);
    let admin = admin(&fx);

    let mut broken =
        StoredTemplate::new(HELLO_TEMPLATE, "en").with_content("{{#each items}}x{{/if}}");
    let err = admin.save_template(&mut broken).unwrap_err();
    assert_eq!(err.field(), Some("content"));
    assert!(broken.is_new());
    assert!(fx.store.list_templates().unwrap().is_empty());
}

#[test]
fn test_preview_renders_example_context() {
    let env = TestEnvironment::new();
    let fx = TestMailer::new(&env);
    let admin = admin(&fx);

    let mut template = StoredTemplate::new(SUPPORT_TEMPLATE, "en")
        .with_content("{{ user_name }} / {{ personal_message }}");
    admin.save_template(&mut template).unwrap();

    let preview = admin.preview(template.id.unwrap()).unwrap();
    assert_eq!(preview, "&lt;user_name&gt; / &lt;personal_message&gt;");
    assert!(fx.outbox.is_empty());
}

#[test]
fn test_mass_email_trigger_is_idempotent() {
    let env = TestEnvironment::new();
    let fx = TestMailer::new(&env);
    let mailer = fx.mailer.clone().with_recipients(std::sync::Arc::new(
        emailtemplates::mass::StaticRecipients(vec!["a@x.com".to_string(), "b@x.com".to_string()]),
    ));
    let admin = TemplateAdmin::new(mailer);

    let mut message = MassEmailMessage::new("Subject", "Body");
    fx.store.save_message(&mut message).unwrap();
    let id = message.id.unwrap();

    let first = admin.send_mass_email(id).unwrap();
    assert!(matches!(first, Notice::Success(_)));
    assert_eq!(first.message(), "Mass email sent successfully");

    let second = admin.send_mass_email(id).unwrap();
    assert_eq!(
        second.message(),
        "Mass email was already sent. Create new mail message or force sending from shell."
    );
    assert_eq!(fx.outbox.len(), 2);
}
