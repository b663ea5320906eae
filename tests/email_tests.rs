// ABOUTME: Integration tests for resolving, rendering and sending templated emails
// ABOUTME: Exercises the database, filesystem and default tiers against a JSON store and template directory

use serde_json::json;
use std::sync::Arc;

use emailtemplates::delivery::MemoryOutbox;
use emailtemplates::email::{self, EmailError, EmailFromTemplate, Mailer, SendOptions, TemplateSource};
use emailtemplates::models::{Attachment, StoredTemplate};
use emailtemplates::registry::RegistryError;
use emailtemplates::store::TemplateStore;
use emailtemplates::template::{EmailContext, FilesystemLoader};

mod common;
use common::{TestEnvironment, TestMailer, HELLO_TEMPLATE, SUPPORT_TEMPLATE};

fn context(value: serde_json::Value) -> EmailContext {
    EmailContext::from_serialize(&value).unwrap()
}

#[test]
fn test_registered_paths_resolve_and_unknown_paths_fail() {
    let env = TestEnvironment::new();
    let fx = TestMailer::new(&env);

    for path in fx.registry.get_email_template_names() {
        assert!(fx.registry.get_registration(&path).is_ok());
    }
    assert!(matches!(
        fx.registry.get_registration("missing.html"),
        Err(RegistryError::NotRegistered { .. })
    ));
    assert!(matches!(
        EmailFromTemplate::builder("missing.html").build(&fx.mailer),
        Err(EmailError::Registry(RegistryError::NotRegistered { .. }))
    ));
}

#[test]
fn test_default_tier_renders_literal_template() {
    let env = TestEnvironment::new();
    let fx = TestMailer::new(&env);

    let mut email = EmailFromTemplate::builder(SUPPORT_TEMPLATE)
        .template("{{ user_name }}, {{ personal_message }}")
        .subject("Support")
        .build(&fx.mailer)
        .unwrap();

    assert_eq!(email.get_object().unwrap(), TemplateSource::Default);
    let body = email
        .render_message(&context(json!({"user_name": "Alibaba", "personal_message": "Hi!"})))
        .unwrap();
    assert_eq!(body, "Alibaba, Hi!");
    assert_eq!(email.subject(), "Support");
}

#[test]
fn test_filesystem_tier_with_prefix() {
    let env = TestEnvironment::new();
    env.write_template(SUPPORT_TEMPLATE, "<p>{{ user_name }}: {{ personal_message }}</p>");
    let fx = TestMailer::new(&env);

    let mut email = EmailFromTemplate::builder(SUPPORT_TEMPLATE)
        .build(&fx.mailer)
        .unwrap();
    assert_eq!(email.get_object().unwrap(), TemplateSource::Filesystem);

    let body = email
        .render_message(&context(json!({
            "user_name": "Alibaba",
            "personal_message": "I'd like <b>that</b>"
        })))
        .unwrap();
    assert_eq!(
        body,
        "<p>Alibaba: I&#x27;d like &lt;b&gt;that&lt;/b&gt;</p>"
    );
}

#[test]
fn test_database_tier_wins_over_filesystem() {
    let env = TestEnvironment::new();
    env.write_template(HELLO_TEMPLATE, "file version");
    let fx = TestMailer::new(&env);

    let mut stored = StoredTemplate::new(HELLO_TEMPLATE, "pl")
        .with_subject("Cześć {{ username }}")
        .with_content("<h1>Cześć {{ username }}</h1>");
    fx.store.save_template(&mut stored).unwrap();

    let mut polish = EmailFromTemplate::builder(HELLO_TEMPLATE)
        .language("pl")
        .subject("Ignored")
        .context(context(json!({"username": "Ala"})))
        .build(&fx.mailer)
        .unwrap();
    assert_eq!(polish.get_object().unwrap(), TemplateSource::Database);
    assert_eq!(polish.subject(), "Cześć Ala");

    let mut english = EmailFromTemplate::builder(HELLO_TEMPLATE)
        .build(&fx.mailer)
        .unwrap();
    assert_eq!(english.get_object().unwrap(), TemplateSource::Filesystem);
}

#[test]
fn test_send_builds_complete_message() {
    let env = TestEnvironment::new();
    env.write_media("terms.txt", "Terms of service");
    let extra = env.write_file(std::path::Path::new("invoice.txt"), "Invoice 1");
    let fx = TestMailer::new(&env);

    let mut stored = StoredTemplate::new(HELLO_TEMPLATE, "en")
        .with_subject("Hello {{ username }}")
        .with_content("<p>{{#each default_attachments}}<a href=\"{{url}}\">{{name}}</a>{{/each}}</p>")
        .with_attachment(Attachment::new("guide.pdf").with_name("Guide").as_link(true))
        .with_attachment(Attachment::new("terms.txt"));
    fx.store.save_template(&mut stored).unwrap();

    let mut email = EmailFromTemplate::builder(HELLO_TEMPLATE)
        .context(context(json!({"username": "Ala"})))
        .build(&fx.mailer)
        .unwrap();
    let sent = email
        .send(
            &["ala@example.com".to_string()],
            &[extra],
            SendOptions::new().cc(vec!["boss@example.com".to_string()]),
        )
        .unwrap();
    assert_eq!(sent, 1);

    let message = &fx.outbox.messages()[0];
    assert_eq!(message.subject, "Hello Ala");
    assert_eq!(message.from_email, "noreply@example.com");
    assert_eq!(message.reply_to, vec!["support@example.com"]);
    assert_eq!(message.cc, vec!["boss@example.com"]);
    assert_eq!(
        message.body,
        "<p><a href=\"http://example.com/media/guide.pdf\">Guide</a></p>"
    );

    let names: Vec<_> = message.attachments.iter().map(|a| a.filename.as_str()).collect();
    assert_eq!(names, vec!["invoice.txt", "terms.txt"]);
}

#[test]
fn test_context_values_cannot_add_headers_through_the_subject() {
    let env = TestEnvironment::new();
    env.write_template(HELLO_TEMPLATE, "<p>Hello</p>");
    let fx = TestMailer::new(&env);

    let mut email = EmailFromTemplate::builder(HELLO_TEMPLATE)
        .subject("Hi {{ username }}")
        .context(context(json!({"username": "Bob\r\nBcc: attacker@evil.com"})))
        .build(&fx.mailer)
        .unwrap();
    let sent = email
        .send(&["bob@example.com".to_string()], &[], SendOptions::default())
        .unwrap();
    assert_eq!(sent, 1);

    let formatted = fx.outbox.messages()[0].formatted().unwrap();
    assert!(!formatted.contains("\r\nBcc: attacker@evil.com\r\n"));
    assert!(!formatted.lines().any(|line| line.starts_with("Bcc:")));
}

#[test]
fn test_subject_is_rendered_without_html_escaping() {
    let env = TestEnvironment::new();
    env.write_template(HELLO_TEMPLATE, "<p>{{ username }}</p>");
    let fx = TestMailer::new(&env);

    let mut email = EmailFromTemplate::builder(HELLO_TEMPLATE)
        .subject("Hello {{ username }}")
        .context(context(json!({"username": "Tom & Jerry"})))
        .build(&fx.mailer)
        .unwrap();
    email
        .send(&["tom@example.com".to_string()], &[], SendOptions::default())
        .unwrap();

    let message = &fx.outbox.messages()[0];
    assert_eq!(message.subject, "Hello Tom & Jerry");
    assert_eq!(message.body, "<p>Tom &amp; Jerry</p>");
}

#[test]
fn test_link_attachments_follow_ordering() {
    let env = TestEnvironment::new();
    let fx = TestMailer::new(&env);

    let mut stored = StoredTemplate::new(HELLO_TEMPLATE, "en")
        .with_content("body")
        .with_attachment(Attachment::new("a.pdf").with_name("A").with_ordering(10).as_link(true))
        .with_attachment(Attachment::new("b.pdf").with_name("B").with_ordering(1).as_link(true));
    fx.store.save_template(&mut stored).unwrap();

    let email = EmailFromTemplate::builder(HELLO_TEMPLATE)
        .build(&fx.mailer)
        .unwrap();
    let names: Vec<_> = email
        .get_default_attachments(true)
        .unwrap()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(names, vec!["B", "A"]);
}

#[test]
fn test_fail_silently_policy() {
    let env = TestEnvironment::new();
    let fx = TestMailer::new(&env);
    fx.outbox.fail_deliveries(true);

    let to = vec!["ala@example.com".to_string()];
    let mut email = EmailFromTemplate::builder(HELLO_TEMPLATE)
        .build(&fx.mailer)
        .unwrap();
    assert_eq!(email.send(&to, &[], SendOptions::default()).unwrap(), 0);
    assert_eq!(email.sent(), 0);

    let err = email
        .send(&to, &[], SendOptions::new().fail_silently(false))
        .unwrap_err();
    assert!(matches!(err, EmailError::Delivery(_)));
}

#[test]
fn test_send_email_shortcut() {
    let env = TestEnvironment::new();
    env.write_template(HELLO_TEMPLATE, "Hello {{ username }}");
    let fx = TestMailer::new(&env);

    let sent = email::send_email(
        &fx.mailer,
        HELLO_TEMPLATE,
        context(json!({"username": "Ala"})),
        &["ala@example.com".to_string()],
        "Subject",
        SendOptions::default(),
    )
    .unwrap();

    assert_eq!(sent, 1);
    let message = &fx.outbox.messages()[0];
    assert_eq!(message.body, "Hello Ala");
    assert_eq!(message.subject, "Subject");
}

#[test]
fn test_unprefixed_directory_is_searched_first() {
    let env = TestEnvironment::new();
    env.write_template(HELLO_TEMPLATE, "prefixed");
    env.write_file(&std::path::Path::new("templates").join(HELLO_TEMPLATE), "bare");
    let fx = TestMailer::new(&env);

    let outbox = Arc::new(MemoryOutbox::new());
    let loader = FilesystemLoader::new(vec![env.templates_dir()]).with_prefix("emailtemplates");
    let mailer = Mailer::new(fx.store.clone(), Arc::new(loader), outbox)
        .with_registry(fx.registry.clone());

    let mut email = EmailFromTemplate::builder(HELLO_TEMPLATE).build(&mailer).unwrap();
    email.get_object().unwrap();
    assert_eq!(email.template(), Some("bare"));
}
