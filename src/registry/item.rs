// ABOUTME: Registration metadata describing a single email template send point
// ABOUTME: Holds help text, default subject and documented context keys for admin use

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// Documentation for a single context key.
///
/// Deserialises from either a plain description string or a
/// `[description, example]` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HelpContextEntry {
    Description(String),
    Example(String, JsonValue),
}

impl HelpContextEntry {
    pub fn description(&self) -> &str {
        match self {
            HelpContextEntry::Description(description) => description,
            HelpContextEntry::Example(description, _) => description,
        }
    }

    pub fn example(&self) -> Option<&JsonValue> {
        match self {
            HelpContextEntry::Description(_) => None,
            HelpContextEntry::Example(_, example) => Some(example),
        }
    }
}

/// Input for [`super::EmailTemplateRegistry::register`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registration {
    pub path: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub help_text: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub help_context: BTreeMap<String, HelpContextEntry>,
}

impl Registration {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn help_text(mut self, help_text: impl Into<String>) -> Self {
        self.help_text = Some(help_text.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Document a context key with a description only
    pub fn context(mut self, key: impl Into<String>, description: impl Into<String>) -> Self {
        self.help_context
            .insert(key.into(), HelpContextEntry::Description(description.into()));
        self
    }

    /// Document a context key with a description and an example value used in previews
    pub fn context_example(
        mut self,
        key: impl Into<String>,
        description: impl Into<String>,
        example: impl Into<JsonValue>,
    ) -> Self {
        self.help_context.insert(
            key.into(),
            HelpContextEntry::Example(description.into(), example.into()),
        );
        self
    }
}

/// Immutable metadata stored in the registry for one template path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationItem {
    path: String,
    name: String,
    help_text: String,
    subject: String,
    help_context: BTreeMap<String, HelpContextEntry>,
}

impl RegistrationItem {
    pub fn new(registration: Registration) -> Self {
        let name = registration
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| registration.path.clone());

        Self {
            path: registration.path,
            name,
            help_text: registration.help_text.unwrap_or_default(),
            subject: registration.subject.unwrap_or_default(),
            help_context: registration.help_context,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help_text(&self) -> &str {
        &self.help_text
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn raw_help_context(&self) -> &BTreeMap<String, HelpContextEntry> {
        &self.help_context
    }

    /// Context keys mapped to their descriptions, dropping example values
    pub fn help_context(&self) -> BTreeMap<String, String> {
        self.help_context
            .iter()
            .map(|(key, entry)| (key.clone(), entry.description().to_string()))
            .collect()
    }

    /// Context keys mapped to example values, `<key>` when no example was given
    pub fn help_content(&self) -> Map<String, JsonValue> {
        self.help_context
            .iter()
            .map(|(key, entry)| {
                let example = entry
                    .example()
                    .cloned()
                    .unwrap_or_else(|| JsonValue::String(format!("<{}>", key)));
                (key.clone(), example)
            })
            .collect()
    }

    pub fn context_description(&self) -> String {
        self.help_context
            .iter()
            .map(|(key, entry)| {
                if entry.description().is_empty() {
                    key.clone()
                } else {
                    format!("{} - {}", key, entry.description())
                }
            })
            .collect::<Vec<_>>()
            .join("<br/>")
    }

    pub fn as_form_help_text(&self) -> String {
        let mut blocks = Vec::new();
        if !self.help_text.is_empty() {
            blocks.push(format!("USAGE: {}", self.help_text));
        }
        let context_description = self.context_description();
        if !context_description.is_empty() {
            blocks.push(format!("CONTEXT:<br/>{}", context_description));
        }
        blocks.join("<br/><br/>")
    }

    pub fn as_form_choice(&self) -> (String, String) {
        (self.path.clone(), self.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hello_item() -> RegistrationItem {
        RegistrationItem::new(
            Registration::new("hello_template.html")
                .help_text("Hello template")
                .context("username", "Name of user in hello expression")
                .context_example("site", "Site name", "example.com"),
        )
    }

    #[test]
    fn test_name_defaults_to_path() {
        let item = RegistrationItem::new(Registration::new("simple.html"));
        assert_eq!(item.name(), "simple.html");

        let named = RegistrationItem::new(Registration::new("simple.html").name("Simple"));
        assert_eq!(named.name(), "Simple");
        assert_eq!(named.as_form_choice(), ("simple.html".into(), "Simple".into()));
    }

    #[test]
    fn test_help_context_collapses_examples() {
        let context = hello_item().help_context();
        assert_eq!(context["username"], "Name of user in hello expression");
        assert_eq!(context["site"], "Site name");
    }

    #[test]
    fn test_help_content_synthesizes_placeholders() {
        let content = hello_item().help_content();
        assert_eq!(content["username"], json!("<username>"));
        assert_eq!(content["site"], json!("example.com"));
    }

    #[test]
    fn test_form_help_text() {
        let text = hello_item().as_form_help_text();
        assert_eq!(
            text,
            "USAGE: Hello template<br/><br/>CONTEXT:<br/>site - Site name<br/>username - Name of user in hello expression"
        );

        let bare = RegistrationItem::new(Registration::new("bare.html"));
        assert_eq!(bare.as_form_help_text(), "");
    }

    #[test]
    fn test_registration_deserializes_context_pairs() {
        let yaml = r#"
path: welcome.html
subject: "Welcome {{ user_name }}"
help_context:
  user_name: Name of the user
  activation_url: ["Activation link", "https://example.com/activate/abc"]
"#;
        let registration: Registration = serde_yaml::from_str(yaml).unwrap();
        let item = RegistrationItem::new(registration);
        assert_eq!(item.subject(), "Welcome {{ user_name }}");
        assert_eq!(
            item.help_content()["activation_url"],
            json!("https://example.com/activate/abc")
        );
        assert_eq!(item.help_context()["user_name"], "Name of the user");
    }
}
