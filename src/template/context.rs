// ABOUTME: Canonical rendering context passed to email templates
// ABOUTME: A JSON object seeded with the current timestamp under the `date` key

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;

use super::error::{Result, TemplateError};

/// Key holding the render timestamp.
pub const DATE_KEY: &str = "date";

/// Key holding the default attachments rendered as links.
pub const DEFAULT_ATTACHMENTS_KEY: &str = "default_attachments";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailContext {
    values: Map<String, JsonValue>,
}

impl EmailContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context carrying the default `date` key
    pub fn with_defaults() -> Self {
        let mut context = Self::new();
        context.insert(DATE_KEY, Utc::now().to_rfc3339());
        context
    }

    /// Build a context from any serializable value that maps to a JSON object
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self> {
        match serde_json::to_value(value)? {
            JsonValue::Object(values) => Ok(Self { values }),
            other => Err(TemplateError::ContextError(format!(
                "context must be an object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Build a context from `key=value` style string variables
    pub fn from_variables(variables: &HashMap<String, String>) -> Self {
        variables
            .iter()
            .map(|(key, value)| (key.clone(), JsonValue::String(value.clone())))
            .collect()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Insert a serializable value under `key`
    pub fn insert_serialize<T: Serialize>(&mut self, key: impl Into<String>, value: &T) -> Result<()> {
        self.values.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<JsonValue> {
        self.values.remove(key)
    }

    /// Merge another context in, overriding existing keys
    pub fn extend(&mut self, other: EmailContext) {
        self.values.extend(other.values);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, JsonValue> {
        &self.values
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(self.values.clone())
    }
}

impl From<Map<String, JsonValue>> for EmailContext {
    fn from(values: Map<String, JsonValue>) -> Self {
        Self { values }
    }
}

impl FromIterator<(String, JsonValue)> for EmailContext {
    fn from_iter<I: IntoIterator<Item = (String, JsonValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
