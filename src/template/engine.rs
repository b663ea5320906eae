// ABOUTME: Template engine implementation using Handlebars
// ABOUTME: Compiles and renders email bodies and subjects with optional HTML escaping

use handlebars::Handlebars;

use super::context::EmailContext;
use super::error::{Result, TemplateError};
use super::helpers;

#[derive(Clone)]
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
    escape_html: bool,
}

impl TemplateEngine {
    /// Create an engine that HTML-escapes interpolated values
    pub fn new() -> Result<Self> {
        Self::with_escaping(true)
    }

    /// Create an engine for plain text output
    pub fn plain() -> Result<Self> {
        Self::with_escaping(false)
    }

    pub fn with_escaping(escape_html: bool) -> Result<Self> {
        let mut handlebars = Handlebars::new();

        // Missing context keys render empty
        handlebars.set_strict_mode(false);
        handlebars.set_dev_mode(false);

        if escape_html {
            handlebars.register_escape_fn(handlebars::html_escape);
        } else {
            handlebars.register_escape_fn(handlebars::no_escape);
        }

        helpers::register_helpers(&mut handlebars);

        Ok(Self {
            handlebars,
            escape_html,
        })
    }

    pub fn escapes_html(&self) -> bool {
        self.escape_html
    }

    /// Render a template string with the given context
    pub fn render_template(&self, template: &str, context: &EmailContext) -> Result<String> {
        self.handlebars
            .render_template(template, context.as_map())
            .map_err(TemplateError::HandlebarsError)
    }

    /// Compile a template and keep it under `name` for repeated rendering
    pub fn register_template(&mut self, name: &str, template: &str) -> Result<()> {
        self.handlebars
            .register_template_string(name, template)
            .map_err(|e| TemplateError::SyntaxError(e.to_string()))
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.has_template(name)
    }

    /// Render a template previously compiled with [`Self::register_template`]
    pub fn render(&self, name: &str, context: &EmailContext) -> Result<String> {
        if !self.has_template(name) {
            return Err(TemplateError::NotFound {
                name: name.to_string(),
            });
        }
        self.handlebars
            .render(name, context.as_map())
            .map_err(TemplateError::HandlebarsError)
    }

    /// Validate template syntax without rendering
    pub fn validate_template(&self, template: &str) -> Result<()> {
        match handlebars::Template::compile(template) {
            Ok(_) => Ok(()),
            Err(e) => Err(TemplateError::SyntaxError(e.to_string())),
        }
    }

    /// Check if a string contains template expressions
    pub fn has_templates(&self, text: &str) -> bool {
        text.contains("{{") && text.contains("}}")
    }

    /// Register a custom helper function
    pub fn register_helper<F>(&mut self, name: &str, helper: F)
    where
        F: handlebars::HelperDef + Send + Sync + 'static,
    {
        self.handlebars.register_helper(name, Box::new(helper));
    }
}
