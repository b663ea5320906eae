// ABOUTME: Handlebars helper functions available to email templates
// ABOUTME: Date formatting, case conversion, defaults, joining and line break helpers

use chrono::{DateTime, TimeZone, Utc};
use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderError,
    RenderErrorReason,
};
use serde_json::Value as JsonValue;

fn helper_error(message: impl Into<String>) -> RenderError {
    RenderErrorReason::Other(message.into()).into()
}

fn display_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_blank(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::Bool(b) => !b,
        JsonValue::String(s) => s.is_empty(),
        JsonValue::Array(a) => a.is_empty(),
        JsonValue::Object(o) => o.is_empty(),
        JsonValue::Number(_) => false,
    }
}

fn parse_timestamp(value: &JsonValue) -> Option<DateTime<Utc>> {
    match value {
        JsonValue::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                s.parse::<i64>()
                    .ok()
                    .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
            }),
        JsonValue::Number(n) => n.as_i64().and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
        _ => None,
    }
}

/// Date format helper - `{{date_format date "%d.%m.%Y"}}`
pub fn date_format_helper(
    h: &Helper,
    r: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let value = h
        .param(0)
        .map(|v| v.value())
        .ok_or_else(|| helper_error("date_format helper requires a timestamp parameter"))?;

    let format = h
        .param(1)
        .and_then(|v| v.value().as_str())
        .unwrap_or("%Y-%m-%d %H:%M");

    let datetime = parse_timestamp(value)
        .ok_or_else(|| helper_error(format!("Failed to parse timestamp: {}", value)))?;

    out.write(&r.get_escape_fn()(&datetime.format(format).to_string()))?;
    Ok(())
}

/// Uppercase helper
pub fn upper_helper(
    h: &Helper,
    r: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let input = h
        .param(0)
        .map(|v| display_value(v.value()))
        .ok_or_else(|| helper_error("upper helper requires input parameter"))?;

    out.write(&r.get_escape_fn()(&input.to_uppercase()))?;
    Ok(())
}

/// Lowercase helper
pub fn lower_helper(
    h: &Helper,
    r: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let input = h
        .param(0)
        .map(|v| display_value(v.value()))
        .ok_or_else(|| helper_error("lower helper requires input parameter"))?;

    out.write(&r.get_escape_fn()(&input.to_lowercase()))?;
    Ok(())
}

/// Default helper - `{{default user_name "friend"}}`
pub fn default_helper(
    h: &Helper,
    r: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let fallback = h
        .param(1)
        .map(|v| display_value(v.value()))
        .ok_or_else(|| helper_error("default helper requires default value parameter"))?;

    let result = match h.param(0).map(|v| v.value()) {
        Some(value) if !is_blank(value) => display_value(value),
        _ => fallback,
    };

    out.write(&r.get_escape_fn()(&result))?;
    Ok(())
}

/// Join helper - `{{join names ", "}}`
pub fn join_helper(
    h: &Helper,
    r: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let array = h
        .param(0)
        .and_then(|v| v.value().as_array())
        .ok_or_else(|| helper_error("join helper requires array parameter"))?;

    let separator = h.param(1).and_then(|v| v.value().as_str()).unwrap_or(", ");

    let joined = array
        .iter()
        .map(display_value)
        .collect::<Vec<_>>()
        .join(separator);
    out.write(&r.get_escape_fn()(&joined))?;
    Ok(())
}

/// Converts newlines into `<br/>` after escaping the text
pub fn linebreaksbr_helper(
    h: &Helper,
    r: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let input = h
        .param(0)
        .map(|v| display_value(v.value()))
        .ok_or_else(|| helper_error("linebreaksbr helper requires input parameter"))?;

    let escaped = r.get_escape_fn()(&input.replace("\r\n", "\n"));
    out.write(&escaped.replace('\n', "<br/>"))?;
    Ok(())
}

/// Register all built-in helpers with a Handlebars instance
pub fn register_helpers(handlebars: &mut Handlebars) {
    handlebars.register_helper("date_format", Box::new(date_format_helper));
    handlebars.register_helper("upper", Box::new(upper_helper));
    handlebars.register_helper("lower", Box::new(lower_helper));
    handlebars.register_helper("default", Box::new(default_helper));
    handlebars.register_helper("join", Box::new(join_helper));
    handlebars.register_helper("linebreaksbr", Box::new(linebreaksbr_helper));
}
