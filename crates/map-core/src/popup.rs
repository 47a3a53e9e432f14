//! Popup markup for a clicked advisory feature.

use std::fmt::Write as _;

use advisory_common::{format_validity, Category, Properties};
use serde_json::Value;

const HAZARD_PLACEHOLDER: &str = "N/A";
const ALTITUDE_PLACEHOLDER: &str = "Unknown";
const RAW_TEXT_PLACEHOLDER: &str = "No raw text";

/// Read a numeric altitude attribute. Numeric strings are accepted; anything
/// else counts as unknown. Zero is a known value.
fn altitude_value(properties: &Properties, prop: &str) -> Option<f64> {
    match properties.get(prop)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn feet(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

/// Human-readable altitude band.
///
/// Both bounds known gives `"lower – upper ft"`, one bound gives that value
/// alone, none gives `"Unknown"`. Equal bounds are a single-point range and
/// render as `"X – X ft"`, not collapsed to one value.
pub fn format_altitude(lower: Option<f64>, upper: Option<f64>) -> String {
    match (lower, upper) {
        (Some(lo), Some(hi)) => format!("{} – {} ft", feet(lo), feet(hi)),
        (Some(v), None) | (None, Some(v)) => format!("{} ft", feet(v)),
        (None, None) => ALTITUDE_PLACEHOLDER.to_string(),
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Text of an attribute, or `None` when absent, null or empty.
fn text_value(properties: &Properties, prop: &str) -> Option<String> {
    match properties.get(prop)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Render the popup fragment for one feature.
///
/// Returns an empty string when the feature has no attribute bag.
pub fn create_popup_markup(properties: Option<&Properties>, category: Category) -> String {
    let Some(properties) = properties else {
        return String::new();
    };
    let spec = category.spec();

    let hazard = text_value(properties, "hazard").unwrap_or_else(|| HAZARD_PLACEHOLDER.to_string());
    let (lower_prop, upper_prop) = spec.display_altitude_props;
    let altitude = format_altitude(
        altitude_value(properties, lower_prop),
        altitude_value(properties, upper_prop),
    );
    let valid_from = format_validity(properties.get("validTimeFrom"));
    let valid_to = format_validity(properties.get("validTimeTo"));
    let raw_text =
        text_value(properties, spec.raw_text_prop).unwrap_or_else(|| RAW_TEXT_PLACEHOLDER.to_string());

    let mut html = String::new();
    let _ = write!(
        html,
        "<div class=\"popup-container\">\
         <div class=\"popup-header\">\
         <span class=\"popup-header-dot\" style=\"background-color: {color}\"></span>\
         <span class=\"popup-header-text\" style=\"color: {color}\">{label}</span>\
         </div>\
         <p><strong>Hazard:</strong> {hazard}</p>\
         <p><strong>Altitude:</strong> {altitude}</p>\
         <p><strong>Valid From:</strong> {valid_from}</p>\
         <p><strong>Valid To:</strong> {valid_to}</p>\
         <div class=\"raw-text-container\"><strong>Raw Text:</strong><pre>{raw_text}</pre></div>\
         </div>",
        color = spec.color,
        label = spec.label,
        hazard = escape_html(&hazard),
        altitude = escape_html(&altitude),
        valid_from = escape_html(&valid_from),
        valid_to = escape_html(&valid_to),
        raw_text = escape_html(&raw_text),
    );
    html
}
