//! Email template names and `{{variable}}` substitution.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

pub const TEMPLATE_SUBMISSION_CONFIRMATION: &str = "submission_confirmation";
pub const TEMPLATE_SUBMISSION_APPROVED: &str = "submission_approved";
pub const TEMPLATE_SUBMISSION_REJECTED: &str = "submission_rejected";

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("valid regex"))
}

/// Replace every `{{name}}` in `template` with its value from `vars`.
///
/// Placeholders without a value are left as-is.
pub fn render(template: &str, vars: &HashMap<&str, String>) -> String {
    placeholder()
        .replace_all(template, |caps: &Captures<'_>| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Like [`render`], but HTML-escapes each substituted value.
///
/// Use for HTML bodies: artist names and reviewer feedback are user input.
pub fn render_html(template: &str, vars: &HashMap<&str, String>) -> String {
    let escaped: HashMap<&str, String> =
        vars.iter().map(|(name, value)| (*name, escape_html(value))).collect();
    render(template, &escaped)
}

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
