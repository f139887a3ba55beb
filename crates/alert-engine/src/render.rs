//! Telegram MarkdownV2 rendering of alerts.
//!
//! See <https://core.telegram.org/bots/api#markdownv2-style>.

use tracing::warn;

use crate::alert::Alert;
use crate::debounce::AlertEvent;
use crate::error::RenderError;

/// Characters with meaning in MarkdownV2.
const MARKDOWN_V2_SPECIAL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    '\\',
];

/// Separator between item path segments.
const PATH_SEPARATOR: &str = ">";

/// Placeholder for an alert without a last value.
const NO_VALUE: &str = "-";

/// Escape every MarkdownV2 special character with a backslash.
#[must_use]
pub fn escape_markdown_v2(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + text.len() / 4);
    for c in text.chars() {
        if MARKDOWN_V2_SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Render an alert as a single MarkdownV2 line.
///
/// Falls back to an escaped JSON dump of the alert if it cannot be rendered.
#[must_use]
pub fn render_alert(alert: &Alert) -> String {
    match try_render_alert(alert) {
        Ok(text) => text,
        Err(e) => {
            warn!(alert_id = %alert.alert_id, error = %e, "Failed to build alert text, using raw dump");
            let raw = serde_json::to_string(alert).unwrap_or_else(|_| format!("{alert:?}"));
            escape_markdown_v2(&raw)
        }
    }
}

/// Render a classified event: category glyph followed by the alert line.
#[must_use]
pub fn render_event(event: &AlertEvent) -> String {
    format!("{} {}", event.kind.glyph(), render_alert(&event.alert))
}

fn try_render_alert(alert: &Alert) -> Result<String, RenderError> {
    let esc = escape_markdown_v2;

    let labels = alert.labels()?;
    let alert_type = alert
        .alert_type
        .as_deref()
        .ok_or(RenderError::MissingField("alertType"))?;

    let mut parts: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{}{}`{}`", esc(k), esc("="), esc(v)))
        .collect();
    parts.push(format!("*{}*", esc(alert_type)));
    parts.push(esc(&alert.item_path.join(PATH_SEPARATOR)));
    parts.push(esc(alert
        .last_item_value_json
        .as_deref()
        .filter(|v| !v.is_empty())
        .unwrap_or(NO_VALUE)));
    parts.push(format!("{}`{}`{}", esc("("), esc(&alert.alert_id), esc(")")));

    Ok(parts.join(" "))
}
