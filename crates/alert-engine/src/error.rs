//! Error types for the alert engine.

use thiserror::Error;

/// Errors that abort a diff cycle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The same `alert_id` appeared twice in one observation
    #[error("duplicate alert id {alert_id:?} in {side} alert set")]
    DuplicateAlertId {
        alert_id: String,
        side: AlertSetSide,
    },
}

/// Which of the two compared observations an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertSetSide {
    Previous,
    Current,
}

impl std::fmt::Display for AlertSetSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Previous => "previous",
            Self::Current => "current",
        })
    }
}

/// Failures while rendering a single alert.
///
/// Never escapes the renderer; it is logged and replaced by a raw dump.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A field required for rendering is absent
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// `labelJSON` is not a JSON object
    #[error("malformed label JSON: {0}")]
    MalformedLabels(#[source] serde_json::Error),
}
