//! Alert data model as delivered by the alert source.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RenderError;

/// Stream metadata attached to an alert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertStream {
    /// JSON-encoded label object, e.g. `{"agent":"system","host":"example.com"}`
    #[serde(rename = "labelJSON", default)]
    pub label_json: Option<String>,
}

/// A single active alert.
///
/// Field names follow the GraphQL `activeAlerts` node so the same type
/// deserializes the source response and serializes the debug endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Opaque node id (not used for identity)
    #[serde(default)]
    pub id: Option<String>,
    /// Stable identity across observations
    pub alert_id: String,
    /// Category label
    #[serde(default)]
    pub alert_type: Option<String>,
    #[serde(default)]
    pub stream_id: Option<String>,
    #[serde(default)]
    pub stream: Option<AlertStream>,
    #[serde(default)]
    pub item_path: Vec<String>,
    #[serde(default)]
    pub last_item_unit: Option<String>,
    /// Most recent observed value, JSON-encoded by the source
    #[serde(rename = "lastItemValueJSON", default)]
    pub last_item_value_json: Option<String>,
}

impl Alert {
    /// Create a minimal alert with the given id and type.
    #[must_use]
    pub fn new(alert_id: impl Into<String>, alert_type: impl Into<String>) -> Self {
        Self {
            id: None,
            alert_id: alert_id.into(),
            alert_type: Some(alert_type.into()),
            stream_id: None,
            stream: None,
            item_path: Vec::new(),
            last_item_unit: None,
            last_item_value_json: None,
        }
    }

    /// Set the JSON-encoded labels.
    #[must_use]
    pub fn with_label_json(mut self, label_json: impl Into<String>) -> Self {
        self.stream = Some(AlertStream {
            label_json: Some(label_json.into()),
        });
        self
    }

    /// Set the item path.
    #[must_use]
    pub fn with_item_path<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.item_path = segments.into_iter().map(Into::into).collect();
        self
    }

    /// Set the last observed value.
    #[must_use]
    pub fn with_last_value(mut self, value: impl Into<String>) -> Self {
        self.last_item_value_json = Some(value.into());
        self
    }

    /// Decode the label object carried in `stream.labelJSON`.
    ///
    /// Keys come back sorted; non-string values keep their JSON text.
    pub fn labels(&self) -> Result<Vec<(String, String)>, RenderError> {
        let raw = self
            .stream
            .as_ref()
            .and_then(|s| s.label_json.as_deref())
            .ok_or(RenderError::MissingField("stream.labelJSON"))?;

        let decoded: Map<String, Value> =
            serde_json::from_str(raw).map_err(RenderError::MalformedLabels)?;

        let mut labels: Vec<(String, String)> = decoded
            .into_iter()
            .map(|(k, v)| {
                let v = match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, v)
            })
            .collect();
        labels.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(labels)
    }
}
