//! Alert source backed by a GraphQL `activeAlerts` query.

use std::time::{Duration, Instant};

use alert_engine::Alert;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::redact::redact_url;

/// Query returning every currently active alert.
pub const ALERT_QUERY: &str = r"
{
  activeAlerts {
    pageInfo {
      hasNextPage
    }
    edges {
      node {
        id
        alertId
        alertType
        streamId
        stream {
          labelJSON
        }
        itemPath
        lastItemUnit
        lastItemValueJSON
      }
    }
  }
}
";

/// Longest response excerpt written to the debug log.
const LOG_BODY_LIMIT: usize = 500;

/// Anything that can report the currently active alerts.
#[async_trait]
pub trait AlertSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Alert>>;
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<QueryData>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    errors: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(rename = "activeAlerts")]
    active_alerts: ActiveAlerts,
}

#[derive(Debug, Deserialize)]
struct ActiveAlerts {
    #[serde(rename = "pageInfo", default)]
    page_info: Option<PageInfo>,
    edges: Vec<Edge>,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    #[serde(rename = "hasNextPage", default)]
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
struct Edge {
    node: Alert,
}

/// Truthy in the loose sense: present, not null, not empty.
fn is_set(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// GraphQL client for the alert source.
#[derive(Debug, Clone)]
pub struct GraphqlAlertSource {
    endpoint: String,
    client: reqwest::Client,
}

impl GraphqlAlertSource {
    /// Create a client; `request_timeout` bounds each HTTP request.
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to build HTTP client for the alert source")?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    fn parse(&self, body: &str) -> Result<Vec<Alert>> {
        let url = redact_url(&self.endpoint);
        let response: GraphqlResponse = serde_json::from_str(body)
            .with_context(|| format!("Invalid GraphQL response from {url}"))?;

        if is_set(response.error.as_ref()) || is_set(response.errors.as_ref()) {
            let detail = json!({"error": response.error, "errors": response.errors});
            anyhow::bail!("Received error response from {url}: {detail}");
        }

        let active = response
            .data
            .with_context(|| format!("GraphQL response from {url} has no data"))?
            .active_alerts;

        if active.page_info.is_some_and(|p| p.has_next_page) {
            warn!("Alert source reports more pages; only the first page is used");
        }

        Ok(active.edges.into_iter().map(|e| e.node).collect())
    }
}

#[async_trait]
impl AlertSource for GraphqlAlertSource {
    async fn fetch(&self) -> Result<Vec<Alert>> {
        let url = redact_url(&self.endpoint).into_owned();
        debug!(url = %url, "Retrieving alerts");
        let started = Instant::now();

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&json!({ "query": ALERT_QUERY }))
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("Failed to send request to {url}"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("Failed to read response from {url}"))?;

        if !status.is_success() {
            anyhow::bail!("Alert query to {url} failed with status {status}");
        }

        debug!(
            body = %body.chars().take(LOG_BODY_LIMIT).collect::<String>(),
            "GraphQL response"
        );

        let alerts = self.parse(&body)?;
        debug!(
            count = alerts.len(),
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Retrieved alerts"
        );
        Ok(alerts)
    }
}
