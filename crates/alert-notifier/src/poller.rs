//! The fetch, diff and notify loop.
//!
//! Cycles run strictly one after another: fetch, hand the previous and
//! current observation to the engine, deliver the messages, publish the new
//! snapshot, sleep.

use std::sync::Arc;
use std::time::Duration;

use alert_engine::{Alert, AlertEngine, DebounceState, EngineError, IgnoreList};
use anyhow::{Context, Result};
use notify::Notifier;
use tracing::{debug, error, info, warn};

use crate::redact::redact_secrets;
use crate::source::AlertSource;
use crate::state::AppState;

/// Result of one completed cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Messages produced by the engine
    pub messages: Vec<String>,
    /// Messages accepted by a channel
    pub delivered: usize,
    /// Delivery attempts that failed
    pub failed: usize,
}

/// Owns the alert observation and debounce state between cycles.
pub struct Poller {
    source: Arc<dyn AlertSource>,
    engine: AlertEngine,
    notifier: Notifier,
    state: Arc<AppState>,
    current: Vec<Alert>,
    debounce: Option<DebounceState>,
}

impl Poller {
    /// Create a poller starting from an initial observation.
    ///
    /// Alerts in the initial observation are treated as already announced.
    pub fn new(
        source: Arc<dyn AlertSource>,
        notifier: Notifier,
        state: Arc<AppState>,
        initial: Vec<Alert>,
    ) -> Self {
        let ignored = IgnoreList::new(state.config.ignored_messages.iter().cloned());
        if !ignored.is_empty() {
            info!(count = ignored.len(), "Ignoring configured messages");
        }
        let engine = AlertEngine::new(state.config.wait_duration, ignored);
        info!(
            wait_secs = engine.debouncer().wait_duration().as_secs_f64(),
            "Alert engine ready"
        );

        Self {
            source,
            engine,
            notifier,
            state,
            current: initial,
            debounce: None,
        }
    }

    /// Fetch the initial observation with the startup timeout.
    pub async fn initial_fetch(source: &dyn AlertSource, timeout: Duration) -> Result<Vec<Alert>> {
        let alerts = tokio::time::timeout(timeout, source.fetch())
            .await
            .context("Timed out retrieving initial alerts")?
            .context("Failed to retrieve initial alerts")?;

        debug!(count = alerts.len(), "Initial alerts");
        for alert in &alerts {
            debug!(alert = %serde_json::to_string(alert).unwrap_or_default(), "Initial alert");
        }
        Ok(alerts)
    }

    /// Publish the initial observation so the debug endpoint has data.
    pub async fn publish_initial(&self) {
        self.state
            .publish(self.current.clone(), self.debounce.clone().unwrap_or_default())
            .await;
    }

    /// Alerts seen in the last successful cycle.
    pub fn current_alerts(&self) -> &[Alert] {
        &self.current
    }

    /// Debounce state carried into the next cycle.
    pub fn debounce_state(&self) -> Option<&DebounceState> {
        self.debounce.as_ref()
    }

    /// Run forever.
    pub async fn run(mut self) {
        let config = self.state.config.clone();
        loop {
            tokio::time::sleep(config.sleep_interval).await;

            let fetched = tokio::time::timeout(config.fetch_timeout, self.source.fetch()).await;
            let alerts = match fetched {
                Ok(Ok(alerts)) => alerts,
                Ok(Err(e)) => {
                    info!(error = %redact_secrets(&format!("{e:#}")), "Failed to retrieve alerts");
                    tokio::time::sleep(config.retry_delay).await;
                    continue;
                }
                Err(_) => {
                    info!(
                        timeout_secs = config.fetch_timeout.as_secs_f64(),
                        "Timed out retrieving alerts"
                    );
                    tokio::time::sleep(config.retry_delay).await;
                    continue;
                }
            };

            let now = self.state.now();
            if let Err(e) = self.process(alerts, now).await {
                error!(error = %e, "Skipping notifications for this cycle");
            }
        }
    }

    /// Diff a new observation against the last one and deliver the result.
    ///
    /// On an engine error nothing changes: the previous observation and
    /// debounce state stay in place for the next fetch.
    pub async fn process(&mut self, alerts: Vec<Alert>, now: Duration) -> Result<CycleReport, EngineError> {
        let output = self
            .engine
            .process(&self.current, &alerts, self.debounce.clone(), now)?;

        let mut report = CycleReport {
            messages: output.messages,
            ..CycleReport::default()
        };

        if !report.messages.is_empty() {
            if self.state.config.telegram_chat_id.is_none() || !self.notifier.has_channels() {
                info!(
                    count = report.messages.len(),
                    "telegram_chat_id not configured, not sending notifications"
                );
            } else {
                for (channel, result) in self.notifier.notify_and_wait(&report.messages).await {
                    match result {
                        Ok(()) => report.delivered += 1,
                        Err(e) => {
                            warn!(channel = %channel, error = %e, "Failed to deliver notification");
                            report.failed += 1;
                        }
                    }
                }
            }
        }

        debug!(
            alerts = alerts.len(),
            messages = report.messages.len(),
            delivered = report.delivered,
            failed = report.failed,
            pending = output.state.len(),
            "Alert cycle complete"
        );

        self.state.publish(alerts.clone(), output.state.clone()).await;
        self.debounce = Some(output.state);
        self.current = alerts;

        Ok(report)
    }
}
