//! Top-level commands: run the service, or query alerts once.

use std::sync::Arc;

use anyhow::{Context, Result};
use notify::{Notifier, NotifyChannel, TelegramChannel};
use tracing::{info, warn};

use crate::config::Config;
use crate::poller::Poller;
use crate::redact::redact_url;
use crate::server::{run_server, shutdown_signal};
use crate::source::{AlertSource, GraphqlAlertSource};
use crate::state::AppState;

/// Run the poller and the HTTP server until shutdown.
pub async fn serve(config: Config) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        endpoint = %redact_url(&config.graphql_endpoint),
        "Starting alert-notifier"
    );
    if config.development_mode_enabled {
        warn!("Development mode enabled, /current-alerts is exposed");
    }

    let telegram = config.telegram_api_token.as_ref().map(|token| {
        Arc::new(TelegramChannel::new(
            Some(token.clone()),
            config.telegram_chat_id.clone(),
        ))
    });
    let notifier = build_notifier(telegram.as_ref());

    let source: Arc<dyn AlertSource> = Arc::new(GraphqlAlertSource::new(
        config.graphql_endpoint.clone(),
        config.fetch_timeout,
    )?);
    let initial = Poller::initial_fetch(source.as_ref(), config.initial_fetch_timeout).await?;
    info!(count = initial.len(), "Initial alerts retrieved");

    let bind_addr = config.bind_addr();
    let webhook_url = config.webhook_url();
    let state = Arc::new(AppState::new(config, telegram.clone()));

    let poller = Poller::new(source, notifier, Arc::clone(&state), initial);
    poller.publish_initial().await;

    match (telegram.as_deref(), webhook_url) {
        (Some(telegram), Some(url)) => {
            if let Err(e) = telegram.set_webhook(&url).await {
                warn!(error = %e, "Failed to register Telegram webhook");
            }
        }
        (Some(_), None) => info!("public_url not configured, Telegram webhook not registered"),
        _ => {}
    }

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;

    let poller_handle = tokio::spawn(poller.run());
    let result = run_server(state, listener, shutdown_signal()).await;
    poller_handle.abort();
    info!("alert-notifier stopped");
    result
}

/// Fetch the active alerts once and print them.
pub async fn query(config: Config) -> Result<()> {
    let source = GraphqlAlertSource::new(config.graphql_endpoint.clone(), config.fetch_timeout)?;
    let alerts = Poller::initial_fetch(&source, config.initial_fetch_timeout).await?;

    let total = alerts.len();
    for (i, alert) in alerts.iter().enumerate() {
        let json = serde_json::to_string(alert).context("Failed to serialize alert")?;
        println!("Alert {}/{}: {}", i + 1, total, json);
    }
    if total == 0 {
        println!("No active alerts");
    }
    Ok(())
}

/// Telegram delivery is enabled only when both a token and a chat are known.
fn build_notifier(telegram: Option<&Arc<TelegramChannel>>) -> Notifier {
    match telegram {
        Some(telegram) if telegram.enabled() => {
            Notifier::with_channels(vec![Arc::clone(telegram) as Arc<dyn NotifyChannel>])
        }
        Some(_) => {
            info!("telegram_chat_id not configured, notifications are disabled");
            Notifier::disabled()
        }
        None => {
            info!("telegram_api_token not configured, notifications are disabled");
            Notifier::disabled()
        }
    }
}
