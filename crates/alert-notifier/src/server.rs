//! HTTP server: index, health, debug alert dump and Telegram webhook.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use alert_engine::Alert;
use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::state::AppState;
use crate::webhook::process_update;

/// Build the HTTP router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/current-alerts", get(current_alerts_handler))
        .route("/telegram-webhook", post(telegram_webhook_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn run_server<F>(
    state: Arc<AppState>,
    listener: tokio::net::TcpListener,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on http://{addr}");
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    started_at: DateTime<Utc>,
    last_cycle_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct CurrentAlertsResponse {
    current_alerts: Vec<Alert>,
    /// Seconds left until each pending alert is confirmed
    pending: BTreeMap<String, f64>,
    updated_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Handlers
// ============================================================================

async fn index_handler() -> &'static str {
    "Hello from alert-notifier!\n"
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot().await;
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        started_at: state.started_at,
        last_cycle_at: snapshot.updated_at,
    })
}

async fn current_alerts_handler(State(state): State<Arc<AppState>>) -> Response {
    if !state.config.development_mode_enabled {
        return (StatusCode::FORBIDDEN, "Available only in development mode").into_response();
    }

    let snapshot = state.snapshot().await;
    let now = state.now();
    let pending = snapshot
        .debounce
        .pending()
        .map(|(id, deadline)| (id.to_string(), deadline.saturating_sub(now).as_secs_f64()))
        .collect();

    Json(CurrentAlertsResponse {
        current_alerts: snapshot.alerts.clone(),
        pending,
        updated_at: snapshot.updated_at,
    })
    .into_response()
}

async fn telegram_webhook_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Json<Value> {
    debug!(payload = %payload, "Telegram webhook data");
    if let Err(e) = process_update(state.telegram.as_deref(), payload).await {
        error!(error = %format!("{e:#}"), "Failed to process Telegram webhook");
    }
    Json(json!({"ok": true}))
}
