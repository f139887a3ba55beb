//! State shared between the polling loop and the HTTP handlers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use alert_engine::{Alert, DebounceState};
use chrono::{DateTime, Utc};
use notify::TelegramChannel;
use tokio::sync::RwLock;

use crate::config::Config;

/// What the poller last observed. Replaced as a whole, never mutated.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub alerts: Vec<Alert>,
    pub debounce: DebounceState,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: Config,
    /// Bot API client for webhook replies, if a token is configured
    pub telegram: Option<Arc<TelegramChannel>>,
    pub started_at: DateTime<Utc>,
    /// Origin of the monotonic clock handed to the alert engine
    clock_origin: Instant,
    snapshot: RwLock<Arc<Snapshot>>,
}

impl AppState {
    pub fn new(config: Config, telegram: Option<Arc<TelegramChannel>>) -> Self {
        Self {
            config,
            telegram,
            started_at: Utc::now(),
            clock_origin: Instant::now(),
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
        }
    }

    /// Time on the engine's monotonic clock.
    pub fn now(&self) -> Duration {
        self.clock_origin.elapsed()
    }

    /// Current snapshot; cheap to clone and never half-updated.
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.snapshot.read().await)
    }

    /// Swap in a new snapshot.
    pub async fn publish(&self, alerts: Vec<Alert>, debounce: DebounceState) {
        let next = Arc::new(Snapshot {
            alerts,
            debounce,
            updated_at: Some(Utc::now()),
        });
        *self.snapshot.write().await = next;
    }
}
