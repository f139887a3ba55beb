//! Flap debouncing across polling cycles.
//!
//! Newly opened alerts are held in a pending map until their grace window
//! elapses. An alert that closes while still pending is reported as
//! short-lived and never announced as opened.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::alert::Alert;
use crate::diff::{diff, AlertDiff};
use crate::error::EngineError;

/// Classification of one alert transition.
///
/// The declaration order is the order events are emitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Closed after having been confirmed (or before any debounce state existed)
    ClosedLongLived,
    /// Closed while still inside its grace window
    ClosedShortLived,
    /// Stayed open for the whole grace window
    OpenedConfirmed,
}

impl EventKind {
    /// Leading glyph used in rendered notifications.
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::ClosedLongLived => "\u{1F334}",
            Self::ClosedShortLived => "\u{267B}\u{FE0F}",
            Self::OpenedConfirmed => "\u{1F525}",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClosedLongLived => "closed_long_lived",
            Self::ClosedShortLived => "closed_short_lived",
            Self::OpenedConfirmed => "opened_confirmed",
        }
    }
}

/// A classified transition for a single alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEvent {
    pub kind: EventKind,
    pub alert: Alert,
}

impl AlertEvent {
    fn new(kind: EventKind, alert: &Alert) -> Self {
        Self {
            kind,
            alert: alert.clone(),
        }
    }
}

/// Debounce bookkeeping carried from one cycle to the next.
///
/// Maps each pending `alert_id` to the instant (on the caller's monotonic
/// clock) at which it gets confirmed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebounceState {
    pending: BTreeMap<String, Duration>,
}

impl DebounceState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn contains(&self, alert_id: &str) -> bool {
        self.pending.contains_key(alert_id)
    }

    /// Confirmation deadline of a pending alert.
    pub fn deadline(&self, alert_id: &str) -> Option<Duration> {
        self.pending.get(alert_id).copied()
    }

    /// Pending alerts with their deadlines, sorted by id.
    pub fn pending(&self) -> impl Iterator<Item = (&str, Duration)> {
        self.pending.iter().map(|(id, d)| (id.as_str(), *d))
    }
}

/// Classifies alert transitions using a single grace window.
#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    wait_duration: Duration,
}

impl Debouncer {
    #[must_use]
    pub const fn new(wait_duration: Duration) -> Self {
        Self { wait_duration }
    }

    #[must_use]
    pub const fn wait_duration(&self) -> Duration {
        self.wait_duration
    }

    /// Advance the debounce state by one observation.
    ///
    /// Consumes the previous state (`None` on the first cycle) and returns the
    /// events of this cycle together with the state for the next one. Events
    /// are grouped as closed-long-lived, closed-short-lived, opened-confirmed.
    pub fn advance(
        &self,
        state: Option<DebounceState>,
        previous: &[Alert],
        current: &[Alert],
        now: Duration,
    ) -> Result<(Vec<AlertEvent>, DebounceState), EngineError> {
        let AlertDiff { closed, opened } = diff(previous, current)?;
        let mut pending = state.unwrap_or_default().pending;

        let mut closed_long = Vec::new();
        let mut closed_short = Vec::new();
        for alert in closed {
            if pending.remove(&alert.alert_id).is_some() {
                debug!(alert_id = %alert.alert_id, "Alert closed inside grace window");
                closed_short.push(AlertEvent::new(EventKind::ClosedShortLived, alert));
            } else {
                debug!(alert_id = %alert.alert_id, "Alert closed");
                closed_long.push(AlertEvent::new(EventKind::ClosedLongLived, alert));
            }
        }

        for alert in opened {
            let deadline = now.saturating_add(self.wait_duration);
            debug!(
                alert_id = %alert.alert_id,
                deadline_secs = deadline.as_secs_f64(),
                "Alert opened, pending confirmation"
            );
            pending.insert(alert.alert_id.clone(), deadline);
        }

        let mut confirmed = Vec::new();
        for alert in current {
            let due = pending
                .get(&alert.alert_id)
                .is_some_and(|deadline| *deadline <= now);
            if due {
                pending.remove(&alert.alert_id);
                debug!(alert_id = %alert.alert_id, "Alert confirmed open");
                confirmed.push(AlertEvent::new(EventKind::OpenedConfirmed, alert));
            }
        }

        let current_ids: HashSet<&str> = current.iter().map(|a| a.alert_id.as_str()).collect();
        let stale: Vec<String> = pending
            .keys()
            .filter(|id| !current_ids.contains(id.as_str()))
            .cloned()
            .collect();
        if !stale.is_empty() {
            error!(
                stale = ?stale,
                "Debounce state references alerts missing from both observations"
            );
            debug_assert!(
                stale.is_empty(),
                "pending alerts not present in current set: {stale:?}"
            );
            for id in &stale {
                pending.remove(id);
            }
        }

        let mut events = closed_long;
        events.append(&mut closed_short);
        events.append(&mut confirmed);

        Ok((events, DebounceState { pending }))
    }
}
