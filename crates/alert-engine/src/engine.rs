//! One-call façade: diff, debounce, render, filter.

use std::collections::HashSet;
use std::time::Duration;

use tracing::debug;

use crate::alert::Alert;
use crate::debounce::{DebounceState, Debouncer};
use crate::error::EngineError;
use crate::render::render_event;

/// Message texts that must never be sent.
///
/// Filtering happens after the debounce state has been updated, so an
/// ignored message still counts as delivered for bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    texts: HashSet<String>,
}

impl IgnoreList {
    #[must_use]
    pub fn new<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            texts: texts.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_ignored(&self, text: &str) -> bool {
        self.texts.contains(text)
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// Output of one engine cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOutput {
    /// Rendered messages, in send order
    pub messages: Vec<String>,
    /// State to feed into the next cycle
    pub state: DebounceState,
}

/// Turns consecutive alert observations into notification texts.
#[derive(Debug, Clone)]
pub struct AlertEngine {
    debouncer: Debouncer,
    ignored: IgnoreList,
}

impl AlertEngine {
    #[must_use]
    pub fn new(wait_duration: Duration, ignored: IgnoreList) -> Self {
        Self {
            debouncer: Debouncer::new(wait_duration),
            ignored,
        }
    }

    #[must_use]
    pub const fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    /// Run one cycle.
    ///
    /// `now` is measured on the caller's monotonic clock; it only has to be
    /// consistent across calls sharing the same state.
    pub fn process(
        &self,
        previous: &[Alert],
        current: &[Alert],
        state: Option<DebounceState>,
        now: Duration,
    ) -> Result<CycleOutput, EngineError> {
        let (events, state) = self.debouncer.advance(state, previous, current, now)?;

        let mut seen = HashSet::with_capacity(events.len());
        let mut messages = Vec::with_capacity(events.len());
        for event in &events {
            let text = render_event(event);
            if !seen.insert(text.clone()) {
                continue;
            }
            if self.ignored.is_ignored(&text) {
                debug!(alert_id = %event.alert.alert_id, kind = event.kind.as_str(), "Message ignored");
                continue;
            }
            messages.push(text);
        }

        debug!(
            events = events.len(),
            messages = messages.len(),
            pending = state.len(),
            "Processed alert cycle"
        );

        Ok(CycleOutput { messages, state })
    }
}
