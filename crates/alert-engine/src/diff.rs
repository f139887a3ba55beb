//! Alert set comparison keyed by `alert_id`.

use std::collections::HashSet;

use crate::alert::Alert;
use crate::error::{AlertSetSide, EngineError};

/// Symmetric difference between two observations.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AlertDiff<'a> {
    /// Present before, absent now; in `previous` order
    pub closed: Vec<&'a Alert>,
    /// Absent before, present now; in `current` order
    pub opened: Vec<&'a Alert>,
}

impl AlertDiff<'_> {
    pub fn is_empty(&self) -> bool {
        self.closed.is_empty() && self.opened.is_empty()
    }
}

/// Collect the ids of one observation, rejecting duplicates.
pub(crate) fn alert_ids(
    alerts: &[Alert],
    side: AlertSetSide,
) -> Result<HashSet<&str>, EngineError> {
    let mut ids = HashSet::with_capacity(alerts.len());
    for alert in alerts {
        if !ids.insert(alert.alert_id.as_str()) {
            return Err(EngineError::DuplicateAlertId {
                alert_id: alert.alert_id.clone(),
                side,
            });
        }
    }
    Ok(ids)
}

/// Compare two observations.
///
/// Fails if either side repeats an `alert_id`.
pub fn diff<'a>(previous: &'a [Alert], current: &'a [Alert]) -> Result<AlertDiff<'a>, EngineError> {
    let previous_ids = alert_ids(previous, AlertSetSide::Previous)?;
    let current_ids = alert_ids(current, AlertSetSide::Current)?;

    let closed = previous
        .iter()
        .filter(|a| !current_ids.contains(a.alert_id.as_str()))
        .collect();
    let opened = current
        .iter()
        .filter(|a| !previous_ids.contains(a.alert_id.as_str()))
        .collect();

    Ok(AlertDiff { closed, opened })
}
