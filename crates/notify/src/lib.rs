//! Messaging channels for alert notifications.
//!
//! Messages arrive here already rendered; this crate only delivers them.
//!
//! # Usage
//!
//! ```no_run
//! # async fn demo() {
//! use notify::Notifier;
//!
//! // Create notifier from environment variables
//! let notifier = Notifier::from_env();
//!
//! // Deliver messages in order and inspect the per-channel outcome
//! let results = notifier
//!     .notify_and_wait(&[r"🔥 host\=`db` *disk* free 0\.01".to_string()])
//!     .await;
//! # let _ = results;
//! # }
//! ```
//!
//! # Configuration
//!
//! The notifier is configured via environment variables:
//!
//! - `TELEGRAM_API_TOKEN`: Bot API token (enables the Telegram channel)
//! - `TELEGRAM_CHAT_ID`: chat receiving notifications
//! - `NOTIFY_DISABLED`: Set to "true" to disable all notifications
//!
//! # Architecture
//!
//! - [`NotifyChannel`] trait defines the interface for notification channels
//! - [`TelegramChannel`] implements Telegram Bot API delivery
//! - [`Notifier`] dispatches messages to all enabled channels

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod channels;
pub mod error;

pub use channels::telegram::{ParseMode, TelegramChannel};
pub use channels::NotifyChannel;
pub use error::ChannelError;

use std::sync::Arc;
use tracing::{debug, info, warn};

/// Environment variable to disable all notifications.
const ENV_NOTIFY_DISABLED: &str = "NOTIFY_DISABLED";

/// Per-channel outcome of one message.
pub type DeliveryResult = (String, Result<(), ChannelError>);

/// Central notification dispatcher.
///
/// Every message is sent to every enabled channel. Within a channel,
/// messages keep the order they were given in.
pub struct Notifier {
    channels: Vec<Arc<dyn NotifyChannel>>,
    disabled: bool,
}

impl Notifier {
    /// Create a new notifier from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let disabled = std::env::var(ENV_NOTIFY_DISABLED)
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        if disabled {
            info!("Notifications disabled via NOTIFY_DISABLED");
            return Self::disabled();
        }

        let mut channels: Vec<Arc<dyn NotifyChannel>> = vec![];

        let telegram = TelegramChannel::from_env();
        if telegram.enabled() {
            info!("Telegram notifications enabled");
            channels.push(Arc::new(telegram));
        }

        Self::with_channels(channels)
    }

    /// Create a notifier with specific channels.
    #[must_use]
    pub fn with_channels(channels: Vec<Arc<dyn NotifyChannel>>) -> Self {
        if channels.is_empty() {
            warn!("No notification channels configured");
        } else {
            info!(
                channel_count = channels.len(),
                "Notification system initialized"
            );
        }

        Self {
            channels,
            disabled: false,
        }
    }

    /// Create a disabled notifier (for testing or when notifications are off).
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            channels: vec![],
            disabled: true,
        }
    }

    /// Check if any notification channels are enabled.
    #[must_use]
    pub fn has_channels(&self) -> bool {
        !self.disabled && self.channels.iter().any(|c| c.enabled())
    }

    /// Get the number of configured channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        if self.disabled {
            0
        } else {
            self.channels.len()
        }
    }

    /// Send messages and wait for every channel to finish.
    ///
    /// Returns one entry per (channel, message) pair, in send order.
    pub async fn notify_and_wait(&self, messages: &[String]) -> Vec<DeliveryResult> {
        if self.disabled || self.channels.is_empty() {
            return vec![];
        }

        let mut results = vec![];
        for channel in &self.channels {
            results.extend(deliver(channel.as_ref(), messages).await);
        }
        results
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::from_env()
    }
}

async fn deliver(channel: &dyn NotifyChannel, messages: &[String]) -> Vec<DeliveryResult> {
    let channel_name = channel.name();

    if !channel.enabled() {
        debug!(channel = channel_name, "Channel disabled, skipping");
        return vec![];
    }

    let mut results = Vec::with_capacity(messages.len());
    for text in messages {
        let result = channel.send(text).await;
        match &result {
            Ok(()) => debug!(channel = channel_name, "Notification sent"),
            Err(e) => warn!(channel = channel_name, error = %e, "Notification failed"),
        }
        results.push((channel_name.to_string(), result));
    }
    results
}
