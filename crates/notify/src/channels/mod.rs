//! Delivery channels.

pub mod telegram;

use async_trait::async_trait;

use crate::error::ChannelError;

/// A destination for rendered alert messages.
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    /// Short name used in logs and delivery results.
    fn name(&self) -> &'static str;

    /// Whether the channel has everything it needs to deliver.
    fn enabled(&self) -> bool;

    /// Deliver one message, already formatted for this channel.
    async fn send(&self, text: &str) -> Result<(), ChannelError>;
}
