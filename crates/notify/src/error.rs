//! Delivery errors.

use thiserror::Error;

/// Why a message could not be delivered.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Transport failure. Request URLs are stripped before this is built
    /// because they may carry credentials.
    #[error("request to messaging API failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A required setting (named by its environment variable) is missing
    #[error("{0} is not set")]
    NotConfigured(String),

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The API answered but refused the call
    #[error("{method} rejected with status {status}: {description}")]
    Api {
        method: String,
        status: u16,
        description: String,
    },
}
