//! Alert notifier service.
//!
//! Polls a GraphQL alert source, feeds consecutive observations through
//! [`alert_engine::AlertEngine`] and delivers the resulting messages to a
//! Telegram chat. A small HTTP server exposes health, a development-only
//! dump of the current alerts and the Telegram webhook.

pub mod cli;
pub mod config;
pub mod poller;
pub mod redact;
pub mod server;
pub mod service;
pub mod source;
pub mod state;
pub mod webhook;

pub use config::{Config, ConfigError, ConfigOverrides};
pub use poller::{CycleReport, Poller};
pub use source::{AlertSource, GraphqlAlertSource};
pub use state::{AppState, Snapshot};
