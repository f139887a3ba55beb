//! Alert-state diffing and debounce engine.
//!
//! Given the previously observed alert set, the currently observed one and
//! the debounce state carried from the last cycle, the engine decides which
//! transitions deserve a notification and renders them as Telegram
//! MarkdownV2 text.
//!
//! # Usage
//!
//! ```
//! use std::time::Duration;
//! use alert_engine::{Alert, AlertEngine, IgnoreList};
//!
//! let engine = AlertEngine::new(Duration::from_secs(300), IgnoreList::default());
//! let alert = Alert::new("a1", "watchdog").with_label_json(r#"{"host":"db"}"#);
//!
//! // Opening is provisional until the grace window elapses.
//! let out = engine.process(&[], &[alert.clone()], None, Duration::from_secs(0)).unwrap();
//! assert!(out.messages.is_empty());
//!
//! let out = engine
//!     .process(&[alert.clone()], &[alert], Some(out.state), Duration::from_secs(300))
//!     .unwrap();
//! assert_eq!(out.messages.len(), 1);
//! ```
//!
//! # Architecture
//!
//! - [`diff()`] computes closed/opened alerts keyed by `alert_id`
//! - [`Debouncer`] classifies transitions and evolves [`DebounceState`]
//! - [`render_event`] maps an [`AlertEvent`] to its glyph and MarkdownV2 line
//! - [`AlertEngine`] chains the three and applies the [`IgnoreList`]
//!
//! Nothing here performs I/O; time is passed in explicitly.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod alert;
pub mod debounce;
pub mod diff;
pub mod engine;
pub mod error;
pub mod render;

pub use alert::{Alert, AlertStream};
pub use debounce::{AlertEvent, DebounceState, Debouncer, EventKind};
pub use diff::{diff, AlertDiff};
pub use engine::{AlertEngine, CycleOutput, IgnoreList};
pub use error::{AlertSetSide, EngineError, RenderError};
pub use render::{escape_markdown_v2, render_alert, render_event};
