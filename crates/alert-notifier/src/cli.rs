//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::ConfigOverrides;

/// Announce alert lifecycle changes in Telegram
#[derive(Parser)]
#[command(name = "alert-notifier")]
#[command(about = "Polls active alerts and announces opened and closed alerts in Telegram")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to the YAML config file
    #[arg(long = "conf", env = "CONF_FILE", global = true)]
    pub conf: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the poller and HTTP server (default)
    Serve,
    /// Fetch the active alerts once, print them and exit
    Query,
}

impl Cli {
    /// Subcommand to run, `serve` when none is given.
    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Serve)
    }

    /// Log filter used when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "alert_notifier=debug,alert_engine=debug,notify=debug,tower_http=debug,info"
        } else {
            "alert_notifier=info,warn"
        }
    }
}
