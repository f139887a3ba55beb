use alert_notifier::cli::{Cli, Commands};
use alert_notifier::service;
use alert_notifier::Config;
use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.default_log_filter()));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = Config::load(cli.conf.as_deref(), cli.overrides.clone())
        .context("Failed to load configuration")?;
    tracing::debug!(config = ?config, "Configuration loaded");

    match cli.command() {
        Commands::Serve => service::serve(config).await,
        Commands::Query => service::query(config).await,
    }
}
