//! pushline CLI entry point

use anyhow::Context;
use clap::Parser;
use tracing::info;

use pushline_cli::{cli::Cli, commands::CommandDispatcher, config::AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    setup_logging(cli.verbose);

    // Load configuration
    let config = load_configuration(&cli)?;

    CommandDispatcher::execute(cli.command, config)
        .await
        .context("Command execution failed")?;

    Ok(())
}

/// Setup logging based on verbosity level
fn setup_logging(verbose: bool) {
    let log_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// Load configuration from file or defaults, then apply command line overrides
fn load_configuration(cli: &Cli) -> anyhow::Result<AppConfig> {
    match &cli.config {
        Some(config_path) => info!("Loading configuration from: {}", config_path.display()),
        None => info!("Using default configuration"),
    }

    AppConfig::load_with_overrides(cli.config.as_deref(), &cli.overrides())
        .context("Invalid configuration")
}
