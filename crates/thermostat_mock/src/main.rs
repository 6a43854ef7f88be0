use std::path::PathBuf;

use clap::Parser;
use thermostat_mock::Config;
use thermostat_mock::LogLevel;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Mock HTTP thermostat for integration testing
#[derive(Debug, Parser)]
#[command(name = "thermostat-mock", version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// IP address to listen on (overrides the config file)
    #[arg(long)]
    listen: Option<String>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Global log level (overrides the config file)
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_overrides(cli.listen, cli.port, cli.log_level);

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(config.logging.targets())
        .init();

    tracing::info!("thermostat-mock starting");
    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from: {}", path.display());
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received shutdown signal"),
            Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
        }
        shutdown_tx.send(()).ok();
    });

    thermostat_mock::api::serve(
        &config.server.listen,
        config.server.port,
        config.thermostat,
        shutdown_rx,
    )
    .await?;

    tracing::info!("thermostat-mock shutdown complete");

    Ok(())
}
