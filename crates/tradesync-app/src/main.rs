//! tradesync - account trade history synchronizer.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Account trade history synchronizer
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via TRADESYNC_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tradesync_telemetry::init_logging()?;

    info!("Starting tradesync v{}", env!("CARGO_PKG_VERSION"));

    // Config path: CLI arg > TRADESYNC_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var(tradesync_app::config::CONFIG_ENV).ok())
        .unwrap_or_else(|| tradesync_app::config::DEFAULT_CONFIG_PATH.to_string());

    info!(config_path = %config_path, "Loading configuration");

    let config = tradesync_app::AppConfig::from_file(&config_path)?;
    info!(
        venue = ?config.venue.kind,
        symbols = ?config.symbols,
        data_dir = %config.store.data_dir,
        journal = config.store.journal,
        "Configuration loaded"
    );

    let app = tradesync_app::Application::new(config)?;
    app.run().await?;

    Ok(())
}
