//! edsurv dashboard server
//!
//! Run with: cargo run --bin edsurv -- --config config.toml
//!
//! # Configuration
//!
//! Environment variables override the config file:
//! - `EDSURV_TIMESERIES_PATH`: Syndrome time series TSV
//! - `EDSURV_LOCATIONS_PATH`: Facility locations TSV
//! - `EDSURV_HOST`: Host to bind to (default: 0.0.0.0)
//! - `EDSURV_PORT`: Port to listen on (default: 8501)
//! - `EDSURV_LOG_LEVEL`, `EDSURV_LOG_FORMAT`: Logging
//! - `RUST_LOG`: Full filter directive, wins over the log level

use anyhow::Context;
use clap::Parser;
use edsurv::api::{serve, AppState};
use edsurv::config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "edsurv")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Emergency-department syndrome surveillance dashboard")]
struct Args {
    /// Config file (default: search the standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let (config, source) =
        Config::resolve(args.config.as_deref()).context("Failed to load configuration")?;

    edsurv::logging::init(&config.logging);

    tracing::info!("Starting edsurv dashboard v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Config: {}", source);
    tracing::info!("Time series: {:?}", config.data.timeseries_path);
    tracing::info!("Locations: {:?}", config.data.locations_path);

    let dataset = match config.data.load_dataset() {
        Ok(dataset) => dataset,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load surveillance data");
            return Err(e).context("Cannot start without input data");
        }
    };

    let state = AppState::new(dataset, config.api.clone());
    serve(state, &config.api).await.context("Server error")?;

    Ok(())
}
