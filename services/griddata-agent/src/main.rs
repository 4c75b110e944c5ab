//! NWS gridpoint observation agent.
//!
//! Resolves a configured coordinate to a forecast grid cell, refreshes the
//! gridpoint observation time-series on a fixed schedule, and republishes
//! the latest values:
//! - One resolve+fetch cycle at startup before anything serves data
//! - Non-overlapping scheduled refreshes with drift/invalidation recovery
//! - HTTP status API with per-quantity sensor states
//! - Prometheus metrics

mod config;
mod scheduler;
mod server;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use griddata_core::{GridSensor, NwsClient, ObservationCoordinator, Quantity};

use config::AgentConfig;
use server::ServerState;

#[derive(Parser, Debug)]
#[command(name = "griddata-agent")]
#[command(about = "Polls NWS gridpoint observations for one location")]
struct Args {
    /// Configuration file (YAML with latitude/longitude)
    #[arg(long, env = "GRIDDATA_CONFIG")]
    config: Option<PathBuf>,

    /// Latitude of the observed location (overrides config file)
    #[arg(long, env = "GRIDDATA_LATITUDE", allow_hyphen_values = true)]
    latitude: Option<f64>,

    /// Longitude of the observed location (overrides config file)
    #[arg(long, env = "GRIDDATA_LONGITUDE", allow_hyphen_values = true)]
    longitude: Option<f64>,

    /// Seconds between refresh cycles (overrides config file)
    #[arg(long, env = "GRIDDATA_INTERVAL")]
    interval_secs: Option<u64>,

    /// Run the startup refresh and exit (vs continuous polling)
    #[arg(long)]
    once: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Port for status HTTP server
    #[arg(long, env = "STATUS_PORT", default_value = "8082")]
    status_port: u16,

    /// Disable status HTTP server
    #[arg(long)]
    no_status_server: bool,
}

/// Merge the config file (if any) with command-line overrides.
fn resolve_config(args: &Args) -> Result<AgentConfig> {
    let mut config = match &args.config {
        Some(path) => AgentConfig::load(path)?,
        None => AgentConfig {
            latitude: args.latitude.context("--latitude required without --config")?,
            longitude: args
                .longitude
                .context("--longitude required without --config")?,
            refresh_interval_secs: 300,
            base_url: griddata_core::DEFAULT_BASE_URL.to_string(),
            user_agent: griddata_core::DEFAULT_USER_AGENT.to_string(),
        },
    };

    if let Some(latitude) = args.latitude {
        config.latitude = latitude;
    }
    if let Some(longitude) = args.longitude {
        config.longitude = longitude;
    }
    if let Some(interval) = args.interval_secs {
        config.refresh_interval_secs = interval;
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting griddata agent");

    let config = resolve_config(&args)?;
    let coordinate = config.coordinate();

    // Install the Prometheus recorder before the first refresh so the cycle
    // counters land in it.
    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    let client = NwsClient::with_base_url(&config.base_url, &config.user_agent)
        .context("Failed to create NWS client")?;
    let mut coordinator = ObservationCoordinator::new(coordinate, Arc::new(client));

    // One synchronous resolve+fetch cycle before any consumer reads data.
    coordinator.refresh().await;

    let sensors: Vec<GridSensor> = Quantity::ALL
        .iter()
        .map(|&quantity| GridSensor::new(quantity, coordinate, coordinator.subscribe()))
        .collect();

    for sensor in &sensors {
        info!(
            sensor = %sensor.unique_id(),
            state = sensor.state(),
            "Registered sensor"
        );
    }

    if args.once {
        info!("Single refresh cycle complete");
        let snapshot = coordinator.snapshot();
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    // Shutdown signal
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    // Start status server (unless disabled)
    if !args.no_status_server {
        let server_state = Arc::new(ServerState {
            coordinate,
            snapshot: coordinator.subscribe(),
            sensors,
            prometheus: prometheus_handle,
        });
        let status_port = args.status_port;
        tokio::spawn(async move {
            if let Err(e) = server::run_server(server_state, status_port).await {
                tracing::error!(error = %e, "Status server failed");
            }
        });
    }

    // Handle Ctrl+C
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        shutdown_tx_clone.send(()).ok();
    });

    scheduler::run_forever(
        coordinator,
        Duration::from_secs(config.refresh_interval_secs),
        shutdown_tx.subscribe(),
    )
    .await;

    info!("Agent stopped");
    Ok(())
}
