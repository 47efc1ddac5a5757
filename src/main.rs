//! FRM exporter - trip timing for Satisfactory factories
//!
//! Polls the Ficsit Remote Monitoring web server and exposes train and vehicle
//! trip durations plus pass-through telemetry as Prometheus metrics.
//!
//! Module structure:
//! - `domain/` - Snapshot records and trip state
//! - `io/` - External interfaces (FRM HTTP client, Prometheus endpoint)
//! - `services/` - Trip inference and collectors
//! - `infra/` - Infrastructure (Config, Clock, Metrics)

use clap::Parser;
use frm_exporter::domain::types::{ProductionRecord, TrainRecord, VehicleRecord};
use frm_exporter::infra::{Clock, Config, Metrics, SystemClock};
use frm_exporter::io::frm::{PRODUCTION_ENDPOINT, TRAINS_ENDPOINT, VEHICLES_ENDPOINT};
use frm_exporter::io::{FrmClient, FrmSource};
use frm_exporter::services::{
    run_collector, Collect, ProductionCollector, TrainDetector, TripCollector, VehicleDetector,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// FRM exporter - Satisfactory trip timing metrics
#[derive(Parser, Debug)]
#[command(name = "frm-exporter", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=debug shows registrations, evictions and every trip event
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        git_hash = env!("GIT_HASH"),
        "frm-exporter starting"
    );

    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    info!(
        config_file = %config.config_file(),
        interval_secs = config.poll_interval_secs(),
        trains = config.trains_enabled(),
        vehicles = config.vehicles_enabled(),
        production = config.production_enabled(),
        nearby_distance = config.nearby_distance(),
        heading_tolerance_deg = config.heading_tolerance_deg(),
        prometheus_port = config.prometheus_port(),
        "config_loaded"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let metrics = Arc::new(Metrics::new());
    metrics.set_build_info(env!("CARGO_PKG_VERSION"), env!("GIT_HASH"));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let client = Arc::new(FrmClient::from_config(&config)?);
    info!(
        frm_address = %client.address(),
        timeout_ms = config.frm_timeout_ms(),
        "frm_client_ready"
    );

    let mut collectors: Vec<Arc<dyn Collect>> = Vec::new();

    if config.trains_enabled() {
        collectors.push(Arc::new(TripCollector::new(
            "trains",
            FrmSource::<TrainRecord>::new(client.clone(), TRAINS_ENDPOINT),
            TrainDetector::new(),
            clock.clone(),
            metrics.clone(),
        )));
    }

    if config.vehicles_enabled() {
        collectors.push(Arc::new(TripCollector::new(
            "vehicles",
            FrmSource::<VehicleRecord>::new(client.clone(), VEHICLES_ENDPOINT),
            VehicleDetector::from_config(&config),
            clock.clone(),
            metrics.clone(),
        )));
    }

    if config.production_enabled() {
        collectors.push(Arc::new(ProductionCollector::new(
            FrmSource::<ProductionRecord>::new(client.clone(), PRODUCTION_ENDPOINT),
            metrics.clone(),
        )));
    }

    let period = Duration::from_secs(config.poll_interval_secs());
    let mut handles = Vec::with_capacity(collectors.len());
    for collector in collectors {
        handles.push(tokio::spawn(run_collector(collector, period, shutdown_rx.clone())));
    }

    // Start Prometheus metrics HTTP server (if port > 0)
    let prometheus_port = config.prometheus_port();
    if prometheus_port > 0 {
        let prom_metrics = metrics.clone();
        let prom_shutdown = shutdown_rx.clone();
        let bind_address = config.bind_address().to_string();
        tokio::spawn(async move {
            if let Err(e) = frm_exporter::io::prometheus::start_metrics_server(
                &bind_address,
                prometheus_port,
                prom_metrics,
                prom_shutdown,
            )
            .await
            {
                tracing::error!(error = %e, "Prometheus metrics server error");
            }
        });
    }

    tokio::signal::ctrl_c().await?;
    info!("shutdown_signal_received");
    let _ = shutdown_tx.send(true);

    for handle in handles {
        let _ = handle.await;
    }

    info!("frm-exporter shutdown complete");
    Ok(())
}
