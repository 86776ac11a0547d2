// File: fleet-snapshot/src/main.rs
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use fleet_snapshot::constants::defaults;
use fleet_snapshot::{ConfigManager, Database, FleetApi, HttpFleetClient, ReconcileScheduler, SnapshotReconciler};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with reduced verbosity
    let env_filter = EnvFilter::from_default_env()
        .add_directive("fleet_snapshot=info".parse()?)
        .add_directive("tokio_cron_scheduler=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?)
        .add_directive("sqlx=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("Starting fleet snapshot scheduler");

    // Load configuration
    let config_dir = std::env::var(defaults::CONFIG_DIR_ENV).unwrap_or_else(|_| defaults::CONFIG_DIR.to_string());
    let config_manager = ConfigManager::new(config_dir.clone()).await?;
    let config = config_manager.get_current_config();
    info!(
        "Configuration loaded from {}: {} snapshots, fleet API at {}",
        config_dir,
        config.snapshots.len(),
        config.fleet_api.base_url
    );

    if config.snapshots.is_empty() {
        warn!("No snapshots configured - the scheduler will only tick");
    }

    // Initialize database
    let database = Arc::new(Database::new(&config.database_path).await?);
    info!("Database initialized");

    let recovered = database.recover_interrupted_runs().await?;
    if !recovered.is_empty() {
        warn!(
            "Marked {} interrupted captures ({} run records) as failed",
            recovered.snapshots, recovered.runs
        );
    }

    database.sync_definitions(&config.snapshot_specs(), Utc::now()).await?;

    // Fleet API client
    let fleet: Arc<dyn FleetApi> = Arc::new(HttpFleetClient::new(&config.fleet_api)?);
    info!("Fleet API client initialized");

    let reconciler = Arc::new(SnapshotReconciler::new(
        database.clone(),
        fleet,
        config.snapshot_names(),
    ));

    let scheduler = ReconcileScheduler::new(reconciler).await?;
    scheduler.start(&config.reconcile_schedule).await?;

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }

    // In-flight captures are dropped with the runtime; their partial directories stay on disk.
    scheduler.shutdown().await?;
    info!("Fleet snapshot scheduler stopped");

    Ok(())
}
