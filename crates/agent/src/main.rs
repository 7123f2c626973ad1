use std::{
    fs::{self, OpenOptions},
    sync::{Arc, Mutex},
};

use anyhow::{Context, Result};
use dzsm_core::{
    config::{self, WatcherConfig},
    CatalogDumper, DumpGate, JsonWorldFile, MemoryConfigStore, Mission, NullProbe,
    ReportScheduler, WorldSnapshotProvider,
};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config_file = config::ensure_default_config()?;
    let config = WatcherConfig::load_from(&config_file.path)
        .with_context(|| format!("invalid configuration in {}", config_file.path.display()))?;
    init_logging(config.debug)?;
    if config_file.created {
        info!(path = %config_file.path.display(), "wrote default configuration");
    }
    info!(
        path = %config_file.path.display(),
        role = ?config.role,
        sink = ?config.sink_mode(),
        "configuration loaded"
    );

    let world: Arc<dyn WorldSnapshotProvider> =
        Arc::new(JsonWorldFile::new(&config.world_snapshot));
    let catalog = catalog_dumper(&config);

    let mut mission = Mission::new(config.role);
    let started = mission.on_mission_start(|| ReportScheduler::new(config.clone(), world, catalog));
    if !started {
        info!("client process, nothing to watch");
        return Ok(());
    }

    signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown requested");
    if let Some(state) = mission.on_mission_finish().await {
        info!(?state, "watcher finished");
    }
    Ok(())
}

fn catalog_dumper(config: &WatcherConfig) -> Option<CatalogDumper> {
    if !config.data_dump {
        return None;
    }
    let Some(export) = config.config_export.as_ref() else {
        warn!("data_dump is set but config_export is not, catalog dump disabled");
        return None;
    };
    match MemoryConfigStore::load(export) {
        Ok(store) => Some(CatalogDumper::new(
            Box::new(store),
            Box::new(NullProbe),
            DumpGate::new(&config.profile_dir),
        )),
        Err(err) => {
            warn!(?err, "config export unavailable, catalog dump disabled");
            None
        }
    }
}

fn init_logging(debug: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("dzsm-watcher.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let default_level = if debug { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stdout);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(())
}
