pub mod api;
pub mod config;
pub mod db;
pub mod import;
pub mod models;
pub mod registry;

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, ConfigError};
use crate::db::{DatabaseError, RegistryStore, SqliteRegistryStore};
use crate::import::ImportError;

/// Failures that abort startup.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("Failed to start server: {0}")]
    Server(#[from] std::io::Error),
}

/// Open the store and seed it from `config.seed_file` when empty.
pub fn prepare_store(config: &AppConfig) -> Result<Arc<dyn RegistryStore>, StartupError> {
    let store = SqliteRegistryStore::open(&config.database_path)?;
    tracing::info!(path = %config.database_path.display(), "Database ready");

    if let Some(report) = import::seed_if_empty(&config.seed_file, &store)? {
        tracing::info!(
            file = %config.seed_file.display(),
            imported = report.imported,
            rejected = report.rejected,
            "Registry seeded"
        );
    }

    Ok(Arc::new(store))
}

pub async fn run() -> Result<(), StartupError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env()?;
    let store = prepare_store(&config)?;
    let server = api::start_server(store, config.bind_addr).await?;
    tracing::info!(addr = %server.addr, "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    server.stop().await;

    Ok(())
}
