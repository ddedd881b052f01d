//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;

use crate::state::AppState;
use albums_core::Config;
use albums_db::{AlbumStatsRepository, AttachmentRepository};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Validate configuration, connect everything and build the router
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.environment())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;
    tracing::info!("Configuration loaded and validated successfully");

    let pool = database::setup_database(&config).await?;
    let storage = storage::setup_storage(&config).await?;

    let state = AppState::new(
        config.clone(),
        Arc::new(AttachmentRepository::new(pool.clone())),
        Arc::new(AlbumStatsRepository::new(pool.clone())),
        storage,
    )?
    .with_db_pool(pool);
    let state = Arc::new(state);

    let router = routes::setup_routes(&config, state.clone())?;
    Ok((state, router))
}
