//! Storage setup and initialization

use albums_core::Config;
use albums_storage::{create_storage, Storage};
use anyhow::{Context, Result};
use std::sync::Arc;

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage")?;

    tracing::info!(
        backend = ?storage.backend_type(),
        rename = storage.supports_rename(),
        "Storage initialized"
    );
    Ok(storage)
}
