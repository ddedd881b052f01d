//! Application state.
//!
//! Handlers only see the store traits and the storage trait, so the same
//! router runs against Postgres in production and in-memory stores in tests.

use albums_core::{Config, OwnerRef};
use albums_db::{AlbumStatsStore, AttachmentStore};
use albums_processing::{
    DecodingAcceptor, ImageAcceptor, ImageEntryFilter, ImageUploader, ImportCoordinator,
    StreamExtractor, UploadValidator,
};
use albums_storage::Storage;
use anyhow::Context;
use sqlx::PgPool;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::HttpAppError;

/// Album persistence, storage and the import pipeline
#[derive(Clone)]
pub struct AlbumState {
    pub attachments: Arc<dyn AttachmentStore>,
    pub stats: Arc<dyn AlbumStatsStore>,
    pub storage: Arc<dyn Storage>,
    pub importer: ImportCoordinator,
    pub uploader: ImageUploader,
    /// Where inbound uploads are staged before processing
    pub temp_dir: PathBuf,
    pub max_image_size: u64,
    pub max_archive_size: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub albums: AlbumState,
    /// Set when the stores are Postgres-backed; probed by the readiness check
    pub db_pool: Option<PgPool>,
}

impl AppState {
    /// Wire the import pipeline and uploader on top of the given collaborators
    pub fn new(
        config: Config,
        attachments: Arc<dyn AttachmentStore>,
        stats: Arc<dyn AlbumStatsStore>,
        storage: Arc<dyn Storage>,
    ) -> anyhow::Result<Self> {
        let temp_dir = staging_dir(storage.as_ref(), &config);
        std::fs::create_dir_all(&temp_dir)
            .with_context(|| format!("Failed to create temp dir {}", temp_dir.display()))?;

        let acceptor: Arc<dyn ImageAcceptor> = Arc::new(DecodingAcceptor);
        let extractor = StreamExtractor::new(&temp_dir)
            .with_chunk_size(config.import_chunk_size_bytes())
            .context("Invalid import chunk size")?;
        let importer = ImportCoordinator::new(
            Arc::new(ImageEntryFilter::new(config.image_extensions())),
            acceptor.clone(),
            extractor,
        );

        let max_image_size = config.max_image_size_bytes() as u64;
        let uploader = ImageUploader::new(
            UploadValidator::new(max_image_size, config.image_extensions().to_vec()),
            acceptor,
            attachments.clone(),
            stats.clone(),
            storage.clone(),
        );

        tracing::info!(
            temp_dir = %temp_dir.display(),
            rename = storage.supports_rename(),
            chunk_size = config.import_chunk_size_bytes(),
            "Album import pipeline configured"
        );

        Ok(Self {
            albums: AlbumState {
                attachments,
                stats,
                storage,
                importer,
                uploader,
                temp_dir,
                max_image_size,
                max_archive_size: config.max_archive_size_bytes() as u64,
            },
            config,
            db_pool: None,
        })
    }

    pub fn with_db_pool(mut self, pool: PgPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Resolve an owner from route parameters; unknown owner kinds are not found
    pub fn owner(&self, owner_type: &str, owner_id: Uuid) -> Result<OwnerRef, HttpAppError> {
        if !self.config.allows_owner_type(owner_type) {
            return Err(HttpAppError(albums_core::AppError::NotFound(format!(
                "Album owner type '{}' not found",
                owner_type
            ))));
        }
        Ok(OwnerRef::new(owner_type, owner_id))
    }
}

/// Temporary files go next to stored objects when the backend can rename,
/// so promotion never copies
fn staging_dir(storage: &dyn Storage, config: &Config) -> PathBuf {
    match storage.scratch_dir() {
        Some(dir) if storage.supports_rename() => Path::to_path_buf(dir),
        _ => config.import_temp_dir(),
    }
}
