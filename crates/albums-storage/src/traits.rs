//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Move failed: {0}")]
    MoveFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for albums_core::AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => {
                albums_core::AppError::NotFound(format!("Stored file not found: {}", key))
            }
            StorageError::InvalidKey(msg) => albums_core::AppError::InvalidInput(msg),
            other => albums_core::AppError::Storage(other.to_string()),
        }
    }
}

/// Storage abstraction trait
///
/// Keys follow the layout described in the crate documentation. Methods that
/// take a `source` path read from a local file and never buffer it whole.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    /// Whether [`Storage::move_file`] renames within one filesystem.
    ///
    /// When false, moving a file costs a full copy and callers should prefer
    /// streaming it with [`Storage::upload_file`].
    fn supports_rename(&self) -> bool;

    /// Directory on the same filesystem as stored objects, for temporary
    /// files that will later be moved into the store. `None` when the backend
    /// cannot rename.
    fn scratch_dir(&self) -> Option<&Path>;

    /// Move a local file to `storage_key` and return its public URL.
    ///
    /// The source file no longer exists after a successful call.
    async fn move_file(
        &self,
        source: &Path,
        storage_key: &str,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Stream a local file to `storage_key` and return its public URL.
    ///
    /// The source file is left in place.
    async fn upload_file(
        &self,
        source: &Path,
        storage_key: &str,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Delete a file by its storage key. Deleting a missing key succeeds.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Check if a file exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Public URL of a stored key
    fn url_for(&self, storage_key: &str) -> String;
}
