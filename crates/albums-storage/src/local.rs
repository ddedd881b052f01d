use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Name of the scratch directory kept under the storage root
const SCRATCH_DIR: &str = ".scratch";

/// Local filesystem storage implementation
///
/// Temporary files created under [`Storage::scratch_dir`] share the storage
/// root's filesystem, so moving them into the store is a rename.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    scratch_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/albums/media")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:4000/media")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();
        let scratch_path = base_path.join(SCRATCH_DIR);

        fs::create_dir_all(&scratch_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                scratch_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
            scratch_path,
        })
    }

    /// Convert storage key to filesystem path
    ///
    /// Rejects keys that could escape the base storage directory.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty() || storage_key.contains("..") || storage_key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let relative = Path::new(storage_key);
        if !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok(self.base_path.join(relative))
    }

    /// Generate public URL for file
    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Copy `source` to `path` through a fixed-size buffer and fsync it.
    async fn copy_into(&self, source: &Path, path: &Path) -> StorageResult<u64> {
        let mut reader = fs::File::open(source).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to open {}: {}", source.display(), e))
        })?;

        let mut file = fs::File::create(path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        let copied = tokio::io::copy(&mut reader, &mut file).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        Ok(copied)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }

    fn supports_rename(&self) -> bool {
        true
    }

    fn scratch_dir(&self) -> Option<&Path> {
        Some(&self.scratch_path)
    }

    async fn move_file(
        &self,
        source: &Path,
        storage_key: &str,
        _content_type: &str,
    ) -> StorageResult<String> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&path).await?;

        if let Err(rename_err) = fs::rename(source, &path).await {
            // Different filesystem: fall back to copy and remove.
            tracing::debug!(
                error = %rename_err,
                source = %source.display(),
                "Rename failed, copying instead"
            );
            self.copy_into(source, &path).await.map_err(|e| {
                StorageError::MoveFailed(format!("Failed to move {}: {}", source.display(), e))
            })?;
            fs::remove_file(source).await?;
        }

        let url = self.generate_url(storage_key);

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage move successful"
        );

        Ok(url)
    }

    async fn upload_file(
        &self,
        source: &Path,
        storage_key: &str,
        _content_type: &str,
    ) -> StorageResult<String> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&path).await?;
        let bytes_copied = self.copy_into(source, &path).await?;

        let url = self.generate_url(storage_key);

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = bytes_copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(url)
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    fn url_for(&self, storage_key: &str) -> String {
        self.generate_url(storage_key)
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn storage_in(dir: &Path) -> LocalStorage {
        LocalStorage::new(dir, "http://localhost:4000/media".to_string())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_move_file_renames_into_store() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let scratch = storage.scratch_dir().unwrap().join("entry.tmp");
        std::fs::write(&scratch, b"image bytes").unwrap();

        let url = storage
            .move_file(&scratch, "albums/user/abc/1.jpg", "image/jpeg")
            .await
            .unwrap();

        assert_eq!(url, "http://localhost:4000/media/albums/user/abc/1.jpg");
        assert!(!scratch.exists());
        assert!(storage.exists("albums/user/abc/1.jpg").await.unwrap());
        assert_eq!(
            std::fs::read(dir.path().join("albums/user/abc/1.jpg")).unwrap(),
            b"image bytes"
        );
    }

    #[tokio::test]
    async fn test_move_file_across_directories_outside_root() {
        let dir = tempdir().unwrap();
        let elsewhere = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let source = elsewhere.path().join("upload.png");
        std::fs::write(&source, b"png").unwrap();

        storage
            .move_file(&source, "albums/user/abc/2.png", "image/png")
            .await
            .unwrap();

        assert!(!source.exists());
        assert!(storage.exists("albums/user/abc/2.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_upload_file_keeps_source() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let source = dir.path().join("source.gif");
        std::fs::write(&source, b"gif").unwrap();

        storage
            .upload_file(&source, "albums/user/abc/3.gif", "image/gif")
            .await
            .unwrap();

        assert!(source.exists());
        assert!(storage.exists("albums/user/abc/3.gif").await.unwrap());
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let result = storage.delete("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("./albums/x").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_local_storage_delete_nonexistent() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        assert!(storage.delete("albums/user/abc/missing.jpg").await.is_ok());
    }

    #[tokio::test]
    async fn test_capabilities() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        assert!(storage.supports_rename());
        assert_eq!(storage.backend_type(), StorageBackend::Local);
        assert!(storage.scratch_dir().unwrap().is_dir());
    }
}
