use albums_core::models::{Attachment, NewAttachment};
use albums_core::{AppError, OwnerRef};
use albums_db::{AlbumStatsStore, AttachmentStore};
use albums_storage::{album_object_key, normalized_extension, Storage, StorageResult};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::{EntryProcessor, ImportError, OrderAssigner};
use crate::archive::ArchiveEntry;
use crate::image::ImageInfo;
use crate::staged::StagedFile;

/// Turn a temporary file into a stored object and return its URL.
///
/// Renames when the backend can, otherwise streams the file and deletes the
/// temporary copy. On failure the temporary file is removed on drop.
pub async fn promote(
    storage: &dyn Storage,
    file: StagedFile,
    storage_key: &str,
    content_type: &str,
) -> StorageResult<String> {
    if storage.supports_rename() {
        let url = storage
            .move_file(file.path(), storage_key, content_type)
            .await?;
        file.disarm();
        Ok(url)
    } else {
        let url = storage
            .upload_file(file.path(), storage_key, content_type)
            .await?;
        file.discard()?;
        Ok(url)
    }
}

/// First key under `stem` that no stored object uses yet.
///
/// Ordering values are reused once images are deleted or reordered, so the
/// plain `{order}.{ext}` key may still belong to another attachment.
async fn available_key(
    storage: &dyn Storage,
    owner: &OwnerRef,
    stem: &str,
    extension: &str,
) -> StorageResult<String> {
    let mut key = album_object_key(owner, stem, Some(extension));
    let mut suffix = 1;
    while storage.exists(&key).await? {
        key = album_object_key(owner, &format!("{}_{}", stem, suffix), Some(extension));
        suffix += 1;
    }
    Ok(key)
}

/// Records accepted archive entries as album attachments of one owner.
///
/// The ordering counter is seeded once in [`AlbumImageProcessor::begin`]. Stats
/// are recomputed once in `finish`, never per insert.
pub struct AlbumImageProcessor {
    store: Arc<dyn AttachmentStore>,
    stats: Arc<dyn AlbumStatsStore>,
    storage: Arc<dyn Storage>,
    owner: OwnerRef,
    user_id: Option<Uuid>,
    order: OrderAssigner,
    created: Vec<Attachment>,
}

impl AlbumImageProcessor {
    /// Read the owner's current maximum ordering value and start a batch
    pub async fn begin(
        store: Arc<dyn AttachmentStore>,
        stats: Arc<dyn AlbumStatsStore>,
        storage: Arc<dyn Storage>,
        owner: OwnerRef,
        user_id: Option<Uuid>,
    ) -> Result<Self, AppError> {
        let max_order = store.max_order(&owner).await?;
        tracing::debug!(owner = %owner, ?max_order, "Starting album import batch");

        Ok(Self {
            store,
            stats,
            storage,
            owner,
            user_id,
            order: OrderAssigner::seeded(max_order),
            created: Vec::new(),
        })
    }

    pub fn owner(&self) -> &OwnerRef {
        &self.owner
    }
}

#[async_trait]
impl EntryProcessor for AlbumImageProcessor {
    type Output = Vec<Attachment>;

    async fn on_accepted(
        &mut self,
        file: StagedFile,
        info: ImageInfo,
        entry: &ArchiveEntry,
        position: usize,
        count: usize,
    ) -> Result<(), ImportError> {
        let sort_order = self.order.next()?;
        let filename = entry.file_name().to_string();
        let extension =
            normalized_extension(&filename).unwrap_or_else(|| info.extension().to_string());
        let storage_key = available_key(
            self.storage.as_ref(),
            &self.owner,
            &sort_order.to_string(),
            &extension,
        )
        .await?;
        let file_size = file.size() as i64;

        let storage_url =
            promote(self.storage.as_ref(), file, &storage_key, info.content_type()).await?;

        let new_attachment = NewAttachment {
            owner: self.owner.clone(),
            user_id: self.user_id,
            caption: String::new(),
            sort_order,
            is_primary: false,
            storage_key: storage_key.clone(),
            storage_url,
            original_filename: filename,
            content_type: info.content_type().to_string(),
            file_size,
            width: i32::try_from(info.width).ok(),
            height: i32::try_from(info.height).ok(),
        };

        match self.store.insert(new_attachment).await {
            Ok(attachment) => {
                tracing::debug!(
                    owner = %self.owner,
                    attachment_id = %attachment.id,
                    sort_order,
                    position,
                    count,
                    "Album image imported"
                );
                self.created.push(attachment);
                Ok(())
            }
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(&storage_key).await {
                    tracing::warn!(
                        error = %cleanup,
                        storage_key = %storage_key,
                        "Failed to remove stored image after insert failure"
                    );
                }
                Err(e.into())
            }
        }
    }

    async fn finish(self) -> Result<Vec<Attachment>, ImportError> {
        let stats = self.stats.recalculate(&self.owner).await?;
        tracing::info!(
            owner = %self.owner,
            imported = self.created.len(),
            image_count = stats.image_count,
            "Album stats recalculated"
        );
        Ok(self.created)
    }
}
