use albums_core::models::{Attachment, NewAttachment};
use albums_core::OwnerRef;
use albums_db::{AlbumStatsStore, AttachmentStore};
use albums_storage::{album_object_key, Storage};
use std::sync::Arc;
use uuid::Uuid;

use super::{UploadError, UploadValidator};
use crate::image::{inspect_blocking, ImageAcceptor, ImageInfo, ImageVerdict};
use crate::import::{promote, OrderAssigner};
use crate::staged::StagedFile;

/// An uploaded file waiting to be checked
#[derive(Debug)]
pub struct PendingImage {
    pub file: StagedFile,
    pub filename: String,
    pub caption: String,
}

/// An upload that passed every check and can be attached
#[derive(Debug)]
pub struct CheckedImage {
    file: StagedFile,
    filename: String,
    caption: String,
    extension: String,
    info: ImageInfo,
}

impl CheckedImage {
    pub fn info(&self) -> ImageInfo {
        self.info
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }
}

/// Attaches directly uploaded images to an album
#[derive(Clone)]
pub struct ImageUploader {
    validator: UploadValidator,
    acceptor: Arc<dyn ImageAcceptor>,
    store: Arc<dyn AttachmentStore>,
    stats: Arc<dyn AlbumStatsStore>,
    storage: Arc<dyn Storage>,
}

impl ImageUploader {
    pub fn new(
        validator: UploadValidator,
        acceptor: Arc<dyn ImageAcceptor>,
        store: Arc<dyn AttachmentStore>,
        stats: Arc<dyn AlbumStatsStore>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            validator,
            acceptor,
            store,
            stats,
            storage,
        }
    }

    /// Validate size, name and content of one upload. A rejected file is
    /// deleted when the pending image drops.
    pub async fn check(&self, image: PendingImage) -> Result<CheckedImage, UploadError> {
        let extension = self
            .validator
            .validate_all(&image.filename, image.file.size())?;

        let verdict =
            inspect_blocking(self.acceptor.clone(), image.file.path().to_path_buf()).await?;
        let info = match verdict {
            ImageVerdict::Valid(info) => info,
            ImageVerdict::Invalid(reason) => {
                tracing::debug!(filename = %image.filename, reason = %reason, "Uploaded file is not a valid image");
                return Err(UploadError::InvalidImage);
            }
        };

        Ok(CheckedImage {
            file: image.file,
            filename: image.filename,
            caption: image.caption,
            extension,
            info,
        })
    }

    /// Upload a new main image: appended at the end of the album and marked primary
    #[tracing::instrument(skip(self, image), fields(owner = %owner, filename = %image.filename))]
    pub async fn upload_main(
        &self,
        owner: &OwnerRef,
        user_id: Option<Uuid>,
        image: PendingImage,
    ) -> Result<Attachment, UploadError> {
        let checked = self.check(image).await?;

        let mut order = OrderAssigner::seeded(self.store.max_order(owner).await?);
        let sort_order = order.next()?;
        let attachment = self.attach(owner, user_id, checked, sort_order).await?;
        let attachment = self
            .store
            .set_primary(owner, attachment.id)
            .await?
            .unwrap_or(attachment);

        self.stats.recalculate(owner).await?;
        tracing::info!(attachment_id = %attachment.id, "Main image uploaded");
        Ok(attachment)
    }

    /// Upload several images at once.
    ///
    /// Every file is checked before the first one is stored, so one bad file
    /// rejects the whole request.
    #[tracing::instrument(skip(self, images), fields(owner = %owner, count = images.len()))]
    pub async fn upload_many(
        &self,
        owner: &OwnerRef,
        user_id: Option<Uuid>,
        images: Vec<PendingImage>,
    ) -> Result<Vec<Attachment>, UploadError> {
        let mut checked = Vec::with_capacity(images.len());
        for image in images {
            checked.push(self.check(image).await?);
        }

        let mut order = OrderAssigner::seeded(self.store.max_order(owner).await?);
        let mut created = Vec::with_capacity(checked.len());
        for image in checked {
            let sort_order = order.next()?;
            created.push(self.attach(owner, user_id, image, sort_order).await?);
        }

        self.stats.recalculate(owner).await?;
        tracing::info!(uploaded = created.len(), "Album images uploaded");
        Ok(created)
    }

    async fn attach(
        &self,
        owner: &OwnerRef,
        user_id: Option<Uuid>,
        image: CheckedImage,
        sort_order: i32,
    ) -> Result<Attachment, UploadError> {
        let storage_key = album_object_key(
            owner,
            &Uuid::new_v4().simple().to_string(),
            Some(&image.extension),
        );
        let file_size = image.file.size() as i64;
        let content_type = image.info.content_type();

        let storage_url = promote(self.storage.as_ref(), image.file, &storage_key, content_type).await?;

        let new_attachment = NewAttachment {
            owner: owner.clone(),
            user_id,
            caption: image.caption,
            sort_order,
            is_primary: false,
            storage_key: storage_key.clone(),
            storage_url,
            original_filename: image.filename,
            content_type: content_type.to_string(),
            file_size,
            width: i32::try_from(image.info.width).ok(),
            height: i32::try_from(image.info.height).ok(),
        };

        match self.store.insert(new_attachment).await {
            Ok(attachment) => Ok(attachment),
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(&storage_key).await {
                    tracing::warn!(error = %cleanup, storage_key = %storage_key, "Failed to remove stored image after insert failure");
                }
                Err(e.into())
            }
        }
    }
}
