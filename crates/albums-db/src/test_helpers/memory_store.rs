//! In-memory attachment store for testing

use albums_core::models::{
    plan_reorder, AlbumStats, Attachment, NewAttachment, OrderItem, ReorderOutcome,
};
use albums_core::{AppError, OwnerRef};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::store_traits::{AlbumStatsStore, AttachmentStore};

/// Attachment and stats store backed by hash maps
#[derive(Clone, Default)]
pub struct MemoryAttachmentStore {
    attachments: Arc<Mutex<HashMap<Uuid, Attachment>>>,
    stats: Arc<Mutex<HashMap<OwnerRef, AlbumStats>>>,
    recalculations: Arc<AtomicUsize>,
    fail_inserts: Arc<AtomicBool>,
}

impl MemoryAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an attachment directly, bypassing the trait
    pub fn add(&self, attachment: Attachment) {
        self.attachments
            .lock()
            .unwrap()
            .insert(attachment.id, attachment);
    }

    /// Seed a minimal attachment for `owner` with the given ordering value
    pub fn seed(&self, owner: &OwnerRef, sort_order: i32) -> Attachment {
        let now = Utc::now();
        let attachment = Attachment {
            id: Uuid::new_v4(),
            owner_type: owner.owner_type.clone(),
            owner_id: owner.owner_id,
            user_id: None,
            caption: String::new(),
            sort_order,
            is_primary: false,
            storage_key: format!("seed/{}.jpg", sort_order),
            storage_url: format!("http://localhost/seed/{}.jpg", sort_order),
            original_filename: format!("{}.jpg", sort_order),
            content_type: "image/jpeg".to_string(),
            file_size: 0,
            width: None,
            height: None,
            created_at: now,
            updated_at: now,
        };
        self.add(attachment.clone());
        attachment
    }

    /// Snapshot of one owner's attachments in ordering sequence
    pub fn snapshot(&self, owner: &OwnerRef) -> Vec<Attachment> {
        let mut rows: Vec<Attachment> = self
            .attachments
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.belongs_to(owner))
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.sort_order);
        rows
    }

    /// How many times `recalculate` ran
    pub fn recalculation_count(&self) -> usize {
        self.recalculations.load(Ordering::SeqCst)
    }

    /// Make every subsequent insert fail with a database-style error
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AttachmentStore for MemoryAttachmentStore {
    async fn max_order(&self, owner: &OwnerRef) -> Result<Option<i32>, AppError> {
        Ok(self
            .attachments
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.belongs_to(owner))
            .map(|a| a.sort_order)
            .max())
    }

    async fn insert(&self, attachment: NewAttachment) -> Result<Attachment, AppError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Internal("insert failed".to_string()));
        }

        let mut attachments = self.attachments.lock().unwrap();
        let duplicate = attachments
            .values()
            .any(|a| a.belongs_to(&attachment.owner) && a.sort_order == attachment.sort_order);
        if duplicate {
            return Err(AppError::Internal(format!(
                "duplicate ordering value {}",
                attachment.sort_order
            )));
        }

        let now = Utc::now();
        let row = Attachment {
            id: Uuid::new_v4(),
            owner_type: attachment.owner.owner_type,
            owner_id: attachment.owner.owner_id,
            user_id: attachment.user_id,
            caption: attachment.caption,
            sort_order: attachment.sort_order,
            is_primary: attachment.is_primary,
            storage_key: attachment.storage_key,
            storage_url: attachment.storage_url,
            original_filename: attachment.original_filename,
            content_type: attachment.content_type,
            file_size: attachment.file_size,
            width: attachment.width,
            height: attachment.height,
            created_at: now,
            updated_at: now,
        };
        attachments.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list_for_owner(&self, owner: &OwnerRef) -> Result<Vec<Attachment>, AppError> {
        Ok(self.snapshot(owner))
    }

    async fn get_for_owner(
        &self,
        owner: &OwnerRef,
        id: Uuid,
    ) -> Result<Option<Attachment>, AppError> {
        Ok(self
            .attachments
            .lock()
            .unwrap()
            .get(&id)
            .filter(|a| a.belongs_to(owner))
            .cloned())
    }

    async fn neighbours(
        &self,
        owner: &OwnerRef,
        sort_order: i32,
    ) -> Result<(Option<Uuid>, Option<Uuid>), AppError> {
        let rows = self.snapshot(owner);
        let prev = rows
            .iter()
            .rev()
            .find(|a| a.sort_order < sort_order)
            .map(|a| a.id);
        let next = rows.iter().find(|a| a.sort_order > sort_order).map(|a| a.id);
        Ok((prev, next))
    }

    async fn update_caption(
        &self,
        owner: &OwnerRef,
        id: Uuid,
        caption: &str,
    ) -> Result<Option<Attachment>, AppError> {
        let mut attachments = self.attachments.lock().unwrap();
        Ok(attachments
            .get_mut(&id)
            .filter(|a| a.belongs_to(owner))
            .map(|a| {
                a.caption = caption.to_string();
                a.updated_at = Utc::now();
                a.clone()
            }))
    }

    async fn set_primary(
        &self,
        owner: &OwnerRef,
        id: Uuid,
    ) -> Result<Option<Attachment>, AppError> {
        let mut attachments = self.attachments.lock().unwrap();
        if !attachments.get(&id).is_some_and(|a| a.belongs_to(owner)) {
            return Ok(None);
        }

        for attachment in attachments.values_mut().filter(|a| a.belongs_to(owner)) {
            attachment.is_primary = attachment.id == id;
        }
        Ok(attachments.get(&id).cloned())
    }

    async fn clear_primary(&self, owner: &OwnerRef) -> Result<u64, AppError> {
        let mut attachments = self.attachments.lock().unwrap();
        let mut changed = 0;
        for attachment in attachments
            .values_mut()
            .filter(|a| a.belongs_to(owner) && a.is_primary)
        {
            attachment.is_primary = false;
            changed += 1;
        }
        Ok(changed)
    }

    async fn delete(&self, owner: &OwnerRef, id: Uuid) -> Result<Option<Attachment>, AppError> {
        let mut attachments = self.attachments.lock().unwrap();
        if attachments.get(&id).is_some_and(|a| a.belongs_to(owner)) {
            Ok(attachments.remove(&id))
        } else {
            Ok(None)
        }
    }

    async fn apply_order(
        &self,
        owner: &OwnerRef,
        items: &[OrderItem],
    ) -> Result<ReorderOutcome, AppError> {
        let mut attachments = self.attachments.lock().unwrap();
        let current: Vec<(Uuid, i32)> = attachments
            .values()
            .filter(|a| a.belongs_to(owner))
            .map(|a| (a.id, a.sort_order))
            .collect();

        let changes = match plan_reorder(&current, items) {
            Ok(changes) => changes,
            Err(outcome) => return Ok(outcome),
        };

        for (id, sort_order) in changes {
            if let Some(attachment) = attachments.get_mut(&id) {
                attachment.sort_order = sort_order;
            }
        }
        Ok(ReorderOutcome::Applied)
    }
}

#[async_trait]
impl AlbumStatsStore for MemoryAttachmentStore {
    async fn recalculate(&self, owner: &OwnerRef) -> Result<AlbumStats, AppError> {
        self.recalculations.fetch_add(1, Ordering::SeqCst);
        let image_count = self.snapshot(owner).len() as i64;
        let stats = AlbumStats {
            owner_type: owner.owner_type.clone(),
            owner_id: owner.owner_id,
            image_count,
            updated_at: Utc::now(),
        };
        self.stats
            .lock()
            .unwrap()
            .insert(owner.clone(), stats.clone());
        Ok(stats)
    }

    async fn get(&self, owner: &OwnerRef) -> Result<Option<AlbumStats>, AppError> {
        Ok(self.stats.lock().unwrap().get(owner).cloned())
    }
}
