//! Store trait abstractions
//!
//! The minimal interface the import pipeline and the HTTP layer need from
//! persistence, so both can be exercised without a database.

use albums_core::models::{AlbumStats, Attachment, NewAttachment, OrderItem, ReorderOutcome};
use albums_core::{AppError, OwnerRef};
use async_trait::async_trait;
use uuid::Uuid;

/// Attachment persistence, always scoped to one owner
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Highest ordering value among the owner's attachments
    async fn max_order(&self, owner: &OwnerRef) -> Result<Option<i32>, AppError>;

    /// Insert a new attachment row
    async fn insert(&self, attachment: NewAttachment) -> Result<Attachment, AppError>;

    /// All attachments of the owner in ordering sequence
    async fn list_for_owner(&self, owner: &OwnerRef) -> Result<Vec<Attachment>, AppError>;

    async fn get_for_owner(
        &self,
        owner: &OwnerRef,
        id: Uuid,
    ) -> Result<Option<Attachment>, AppError>;

    /// Ids of the attachments immediately before and after `sort_order`
    async fn neighbours(
        &self,
        owner: &OwnerRef,
        sort_order: i32,
    ) -> Result<(Option<Uuid>, Option<Uuid>), AppError>;

    async fn update_caption(
        &self,
        owner: &OwnerRef,
        id: Uuid,
        caption: &str,
    ) -> Result<Option<Attachment>, AppError>;

    /// Mark one attachment primary and unmark every other one of the owner
    async fn set_primary(
        &self,
        owner: &OwnerRef,
        id: Uuid,
    ) -> Result<Option<Attachment>, AppError>;

    /// Unmark the owner's primary attachment; returns how many rows changed
    async fn clear_primary(&self, owner: &OwnerRef) -> Result<u64, AppError>;

    /// Delete one attachment, returning the removed row
    async fn delete(&self, owner: &OwnerRef, id: Uuid) -> Result<Option<Attachment>, AppError>;

    /// Apply a reorder batch atomically. Nothing changes unless the outcome is
    /// [`ReorderOutcome::Applied`].
    async fn apply_order(
        &self,
        owner: &OwnerRef,
        items: &[OrderItem],
    ) -> Result<ReorderOutcome, AppError>;
}

/// The owner's denormalized aggregate fields
#[async_trait]
pub trait AlbumStatsStore: Send + Sync {
    /// Recompute the aggregate from the attachment rows
    async fn recalculate(&self, owner: &OwnerRef) -> Result<AlbumStats, AppError>;

    async fn get(&self, owner: &OwnerRef) -> Result<Option<AlbumStats>, AppError>;
}
