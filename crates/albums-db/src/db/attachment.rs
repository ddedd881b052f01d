use albums_core::models::{
    plan_reorder, Attachment, NewAttachment, OrderItem, ReorderOutcome,
};
use albums_core::{AppError, OwnerRef};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::store_traits::AttachmentStore;

const ATTACHMENT_COLUMNS: &str = "id, owner_type, owner_id, user_id, caption, sort_order, is_primary, \
     storage_key, storage_url, original_filename, content_type, file_size, width, height, \
     created_at, updated_at";

/// Repository for album attachments
#[derive(Clone)]
pub struct AttachmentRepository {
    pool: PgPool,
}

impl AttachmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttachmentStore for AttachmentRepository {
    #[tracing::instrument(skip(self), fields(db.table = "attachments", db.operation = "select"))]
    async fn max_order(&self, owner: &OwnerRef) -> Result<Option<i32>, AppError> {
        let max = sqlx::query_scalar::<Postgres, Option<i32>>(
            "SELECT MAX(sort_order) FROM attachments WHERE owner_type = $1 AND owner_id = $2",
        )
        .bind(&owner.owner_type)
        .bind(owner.owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(max)
    }

    #[tracing::instrument(
        skip(self, attachment),
        fields(db.table = "attachments", db.operation = "insert", owner = %attachment.owner)
    )]
    async fn insert(&self, attachment: NewAttachment) -> Result<Attachment, AppError> {
        let query = format!(
            r#"
            INSERT INTO attachments (
                id, owner_type, owner_id, user_id, caption, sort_order, is_primary,
                storage_key, storage_url, original_filename, content_type, file_size, width, height
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {}
            "#,
            ATTACHMENT_COLUMNS
        );

        let row = sqlx::query_as::<Postgres, Attachment>(&query)
            .bind(Uuid::new_v4())
            .bind(&attachment.owner.owner_type)
            .bind(attachment.owner.owner_id)
            .bind(attachment.user_id)
            .bind(&attachment.caption)
            .bind(attachment.sort_order)
            .bind(attachment.is_primary)
            .bind(&attachment.storage_key)
            .bind(&attachment.storage_url)
            .bind(&attachment.original_filename)
            .bind(&attachment.content_type)
            .bind(attachment.file_size)
            .bind(attachment.width)
            .bind(attachment.height)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "attachments", db.operation = "select"))]
    async fn list_for_owner(&self, owner: &OwnerRef) -> Result<Vec<Attachment>, AppError> {
        let query = format!(
            "SELECT {} FROM attachments WHERE owner_type = $1 AND owner_id = $2 ORDER BY sort_order ASC",
            ATTACHMENT_COLUMNS
        );

        let rows = sqlx::query_as::<Postgres, Attachment>(&query)
            .bind(&owner.owner_type)
            .bind(owner.owner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "attachments", db.operation = "select", db.record_id = %id))]
    async fn get_for_owner(
        &self,
        owner: &OwnerRef,
        id: Uuid,
    ) -> Result<Option<Attachment>, AppError> {
        let query = format!(
            "SELECT {} FROM attachments WHERE owner_type = $1 AND owner_id = $2 AND id = $3",
            ATTACHMENT_COLUMNS
        );

        let row = sqlx::query_as::<Postgres, Attachment>(&query)
            .bind(&owner.owner_type)
            .bind(owner.owner_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "attachments", db.operation = "select"))]
    async fn neighbours(
        &self,
        owner: &OwnerRef,
        sort_order: i32,
    ) -> Result<(Option<Uuid>, Option<Uuid>), AppError> {
        let prev = sqlx::query_scalar::<Postgres, Uuid>(
            r#"
            SELECT id FROM attachments
            WHERE owner_type = $1 AND owner_id = $2 AND sort_order < $3
            ORDER BY sort_order DESC
            LIMIT 1
            "#,
        )
        .bind(&owner.owner_type)
        .bind(owner.owner_id)
        .bind(sort_order)
        .fetch_optional(&self.pool)
        .await?;

        let next = sqlx::query_scalar::<Postgres, Uuid>(
            r#"
            SELECT id FROM attachments
            WHERE owner_type = $1 AND owner_id = $2 AND sort_order > $3
            ORDER BY sort_order ASC
            LIMIT 1
            "#,
        )
        .bind(&owner.owner_type)
        .bind(owner.owner_id)
        .bind(sort_order)
        .fetch_optional(&self.pool)
        .await?;

        Ok((prev, next))
    }

    #[tracing::instrument(skip(self, caption), fields(db.table = "attachments", db.operation = "update", db.record_id = %id))]
    async fn update_caption(
        &self,
        owner: &OwnerRef,
        id: Uuid,
        caption: &str,
    ) -> Result<Option<Attachment>, AppError> {
        let query = format!(
            r#"
            UPDATE attachments SET caption = $4, updated_at = NOW()
            WHERE owner_type = $1 AND owner_id = $2 AND id = $3
            RETURNING {}
            "#,
            ATTACHMENT_COLUMNS
        );

        let row = sqlx::query_as::<Postgres, Attachment>(&query)
            .bind(&owner.owner_type)
            .bind(owner.owner_id)
            .bind(id)
            .bind(caption)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "attachments", db.operation = "update", db.record_id = %id))]
    async fn set_primary(
        &self,
        owner: &OwnerRef,
        id: Uuid,
    ) -> Result<Option<Attachment>, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE attachments SET is_primary = FALSE, updated_at = NOW()
            WHERE owner_type = $1 AND owner_id = $2 AND is_primary AND id <> $3
            "#,
        )
        .bind(&owner.owner_type)
        .bind(owner.owner_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            r#"
            UPDATE attachments SET is_primary = TRUE, updated_at = NOW()
            WHERE owner_type = $1 AND owner_id = $2 AND id = $3
            RETURNING {}
            "#,
            ATTACHMENT_COLUMNS
        );

        let row = sqlx::query_as::<Postgres, Attachment>(&query)
            .bind(&owner.owner_type)
            .bind(owner.owner_id)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        match row {
            Some(row) => {
                tx.commit().await?;
                Ok(Some(row))
            }
            None => {
                tx.rollback().await?;
                Ok(None)
            }
        }
    }

    #[tracing::instrument(skip(self), fields(db.table = "attachments", db.operation = "update"))]
    async fn clear_primary(&self, owner: &OwnerRef) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE attachments SET is_primary = FALSE, updated_at = NOW()
            WHERE owner_type = $1 AND owner_id = $2 AND is_primary
            "#,
        )
        .bind(&owner.owner_type)
        .bind(owner.owner_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(skip(self), fields(db.table = "attachments", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, owner: &OwnerRef, id: Uuid) -> Result<Option<Attachment>, AppError> {
        let query = format!(
            "DELETE FROM attachments WHERE owner_type = $1 AND owner_id = $2 AND id = $3 RETURNING {}",
            ATTACHMENT_COLUMNS
        );

        let row = sqlx::query_as::<Postgres, Attachment>(&query)
            .bind(&owner.owner_type)
            .bind(owner.owner_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self, items), fields(db.table = "attachments", db.operation = "update", items = items.len()))]
    async fn apply_order(
        &self,
        owner: &OwnerRef,
        items: &[OrderItem],
    ) -> Result<ReorderOutcome, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<Postgres, (Uuid, i32)>(
            r#"
            SELECT id, sort_order FROM attachments
            WHERE owner_type = $1 AND owner_id = $2
            FOR UPDATE
            "#,
        )
        .bind(&owner.owner_type)
        .bind(owner.owner_id)
        .fetch_all(&mut *tx)
        .await?;

        let changes = match plan_reorder(&current, items) {
            Ok(changes) => changes,
            Err(outcome) => {
                tx.rollback().await?;
                tracing::debug!(?outcome, "Reorder rejected");
                return Ok(outcome);
            }
        };

        for (id, sort_order) in &changes {
            sqlx::query(
                "UPDATE attachments SET sort_order = $2, updated_at = NOW() WHERE id = $1",
            )
            .bind(id)
            .bind(sort_order)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(owner = %owner, changed = changes.len(), "Attachment order updated");

        Ok(ReorderOutcome::Applied)
    }
}
