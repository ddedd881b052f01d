use albums_core::models::AlbumStats;
use albums_core::{AppError, OwnerRef};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres};

use crate::store_traits::AlbumStatsStore;

/// Repository for the per-owner denormalized album aggregate
#[derive(Clone)]
pub struct AlbumStatsRepository {
    pool: PgPool,
}

impl AlbumStatsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlbumStatsStore for AlbumStatsRepository {
    #[tracing::instrument(skip(self), fields(db.table = "album_stats", db.operation = "upsert"))]
    async fn recalculate(&self, owner: &OwnerRef) -> Result<AlbumStats, AppError> {
        let stats = sqlx::query_as::<Postgres, AlbumStats>(
            r#"
            INSERT INTO album_stats (owner_type, owner_id, image_count, updated_at)
            SELECT $1, $2, COUNT(*), NOW()
            FROM attachments
            WHERE owner_type = $1 AND owner_id = $2
            ON CONFLICT (owner_type, owner_id)
            DO UPDATE SET image_count = EXCLUDED.image_count, updated_at = NOW()
            RETURNING owner_type, owner_id, image_count, updated_at
            "#,
        )
        .bind(&owner.owner_type)
        .bind(owner.owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    #[tracing::instrument(skip(self), fields(db.table = "album_stats", db.operation = "select"))]
    async fn get(&self, owner: &OwnerRef) -> Result<Option<AlbumStats>, AppError> {
        let stats = sqlx::query_as::<Postgres, AlbumStats>(
            "SELECT owner_type, owner_id, image_count, updated_at FROM album_stats WHERE owner_type = $1 AND owner_id = $2",
        )
        .bind(&owner.owner_type)
        .bind(owner.owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stats)
    }
}
