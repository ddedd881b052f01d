use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{AttachmentResponse, OwnerRef};

/// Denormalized aggregate kept per owner
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AlbumStats {
    pub owner_type: String,
    pub owner_id: Uuid,
    pub image_count: i64,
    pub updated_at: DateTime<Utc>,
}

/// Whole album view
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AlbumResponse {
    pub owner: OwnerRef,
    pub image_count: i64,
    pub primary_image: Option<Uuid>,
    pub images: Vec<AttachmentResponse>,
}
