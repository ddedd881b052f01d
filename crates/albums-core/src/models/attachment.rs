use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::OwnerRef;

/// An image attached to an owner record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Attachment {
    pub id: Uuid,
    pub owner_type: String,
    pub owner_id: Uuid,
    pub user_id: Option<Uuid>,
    pub caption: String,
    pub sort_order: i32,
    pub is_primary: bool,
    pub storage_key: String,
    pub storage_url: String,
    pub original_filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attachment {
    pub fn owner(&self) -> OwnerRef {
        OwnerRef::new(self.owner_type.clone(), self.owner_id)
    }

    pub fn belongs_to(&self, owner: &OwnerRef) -> bool {
        self.owner_type == owner.owner_type && self.owner_id == owner.owner_id
    }
}

/// Values for a new attachment row
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub owner: OwnerRef,
    pub user_id: Option<Uuid>,
    pub caption: String,
    pub sort_order: i32,
    pub is_primary: bool,
    pub storage_key: String,
    pub storage_url: String,
    pub original_filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

/// Attachment as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttachmentResponse {
    pub id: Uuid,
    pub caption: String,
    pub order: i32,
    pub is_primary: bool,
    pub url: String,
    pub filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Attachment> for AttachmentResponse {
    fn from(attachment: Attachment) -> Self {
        AttachmentResponse {
            id: attachment.id,
            caption: attachment.caption,
            order: attachment.sort_order,
            is_primary: attachment.is_primary,
            url: attachment.storage_url,
            filename: attachment.original_filename,
            content_type: attachment.content_type,
            file_size: attachment.file_size,
            width: attachment.width,
            height: attachment.height,
            user_id: attachment.user_id,
            created_at: attachment.created_at,
            updated_at: attachment.updated_at,
        }
    }
}

/// Request DTO for editing an image
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateAttachmentRequest {
    #[validate(length(max = 255, message = "Caption must be at most 255 characters"))]
    pub caption: String,
}

/// A single image with its neighbours in album order
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AttachmentDetailResponse {
    pub image: AttachmentResponse,
    pub prev: Option<Uuid>,
    pub next: Option<Uuid>,
}
