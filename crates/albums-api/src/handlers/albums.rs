//! Album read, edit and ordering handlers

use albums_core::models::{
    parse_order_items, AlbumResponse, AttachmentDetailResponse, AttachmentResponse, OrderItem,
    ReorderRequest, ReorderResult, UpdateAttachmentRequest,
};
use albums_core::AppError;
use axum::{
    extract::{FromRequest, Path, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    Form, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use crate::utils::user::ActingUser;

/// Show an album: every image in order plus the cached image count
#[utoipa::path(
    get,
    path = "/api/v0/albums/{owner_type}/{owner_id}",
    tag = "albums",
    params(
        ("owner_type" = String, Path, description = "Kind of record the album belongs to"),
        ("owner_id" = Uuid, Path, description = "Id of the owning record")
    ),
    responses(
        (status = 200, description = "Album", body = AlbumResponse),
        (status = 404, description = "Unknown owner type", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn show_album(
    State(state): State<Arc<AppState>>,
    Path((owner_type, owner_id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, HttpAppError> {
    let owner = state.owner(&owner_type, owner_id)?;
    let albums = &state.albums;

    let images = albums.attachments.list_for_owner(&owner).await?;
    let image_count = match albums.stats.get(&owner).await? {
        Some(stats) => stats.image_count,
        None => images.len() as i64,
    };
    let primary_image = images.iter().find(|a| a.is_primary).map(|a| a.id);

    Ok(Json(AlbumResponse {
        owner,
        image_count,
        primary_image,
        images: images.into_iter().map(AttachmentResponse::from).collect(),
    }))
}

/// Show one image with the ids of its neighbours in album order
#[utoipa::path(
    get,
    path = "/api/v0/albums/{owner_type}/{owner_id}/images/{image_id}",
    tag = "albums",
    params(
        ("owner_type" = String, Path, description = "Kind of record the album belongs to"),
        ("owner_id" = Uuid, Path, description = "Id of the owning record"),
        ("image_id" = Uuid, Path, description = "Image id")
    ),
    responses(
        (status = 200, description = "Image", body = AttachmentDetailResponse),
        (status = 404, description = "Image not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn show_image(
    State(state): State<Arc<AppState>>,
    Path((owner_type, owner_id, image_id)): Path<(String, Uuid, Uuid)>,
) -> Result<impl IntoResponse, HttpAppError> {
    let owner = state.owner(&owner_type, owner_id)?;
    let attachments = &state.albums.attachments;

    let image = attachments
        .get_for_owner(&owner, image_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;
    let (prev, next) = attachments.neighbours(&owner, image.sort_order).await?;

    Ok(Json(AttachmentDetailResponse {
        image: image.into(),
        prev,
        next,
    }))
}

/// Edit an image's caption
#[utoipa::path(
    put,
    path = "/api/v0/albums/{owner_type}/{owner_id}/images/{image_id}",
    tag = "albums",
    params(
        ("owner_type" = String, Path, description = "Kind of record the album belongs to"),
        ("owner_id" = Uuid, Path, description = "Id of the owning record"),
        ("image_id" = Uuid, Path, description = "Image id")
    ),
    request_body = UpdateAttachmentRequest,
    responses(
        (status = 200, description = "Updated image", body = AttachmentResponse),
        (status = 400, description = "Caption too long", body = ErrorResponse),
        (status = 404, description = "Image not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %user_id))]
pub async fn update_image(
    State(state): State<Arc<AppState>>,
    Path((owner_type, owner_id, image_id)): Path<(String, Uuid, Uuid)>,
    ActingUser(user_id): ActingUser,
    ValidatedJson(request): ValidatedJson<UpdateAttachmentRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let owner = state.owner(&owner_type, owner_id)?;
    request.validate().map_err(AppError::from)?;

    let image = state
        .albums
        .attachments
        .update_caption(&owner, image_id, &request.caption)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;

    Ok(Json(AttachmentResponse::from(image)))
}

/// Delete an image and its stored file
#[utoipa::path(
    delete,
    path = "/api/v0/albums/{owner_type}/{owner_id}/images/{image_id}",
    tag = "albums",
    params(
        ("owner_type" = String, Path, description = "Kind of record the album belongs to"),
        ("owner_id" = Uuid, Path, description = "Id of the owning record"),
        ("image_id" = Uuid, Path, description = "Image id")
    ),
    responses(
        (status = 204, description = "Image deleted"),
        (status = 404, description = "Image not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %user_id))]
pub async fn delete_image(
    State(state): State<Arc<AppState>>,
    Path((owner_type, owner_id, image_id)): Path<(String, Uuid, Uuid)>,
    ActingUser(user_id): ActingUser,
) -> Result<impl IntoResponse, HttpAppError> {
    let owner = state.owner(&owner_type, owner_id)?;
    let albums = &state.albums;

    let removed = albums
        .attachments
        .delete(&owner, image_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;

    if let Err(e) = albums.storage.delete(&removed.storage_key).await {
        tracing::warn!(
            error = %e,
            storage_key = %removed.storage_key,
            "Failed to delete stored image"
        );
    }
    albums.stats.recalculate(&owner).await?;

    tracing::info!(attachment_id = %image_id, owner = %owner, "Album image deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Make an image the album's main image
#[utoipa::path(
    post,
    path = "/api/v0/albums/{owner_type}/{owner_id}/images/{image_id}/primary",
    tag = "albums",
    params(
        ("owner_type" = String, Path, description = "Kind of record the album belongs to"),
        ("owner_id" = Uuid, Path, description = "Id of the owning record"),
        ("image_id" = Uuid, Path, description = "Image id")
    ),
    responses(
        (status = 200, description = "New main image", body = AttachmentResponse),
        (status = 404, description = "Image not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %user_id))]
pub async fn set_primary_image(
    State(state): State<Arc<AppState>>,
    Path((owner_type, owner_id, image_id)): Path<(String, Uuid, Uuid)>,
    ActingUser(user_id): ActingUser,
) -> Result<impl IntoResponse, HttpAppError> {
    let owner = state.owner(&owner_type, owner_id)?;

    let image = state
        .albums
        .attachments
        .set_primary(&owner, image_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;

    Ok(Json(AttachmentResponse::from(image)))
}

/// Unset the album's main image
#[utoipa::path(
    delete,
    path = "/api/v0/albums/{owner_type}/{owner_id}/primary",
    tag = "albums",
    params(
        ("owner_type" = String, Path, description = "Kind of record the album belongs to"),
        ("owner_id" = Uuid, Path, description = "Id of the owning record")
    ),
    responses((status = 204, description = "Main image cleared"))
)]
#[tracing::instrument(skip(state), fields(user_id = %user_id))]
pub async fn clear_primary_image(
    State(state): State<Arc<AppState>>,
    Path((owner_type, owner_id)): Path<(String, Uuid)>,
    ActingUser(user_id): ActingUser,
) -> Result<impl IntoResponse, HttpAppError> {
    let owner = state.owner(&owner_type, owner_id)?;
    let cleared = state.albums.attachments.clear_primary(&owner).await?;

    tracing::debug!(owner = %owner, cleared, "Main image cleared");
    Ok(StatusCode::NO_CONTENT)
}

/// JSON variant of the reorder body: `items` may be the list itself or its text
#[derive(Debug, Deserialize)]
struct JsonReorderBody {
    items: ItemsField,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ItemsField {
    List(Vec<OrderItem>),
    Text(String),
}

impl ItemsField {
    fn into_items(self) -> Option<Vec<OrderItem>> {
        match self {
            ItemsField::List(items) => Some(items),
            ItemsField::Text(raw) => parse_order_items(&raw).ok(),
        }
    }
}

async fn read_order_items(request: Request) -> Option<Vec<OrderItem>> {
    let is_json = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    if is_json {
        let Json(body) = Json::<JsonReorderBody>::from_request(request, &()).await.ok()?;
        body.items.into_items()
    } else {
        let Form(body) = Form::<ReorderRequest>::from_request(request, &()).await.ok()?;
        parse_order_items(&body.items).ok()
    }
}

/// Reassign ordering values.
///
/// All or nothing: an id outside the album or a resulting duplicate value
/// changes nothing and reports `{"done": false}`.
#[utoipa::path(
    post,
    path = "/api/v0/albums/{owner_type}/{owner_id}/order",
    tag = "albums",
    params(
        ("owner_type" = String, Path, description = "Kind of record the album belongs to"),
        ("owner_id" = Uuid, Path, description = "Id of the owning record")
    ),
    request_body(content = ReorderRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Reorder result", body = ReorderResult)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %user_id))]
pub async fn set_image_order(
    State(state): State<Arc<AppState>>,
    Path((owner_type, owner_id)): Path<(String, Uuid)>,
    ActingUser(user_id): ActingUser,
    request: Request,
) -> Result<impl IntoResponse, HttpAppError> {
    let owner = state.owner(&owner_type, owner_id)?;

    let Some(items) = read_order_items(request).await else {
        tracing::debug!(owner = %owner, "Malformed reorder payload");
        return Ok(Json(ReorderResult::invalid()));
    };

    let outcome = state.albums.attachments.apply_order(&owner, &items).await?;
    Ok(Json(ReorderResult::from(outcome)))
}
