//! Album upload handlers: main image, several images, zip archive import

use albums_core::constants::MAX_CAPTION_LENGTH;
use albums_core::models::{AttachmentResponse, ImportSummary};
use albums_core::AppError;
use albums_processing::{AlbumImageProcessor, PendingImage, UploadError, UploadedArchive};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::constants::{CAPTION_FIELD, IMAGE_FIELD, REQUIRED_FIELD_MESSAGE, ZIP_FIELD};
use crate::error::{ErrorResponse, FormErrors, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::{read_upload_form, FormReadError, UploadForm, UploadedFile};
use crate::utils::user::ActingUser;

fn form_read_failure(err: FormReadError) -> Response {
    match err {
        FormReadError::TooLarge { ref field, .. } => {
            FormErrors::single(field.clone(), err.to_string()).into_response()
        }
        FormReadError::Malformed(message) => {
            HttpAppError(AppError::BadRequest(message)).into_response()
        }
        FormReadError::Io(e) => HttpAppError(AppError::from(e)).into_response(),
    }
}

fn upload_failure(field: &str, err: UploadError) -> Response {
    if err.is_user_error() {
        FormErrors::single(field, err.to_string()).into_response()
    } else {
        HttpAppError(AppError::from(err)).into_response()
    }
}

fn check_caption(caption: &str) -> Result<(), FormErrors> {
    if caption.chars().count() as u64 > MAX_CAPTION_LENGTH {
        return Err(FormErrors::single(
            CAPTION_FIELD,
            format!(
                "Ensure this value has at most {} characters.",
                MAX_CAPTION_LENGTH
            ),
        ));
    }
    Ok(())
}

fn pending(file: UploadedFile, caption: &str) -> PendingImage {
    PendingImage {
        file: file.file,
        filename: file.filename,
        caption: caption.to_string(),
    }
}

/// Upload a new main image for the album
#[utoipa::path(
    post,
    path = "/api/v0/albums/{owner_type}/{owner_id}/main-image",
    tag = "uploads",
    params(
        ("owner_type" = String, Path, description = "Kind of record the album belongs to"),
        ("owner_id" = Uuid, Path, description = "Id of the owning record")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "`image` file and optional `caption`"),
    responses(
        (status = 201, description = "Main image uploaded", body = AttachmentResponse),
        (status = 400, description = "Form errors keyed by field", body = FormErrors),
        (status = 404, description = "Unknown owner type", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(user_id = %user_id))]
pub async fn upload_main_image(
    State(state): State<Arc<AppState>>,
    Path((owner_type, owner_id)): Path<(String, Uuid)>,
    ActingUser(user_id): ActingUser,
    multipart: Multipart,
) -> Result<Response, HttpAppError> {
    let owner = state.owner(&owner_type, owner_id)?;
    let albums = &state.albums;

    let mut form = match read_upload_form(multipart, &albums.temp_dir, albums.max_image_size).await
    {
        Ok(form) => form,
        Err(e) => return Ok(form_read_failure(e)),
    };

    let caption = form.text(CAPTION_FIELD).unwrap_or_default().to_string();
    if let Err(errors) = check_caption(&caption) {
        return Ok(errors.into_response());
    }
    let Some(file) = form.take_files(IMAGE_FIELD).into_iter().next() else {
        return Ok(FormErrors::single(IMAGE_FIELD, REQUIRED_FIELD_MESSAGE).into_response());
    };

    match albums
        .uploader
        .upload_main(&owner, Some(user_id), pending(file, &caption))
        .await
    {
        Ok(attachment) => Ok((
            StatusCode::CREATED,
            Json(AttachmentResponse::from(attachment)),
        )
            .into_response()),
        Err(e) => Ok(upload_failure(IMAGE_FIELD, e)),
    }
}

/// Pair the `image` files of a form with its `caption` values by position
fn pending_images(form: &mut UploadForm) -> Result<Vec<PendingImage>, FormErrors> {
    let files = form.take_files(IMAGE_FIELD);
    if files.is_empty() {
        return Err(FormErrors::single(IMAGE_FIELD, REQUIRED_FIELD_MESSAGE));
    }

    let captions = form.texts(CAPTION_FIELD);
    for caption in &captions {
        check_caption(caption)?;
    }

    Ok(files
        .into_iter()
        .enumerate()
        .map(|(i, file)| pending(file, captions.get(i).copied().unwrap_or_default()))
        .collect())
}

/// Upload several images, appended to the end of the album in form order
#[utoipa::path(
    post,
    path = "/api/v0/albums/{owner_type}/{owner_id}/images",
    tag = "uploads",
    params(
        ("owner_type" = String, Path, description = "Kind of record the album belongs to"),
        ("owner_id" = Uuid, Path, description = "Id of the owning record")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "Repeated `image` files with optional `caption` values"),
    responses(
        (status = 201, description = "Images uploaded", body = Vec<AttachmentResponse>),
        (status = 400, description = "Form errors keyed by field", body = FormErrors),
        (status = 404, description = "Unknown owner type", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(user_id = %user_id))]
pub async fn upload_images(
    State(state): State<Arc<AppState>>,
    Path((owner_type, owner_id)): Path<(String, Uuid)>,
    ActingUser(user_id): ActingUser,
    multipart: Multipart,
) -> Result<Response, HttpAppError> {
    let owner = state.owner(&owner_type, owner_id)?;
    let albums = &state.albums;

    let mut form = match read_upload_form(multipart, &albums.temp_dir, albums.max_image_size).await
    {
        Ok(form) => form,
        Err(e) => return Ok(form_read_failure(e)),
    };
    let images = match pending_images(&mut form) {
        Ok(images) => images,
        Err(errors) => return Ok(errors.into_response()),
    };

    match albums.uploader.upload_many(&owner, Some(user_id), images).await {
        Ok(created) => {
            let body: Vec<AttachmentResponse> =
                created.into_iter().map(AttachmentResponse::from).collect();
            Ok((StatusCode::CREATED, Json(body)).into_response())
        }
        Err(e) => Ok(upload_failure(IMAGE_FIELD, e)),
    }
}

/// Import every image of a zip archive into the album.
///
/// Entries that are not images, or that fail to decode, are skipped. A file
/// that is not a zip, or a corrupt entry, fails the form with nothing stored.
#[utoipa::path(
    post,
    path = "/api/v0/albums/{owner_type}/{owner_id}/zip",
    tag = "uploads",
    params(
        ("owner_type" = String, Path, description = "Kind of record the album belongs to"),
        ("owner_id" = Uuid, Path, description = "Id of the owning record")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "`zip_file` archive"),
    responses(
        (status = 200, description = "Import finished", body = ImportSummary),
        (status = 400, description = "Form errors keyed by field", body = FormErrors),
        (status = 404, description = "Unknown owner type", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(user_id = %user_id))]
pub async fn upload_zip(
    State(state): State<Arc<AppState>>,
    Path((owner_type, owner_id)): Path<(String, Uuid)>,
    ActingUser(user_id): ActingUser,
    multipart: Multipart,
) -> Result<Response, HttpAppError> {
    let owner = state.owner(&owner_type, owner_id)?;
    let albums = &state.albums;

    let mut form =
        match read_upload_form(multipart, &albums.temp_dir, albums.max_archive_size).await {
            Ok(form) => form,
            Err(e) => return Ok(form_read_failure(e)),
        };
    let Some(upload) = form.take_files(ZIP_FIELD).into_iter().next() else {
        return Ok(FormErrors::single(ZIP_FIELD, REQUIRED_FIELD_MESSAGE).into_response());
    };

    tracing::info!(
        owner = %owner,
        filename = %upload.filename,
        size_bytes = upload.file.size(),
        "Archive received"
    );

    let processor = AlbumImageProcessor::begin(
        albums.attachments.clone(),
        albums.stats.clone(),
        albums.storage.clone(),
        owner,
        Some(user_id),
    )
    .await?;

    match albums
        .importer
        .run(UploadedArchive::new(upload.file), processor)
        .await
    {
        Ok(report) => Ok(Json(ImportSummary {
            imported: report.accepted,
            images: report
                .output
                .into_iter()
                .map(AttachmentResponse::from)
                .collect(),
        })
        .into_response()),
        Err(e) if e.is_user_error() => {
            Ok(FormErrors::single(ZIP_FIELD, e.to_string()).into_response())
        }
        Err(e) => Err(HttpAppError(AppError::from(e))),
    }
}
