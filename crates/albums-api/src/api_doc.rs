//! OpenAPI documentation.
//! Handler annotations carry the full `/api/v0` paths; see `crate::constants::API_PREFIX`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use albums_core::models;

/// The OpenAPI document served at `/api/openapi.json`
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Albums API",
        version = "0.1.0",
        description = "Photo albums attached to arbitrary owner records: ordered images, a main image, direct uploads and zip archive import. All endpoints are versioned under /api/v0/."
    ),
    paths(
        // Albums
        handlers::albums::show_album,
        handlers::albums::show_image,
        handlers::albums::update_image,
        handlers::albums::delete_image,
        handlers::albums::set_primary_image,
        handlers::albums::clear_primary_image,
        handlers::albums::set_image_order,
        // Uploads
        handlers::uploads::upload_main_image,
        handlers::uploads::upload_images,
        handlers::uploads::upload_zip,
    ),
    components(
        schemas(
            models::OwnerRef,
            models::AlbumResponse,
            models::AlbumStats,
            models::AttachmentResponse,
            models::AttachmentDetailResponse,
            models::UpdateAttachmentRequest,
            models::OrderItem,
            models::ReorderRequest,
            models::ReorderResult,
            models::ImportSummary,
            error::ErrorResponse,
            error::FormErrors,
        )
    ),
    tags(
        (name = "albums", description = "Album contents, captions, main image and ordering"),
        (name = "uploads", description = "Image uploads and zip archive import"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_versioned() {
        let spec = get_openapi_spec();
        assert!(!spec.paths.paths.is_empty());
        for path in spec.paths.paths.keys() {
            assert!(path.starts_with(crate::constants::API_PREFIX), "{}", path);
        }
    }

    #[test]
    fn test_zip_import_is_documented() {
        let spec = get_openapi_spec();
        assert!(spec
            .paths
            .paths
            .contains_key("/api/v0/albums/{owner_type}/{owner_id}/zip"));
    }
}
