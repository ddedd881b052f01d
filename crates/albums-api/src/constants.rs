//! API constants
//!
//! Routes and the OpenAPI document are versioned under [`API_PREFIX`].

/// API base path prefix (version-independent)
pub const API_BASE: &str = "/api";

/// Current API version
pub const API_VERSION: &str = "v0";

/// Versioned prefix of every album route
pub const API_PREFIX: &str = "/api/v0";

/// Album routes relative to [`API_PREFIX`]
pub const ALBUM_PATH: &str = "/albums/{owner_type}/{owner_id}";

/// Header carrying the acting user's id on mutating requests
pub const USER_ID_HEADER: &str = "x-user-id";

/// Multipart field of the archive upload
pub const ZIP_FIELD: &str = "zip_file";

/// Multipart field of direct image uploads
pub const IMAGE_FIELD: &str = "image";

/// Multipart field paired with each uploaded image
pub const CAPTION_FIELD: &str = "caption";

/// Message for a required form field that was not sent
pub const REQUIRED_FIELD_MESSAGE: &str = "This field is required.";
