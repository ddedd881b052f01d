//! Shared constants

/// Ordering value the counter starts from when an owner has no attachments yet.
/// The first imported image therefore gets ordering value 1.
pub const BASELINE_ORDER: i32 = 0;

/// Smallest chunk size the archive extractor accepts (64 KiB).
pub const MIN_CHUNK_SIZE: usize = 64 * 1024;

/// Entry names starting with this prefix are archive metadata (e.g. `__MACOSX/`).
pub const META_PREFIX: &str = "__";

/// Extensions accepted by the album image filter when none are configured.
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Maximum caption length in characters.
pub const MAX_CAPTION_LENGTH: u64 = 255;

/// Root prefix of every album object key.
pub const ALBUM_KEY_PREFIX: &str = "albums";

/// Reason reported by the reorder endpoint for any rejected payload.
pub const INVALID_ORDER_REASON: &str = "Invalid data.";
