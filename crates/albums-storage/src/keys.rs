//! Shared key generation for storage backends.
//!
//! Key format: `albums/{owner_type}/{owner_id}/{stem}.{ext}`.

use albums_core::constants::ALBUM_KEY_PREFIX;
use albums_core::OwnerRef;
use std::path::Path;

/// Generate the storage key of an album image.
///
/// All backends must use this format for consistency.
pub fn album_object_key(owner: &OwnerRef, stem: &str, extension: Option<&str>) -> String {
    match extension {
        Some(ext) if !ext.is_empty() => format!(
            "{}/{}/{}/{}.{}",
            ALBUM_KEY_PREFIX, owner.owner_type, owner.owner_id, stem, ext
        ),
        _ => format!(
            "{}/{}/{}/{}",
            ALBUM_KEY_PREFIX, owner.owner_type, owner.owner_id, stem
        ),
    }
}

/// Lowercased extension of a file name, if it has a plain alphanumeric one.
pub fn normalized_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_album_object_key_layout() {
        let owner_id = Uuid::new_v4();
        let owner = OwnerRef::new("user", owner_id);

        assert_eq!(
            album_object_key(&owner, "7", Some("jpg")),
            format!("albums/user/{}/7.jpg", owner_id)
        );
        assert_eq!(
            album_object_key(&owner, "7", None),
            format!("albums/user/{}/7", owner_id)
        );
    }

    #[test]
    fn test_normalized_extension() {
        assert_eq!(normalized_extension("Photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(normalized_extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(normalized_extension("README"), None);
        assert_eq!(normalized_extension("weird.j/pg"), None);
    }
}
