use albums_core::constants::{DEFAULT_IMAGE_EXTENSIONS, META_PREFIX};

use super::EntryAttributes;

/// Decides which archive entries are worth extracting.
///
/// Implementations must be pure: the same name and attributes always give
/// the same answer.
pub trait EntryFilter: Send + Sync {
    fn should_extract(&self, name: &str, attributes: EntryAttributes) -> bool;
}

impl<F> EntryFilter for F
where
    F: Fn(&str, EntryAttributes) -> bool + Send + Sync,
{
    fn should_extract(&self, name: &str, attributes: EntryAttributes) -> bool {
        self(name, attributes)
    }
}

/// Skips directories and metadata entries such as `__MACOSX/`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEntryFilter;

impl EntryFilter for DefaultEntryFilter {
    fn should_extract(&self, name: &str, attributes: EntryAttributes) -> bool {
        !attributes.is_dir() && !name.starts_with(META_PREFIX)
    }
}

/// Accepts entries whose name ends in one of the configured image extensions,
/// compared case-insensitively, on top of the default rule
#[derive(Debug, Clone)]
pub struct ImageEntryFilter {
    extensions: Vec<String>,
}

impl ImageEntryFilter {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
        }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    fn has_image_extension(&self, name: &str) -> bool {
        let Some((_, ext)) = name.rsplit_once('.') else {
            return false;
        };
        self.extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }
}

impl Default for ImageEntryFilter {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_EXTENSIONS)
    }
}

impl EntryFilter for ImageEntryFilter {
    fn should_extract(&self, name: &str, attributes: EntryAttributes) -> bool {
        self.has_image_extension(name) && DefaultEntryFilter.should_extract(name, attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: EntryAttributes = EntryAttributes::from_bits(0);
    const DIR: EntryAttributes = EntryAttributes::from_bits(EntryAttributes::DIR_BIT);

    #[test]
    fn test_default_filter() {
        let filter = DefaultEntryFilter;

        assert!(filter.should_extract("photo.jpg", FILE));
        assert!(filter.should_extract("nested/photo.jpg", FILE));
        assert!(!filter.should_extract("photos/", DIR));
        assert!(!filter.should_extract("__MACOSX/._photo.jpg", FILE));
        assert!(!filter.should_extract("__notes", FILE));
        // Only the leading position counts
        assert!(filter.should_extract("a__b.jpg", FILE));
    }

    #[test]
    fn test_image_filter_case_insensitive() {
        let filter = ImageEntryFilter::default();

        assert!(filter.should_extract("a.jpg", FILE));
        assert!(filter.should_extract("b.JPEG", FILE));
        assert!(filter.should_extract("dir/c.Png", FILE));
        assert!(filter.should_extract("d.gif", FILE));
        assert!(!filter.should_extract("notes.txt", FILE));
        assert!(!filter.should_extract("jpg", FILE));
        assert!(!filter.should_extract("__MACOSX/._a.jpg", FILE));
        assert!(!filter.should_extract("folder.jpg", DIR));
    }

    #[test]
    fn test_image_filter_normalizes_configured_extensions() {
        let filter = ImageEntryFilter::new([".WEBP", "", "png"]);

        assert_eq!(filter.extensions(), &["webp".to_string(), "png".to_string()]);
        assert!(filter.should_extract("x.webp", FILE));
        assert!(!filter.should_extract("x.jpg", FILE));
    }

    #[test]
    fn test_filter_is_pure() {
        let filter = ImageEntryFilter::default();
        let names = ["a.jpg", "__x.jpg", "b.txt", "c.PNG"];

        let first: Vec<bool> = names.iter().map(|n| filter.should_extract(n, FILE)).collect();
        let second: Vec<bool> = names.iter().map(|n| filter.should_extract(n, FILE)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_closure_filter() {
        let only_gifs = |name: &str, _: EntryAttributes| name.ends_with(".gif");

        assert!(only_gifs.should_extract("x.gif", FILE));
        assert!(!only_gifs.should_extract("x.jpg", FILE));
    }
}
