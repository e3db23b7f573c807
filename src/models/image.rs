//! Image reference types for the download job.

use std::fmt;

use crate::utils::filename_from_url;

/// Which directory an image belongs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageCategory {
    Card,
    Brand,
}

impl ImageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageCategory::Card => "card",
            ImageCategory::Brand => "brand",
        }
    }
}

impl fmt::Display for ImageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An image URL paired with the file name it is stored under.
///
/// The file name is the URL path's basename, so two URLs that differ only in
/// host or directory resolve to the same file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub url: String,
    pub filename: String,
    pub category: ImageCategory,
}

impl ImageRef {
    /// Build a reference, or `None` when the URL has no usable basename.
    pub fn new(url: impl Into<String>, category: ImageCategory) -> Option<Self> {
        let url = url.into();
        let filename = filename_from_url(&url)?;
        Some(Self {
            url,
            filename,
            category,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_ref_uses_basename() {
        let image = ImageRef::new(
            "https://img1.kakaku.k-img.com/images/card/icon/visa.png?v=2",
            ImageCategory::Brand,
        )
        .unwrap();
        assert_eq!(image.filename, "visa.png");
        assert_eq!(image.category, ImageCategory::Brand);
    }

    #[test]
    fn test_image_ref_rejects_directory_url() {
        assert!(ImageRef::new("https://example.com/images/", ImageCategory::Card).is_none());
    }
}
