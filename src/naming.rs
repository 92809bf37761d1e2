//! Centralized file naming for materialized artwork.
//!
//! Every item gets three JPEG files named after its upstream id and a size
//! suffix. The same names are used on disk (under `images_dir`) and in the
//! public URL space (under `/images/`):
//!
//! - `101-hi.jpg` → original artwork, byte-for-byte
//! - `101-400.jpg` → resized to 400px wide
//! - `101-200.jpg` → resized to 200px wide

use std::path::{Path, PathBuf};

/// URL prefix the server mounts `images_dir` under.
pub const IMAGES_URL_PREFIX: &str = "/images";

/// One of the three files written per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageVariant {
    HiRes,
    Width400,
    Width200,
}

impl ImageVariant {
    /// The resized variants, widest first.
    pub const RESIZED: [ImageVariant; 2] = [ImageVariant::Width400, ImageVariant::Width200];

    pub fn suffix(self) -> &'static str {
        match self {
            ImageVariant::HiRes => "hi",
            ImageVariant::Width400 => "400",
            ImageVariant::Width200 => "200",
        }
    }

    /// Target width in pixels; `None` for the untouched original.
    pub fn width(self) -> Option<u32> {
        match self {
            ImageVariant::HiRes => None,
            ImageVariant::Width400 => Some(400),
            ImageVariant::Width200 => Some(200),
        }
    }
}

/// `"{id}-{suffix}.jpg"`
pub fn file_name(id: &str, variant: ImageVariant) -> String {
    format!("{}-{}.jpg", id, variant.suffix())
}

/// Absolute location of a variant inside the images directory.
pub fn disk_path(images_dir: &Path, id: &str, variant: ImageVariant) -> PathBuf {
    images_dir.join(file_name(id, variant))
}

/// Public URL path of a variant, as stored in the snapshot.
pub fn public_path(id: &str, variant: ImageVariant) -> String {
    format!("{}/{}", IMAGES_URL_PREFIX, file_name(id, variant))
}

/// Temporary sibling a file is written to before being renamed into place.
///
/// `images/101-400.jpg` → `images/101-400.jpg.part`
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

/// Upstream ids end up in file names; reject anything that could escape the
/// images directory.
pub fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_use_size_suffix() {
        assert_eq!(file_name("101", ImageVariant::HiRes), "101-hi.jpg");
        assert_eq!(file_name("101", ImageVariant::Width400), "101-400.jpg");
        assert_eq!(file_name("101", ImageVariant::Width200), "101-200.jpg");
    }

    #[test]
    fn public_paths_live_under_images() {
        assert_eq!(public_path("42", ImageVariant::Width200), "/images/42-200.jpg");
        assert_eq!(public_path("42", ImageVariant::HiRes), "/images/42-hi.jpg");
    }

    #[test]
    fn disk_path_joins_images_dir() {
        let p = disk_path(Path::new("/srv/images"), "9", ImageVariant::Width400);
        assert_eq!(p, PathBuf::from("/srv/images/9-400.jpg"));
    }

    #[test]
    fn partial_path_appends_suffix() {
        let p = partial_path(Path::new("/srv/images/9-400.jpg"));
        assert_eq!(p, PathBuf::from("/srv/images/9-400.jpg.part"));
    }

    #[test]
    fn widths() {
        assert_eq!(ImageVariant::HiRes.width(), None);
        assert_eq!(ImageVariant::Width400.width(), Some(400));
        assert_eq!(ImageVariant::Width200.width(), Some(200));
    }

    #[test]
    fn unsafe_ids_rejected() {
        assert!(is_safe_id("12345"));
        assert!(is_safe_id("abc-1_2"));
        assert!(!is_safe_id(""));
        assert!(!is_safe_id("../etc"));
        assert!(!is_safe_id("a/b"));
    }
}
