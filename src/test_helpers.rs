//! Shared test utilities.
//!
//! Provides an in-memory [`MockSource`] upstream, record builders, a sample
//! snapshot and a config rooted in a temp directory.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let source = MockSource::new()
//!     .with_section(6, "Movies", vec![record("101", "Alien", Some(1979), Some("/t/101"))])
//!     .with_failing_section(5)
//!     .with_artwork("/t/101", jpeg_bytes);
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::config::AppConfig;
use crate::types::{Item, Section, Snapshot};
use crate::upstream::{FetchError, LibrarySource, SectionInfo, UpstreamItem};

// =========================================================================
// Upstream
// =========================================================================

/// In-memory upstream library.
///
/// Unknown sections and unknown artwork answer with a 404 status error.
#[derive(Default)]
pub struct MockSource {
    sections: HashMap<u32, (String, Vec<UpstreamItem>)>,
    failing: HashSet<u32>,
    artwork: HashMap<String, Vec<u8>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_section(mut self, id: u32, title: &str, records: Vec<UpstreamItem>) -> Self {
        self.sections.insert(id, (title.to_string(), records));
        self
    }

    /// Section info succeeds but the item listing fails with a network error.
    pub fn with_failing_section(mut self, id: u32) -> Self {
        self.sections.insert(id, (format!("Broken {id}"), Vec::new()));
        self.failing.insert(id);
        self
    }

    pub fn with_artwork(mut self, thumb: &str, bytes: Vec<u8>) -> Self {
        self.artwork.insert(thumb.to_string(), bytes);
        self
    }
}

fn not_found(path: String) -> FetchError {
    FetchError::Status {
        url: path,
        status: 404,
    }
}

impl LibrarySource for MockSource {
    async fn section_info(&self, section_id: u32) -> Result<SectionInfo, FetchError> {
        self.sections
            .get(&section_id)
            .map(|(title, _)| SectionInfo {
                title: title.clone(),
            })
            .ok_or_else(|| not_found(format!("/library/sections/{section_id}")))
    }

    async fn section_items(&self, section_id: u32) -> Result<Vec<UpstreamItem>, FetchError> {
        if self.failing.contains(&section_id) {
            return Err(FetchError::Network("connection reset".into()));
        }
        self.sections
            .get(&section_id)
            .map(|(_, records)| records.clone())
            .ok_or_else(|| not_found(format!("/library/sections/{section_id}/all")))
    }

    async fn download_artwork(&self, thumb: &str, dest: &Path) -> Result<u64, FetchError> {
        let bytes = self
            .artwork
            .get(thumb)
            .ok_or_else(|| not_found(thumb.to_string()))?;
        tokio::fs::write(dest, bytes).await?;
        Ok(bytes.len() as u64)
    }
}

/// Build an upstream record.
pub fn record(key: &str, title: &str, year: Option<u32>, thumb: Option<&str>) -> UpstreamItem {
    UpstreamItem {
        rating_key: key.to_string(),
        title: title.to_string(),
        year,
        thumb: thumb.map(str::to_string),
    }
}

// =========================================================================
// Snapshot fixtures
// =========================================================================

/// Build a snapshot item with the standard image paths.
pub fn item(id: &str, title: &str, year: Option<u32>) -> Item {
    Item {
        id: id.to_string(),
        title: title.to_string(),
        year,
        image_200: format!("/images/{id}-200.jpg"),
        image_400: format!("/images/{id}-400.jpg"),
        image_hi_res: format!("/images/{id}-hi.jpg"),
    }
}

/// Two sections, the second one empty.
pub fn sample_snapshot() -> Snapshot {
    vec![
        Section {
            section_id: 6,
            section_title: "Movies".into(),
            items: vec![
                item("101", "Brazil", Some(1985)),
                item("102", "alien", Some(1979)),
                item("103", "Casablanca", Some(1942)),
            ],
        },
        Section {
            section_id: 2,
            section_title: "Empty".into(),
            items: Vec::new(),
        },
    ]
}

/// A valid config whose directories live under `root`.
pub fn test_config(root: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.upstream.url = "http://plex.test".into();
    config.upstream.token = "token".into();
    config.paths.data_dir = root.join("data");
    config.paths.images_dir = root.join("images");
    config.paths.assets_dir = root.join("html");
    config
}

// =========================================================================
// Lookups
// =========================================================================

/// Titles of the items in a section, in order. Panics if the section is missing.
pub fn item_titles(sections: &[Section], section_id: u32) -> Vec<&str> {
    sections
        .iter()
        .find(|s| s.section_id == section_id)
        .map(|s| s.items.iter().map(|i| i.title.as_str()).collect())
        .unwrap_or_else(|| {
            let ids: Vec<u32> = sections.iter().map(|s| s.section_id).collect();
            panic!("section {section_id} not found. Available: {ids:?}")
        })
}
