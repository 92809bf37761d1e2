//! Snapshot types shared by the sync pipeline, the server and the gallery.
//!
//! These are serialized verbatim into `library.json`, so field names follow the
//! camelCase wire format the gallery reads.

use serde::{Deserialize, Serialize};

/// A library section as persisted in the snapshot.
///
/// Identity is `section_id`. Sections appear in allow-list order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub section_id: u32,
    pub section_title: String,
    /// Items in upstream order; only records that carried artwork.
    pub items: Vec<Item>,
}

/// One media entry with its three derived image paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Upstream `ratingKey`.
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(rename = "image200")]
    pub image_200: String,
    #[serde(rename = "image400")]
    pub image_400: String,
    #[serde(rename = "imageHiRes")]
    pub image_hi_res: String,
}

/// The whole persisted application state.
pub type Snapshot = Vec<Section>;
