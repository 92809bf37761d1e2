//! Section fetching: allow-list → in-memory sections.
//!
//! Sections are fetched one after another, two requests each. A section whose
//! requests fail is logged and left out; the rest of the run is unaffected.
//! Records without artwork are dropped whole, so every item in the result
//! carries an artwork reference.

use crate::naming::{self, ImageVariant};
use crate::types::{Item, Section};
use crate::upstream::{FetchError, LibrarySource, UpstreamItem};

/// A section that could not be fetched.
#[derive(Debug)]
pub struct SkippedSection {
    pub section_id: u32,
    pub error: FetchError,
}

/// Why an upstream record was left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    MissingArtwork,
    UnsafeId,
}

/// An upstream record that did not become an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedItem {
    pub section_id: u32,
    pub title: String,
    pub reason: DropReason,
}

/// An item together with the artwork reference it was built from.
///
/// The snapshot only stores the derived paths; the materializer needs the
/// upstream reference to download from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtworkJob {
    pub id: String,
    pub thumb: String,
}

/// Result of one fetch pass.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub sections: Vec<Section>,
    pub artwork: Vec<ArtworkJob>,
    pub skipped: Vec<SkippedSection>,
    pub dropped: Vec<DroppedItem>,
}

/// Map an upstream record to a snapshot item.
///
/// Returns `Err` with the reason the record cannot be used.
pub fn to_item(record: &UpstreamItem) -> Result<(Item, ArtworkJob), DropReason> {
    let thumb = record.artwork().ok_or(DropReason::MissingArtwork)?;
    let id = record.rating_key.as_str();
    if !naming::is_safe_id(id) {
        return Err(DropReason::UnsafeId);
    }

    let item = Item {
        id: id.to_string(),
        title: record.title.clone(),
        year: record.year,
        image_200: naming::public_path(id, ImageVariant::Width200),
        image_400: naming::public_path(id, ImageVariant::Width400),
        image_hi_res: naming::public_path(id, ImageVariant::HiRes),
    };
    let job = ArtworkJob {
        id: id.to_string(),
        thumb: thumb.to_string(),
    };
    Ok((item, job))
}

async fn fetch_section(
    source: &impl LibrarySource,
    section_id: u32,
) -> Result<(String, Vec<UpstreamItem>), FetchError> {
    let info = source.section_info(section_id).await?;
    let records = source.section_items(section_id).await?;
    Ok((info.title, records))
}

/// Fetch every section in `section_ids`, in order.
pub async fn fetch_sections(source: &impl LibrarySource, section_ids: &[u32]) -> FetchReport {
    let mut report = FetchReport::default();

    for &section_id in section_ids {
        let (title, records) = match fetch_section(source, section_id).await {
            Ok(fetched) => fetched,
            Err(error) => {
                tracing::error!(section_id, %error, "Error processing section, skipping");
                report.skipped.push(SkippedSection { section_id, error });
                continue;
            }
        };

        let mut items = Vec::with_capacity(records.len());
        for record in &records {
            match to_item(record) {
                Ok((item, job)) => {
                    items.push(item);
                    report.artwork.push(job);
                }
                Err(reason) => {
                    match reason {
                        DropReason::MissingArtwork => tracing::warn!(
                            section_id,
                            item = %record.title,
                            "Skipping item with missing thumb"
                        ),
                        DropReason::UnsafeId => tracing::warn!(
                            section_id,
                            item = %record.title,
                            rating_key = %record.rating_key,
                            "Skipping item with unusable ratingKey"
                        ),
                    }
                    report.dropped.push(DroppedItem {
                        section_id,
                        title: record.title.clone(),
                        reason,
                    });
                }
            }
        }

        tracing::info!(section_id, title = %title, items = items.len(), "Fetched section");
        report.sections.push(Section {
            section_id,
            section_title: title,
            items,
        });
    }

    report
}
