//! The one-shot mirror pipeline.
//!
//! ```text
//! fetch_sections  →  materialize_all  →  write_snapshot
//! ```
//!
//! The snapshot is written only after every artwork job has settled, so
//! whenever `library.json` exists, each image it names has either been fully
//! written or has definitively failed.

use crate::config::AppConfig;
use crate::fetch::{FetchReport, fetch_sections};
use crate::imaging::{ImageBackend, Quality};
use crate::materialize::{MaterializeOptions, MaterializeReport, materialize_all};
use crate::snapshot::{SnapshotError, write_snapshot};
use crate::upstream::LibrarySource;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Snapshot write failed: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Everything one pass did.
#[derive(Debug)]
pub struct SyncReport {
    pub fetch: FetchReport,
    pub materialize: MaterializeReport,
    pub snapshot_path: PathBuf,
}

/// Create the data and images directories if missing.
pub fn ensure_dirs(config: &AppConfig) -> std::io::Result<()> {
    std::fs::create_dir_all(&config.paths.data_dir)?;
    std::fs::create_dir_all(&config.paths.images_dir)?;
    Ok(())
}

/// Run the pipeline once against `source`.
pub async fn run<B: ImageBackend + 'static>(
    config: &AppConfig,
    source: &impl LibrarySource,
    backend: Arc<B>,
) -> Result<SyncReport, SyncError> {
    ensure_dirs(config)?;

    tracing::info!(sections = ?config.sections.ids, "Fetching library sections");
    let fetch = fetch_sections(source, &config.sections.ids).await;

    let options = MaterializeOptions {
        images_dir: config.paths.images_dir.clone(),
        quality: Quality::new(config.images.quality),
        max_downloads: config.processing.max_downloads,
    };
    let materialize = materialize_all(source, backend, &fetch.artwork, &options).await;

    let snapshot_path = config.snapshot_path();
    write_snapshot(&snapshot_path, &fetch.sections).await?;
    tracing::info!(path = %snapshot_path.display(), sections = fetch.sections.len(), "Library data updated");

    Ok(SyncReport {
        fetch,
        materialize,
        snapshot_path,
    })
}
