//! Artwork materialization: download each item's artwork and derive the
//! resized variants.
//!
//! For every [`ArtworkJob`]:
//!
//! ```text
//! GET {server}{thumb}   →  images/{id}-hi.jpg   (original bytes)
//!                       →  images/{id}-400.jpg  (400px wide JPEG)
//!                       →  images/{id}-200.jpg  (200px wide JPEG)
//! ```
//!
//! Downloads stream straight to disk and run concurrently, at most
//! `max_downloads` at a time. Decoding
//! and encoding happen on tokio's blocking pool. [`materialize_all`] resolves
//! only once every job has finished, which lets the caller write the snapshot
//! strictly after the images it references.
//!
//! A failed job is logged and reported; the item stays in the snapshot with a
//! dangling image reference.

use crate::fetch::ArtworkJob;
use crate::imaging::{BackendError, ImageBackend, Quality, create_resized_variants};
use crate::naming::{self, ImageVariant};
use crate::upstream::{FetchError, LibrarySource};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MaterializeError {
    #[error("Download failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("Resize task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone)]
pub struct MaterializeOptions {
    pub images_dir: PathBuf,
    pub quality: Quality,
    pub max_downloads: usize,
}

/// A job that did not produce all three files.
#[derive(Debug)]
pub struct FailedArtwork {
    pub id: String,
    pub error: MaterializeError,
}

#[derive(Debug, Default)]
pub struct MaterializeReport {
    /// Items with all three files written.
    pub completed: Vec<String>,
    pub failed: Vec<FailedArtwork>,
}

async fn materialize_one<B: ImageBackend + 'static>(
    source: &impl LibrarySource,
    backend: Arc<B>,
    job: &ArtworkJob,
    options: &MaterializeOptions,
) -> Result<(), MaterializeError> {
    let hi_res = naming::disk_path(&options.images_dir, &job.id, ImageVariant::HiRes);
    let part = naming::partial_path(&hi_res);
    let size = match source.download_artwork(&job.thumb, &part).await {
        Ok(size) => size,
        Err(e) => {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(e.into());
        }
    };
    tokio::fs::rename(&part, &hi_res).await?;
    tracing::debug!(item = %job.id, bytes = size, "Downloaded artwork");

    let images_dir = options.images_dir.clone();
    let id = job.id.clone();
    let quality = options.quality;
    tokio::task::spawn_blocking(move || {
        create_resized_variants(&*backend, &hi_res, &images_dir, &id, quality)
    })
    .await??;

    Ok(())
}

/// Materialize every job and wait for all of them.
pub async fn materialize_all<B: ImageBackend + 'static>(
    source: &impl LibrarySource,
    backend: Arc<B>,
    jobs: &[ArtworkJob],
    options: &MaterializeOptions,
) -> MaterializeReport {
    if let Err(e) = tokio::fs::create_dir_all(&options.images_dir).await {
        tracing::error!(dir = %options.images_dir.display(), error = %e, "Cannot create images directory");
        return MaterializeReport {
            completed: Vec::new(),
            failed: jobs
                .iter()
                .map(|job| FailedArtwork {
                    id: job.id.clone(),
                    error: MaterializeError::Io(std::io::Error::new(e.kind(), e.to_string())),
                })
                .collect(),
        };
    }

    // Owned jobs keep the stream Send for tokio::spawn.
    let results: Vec<(ArtworkJob, Result<(), MaterializeError>)> =
        futures::stream::iter(jobs.iter().cloned())
            .map(|job| {
                let backend = Arc::clone(&backend);
                async move {
                    let result = materialize_one(source, backend, &job, options).await;
                    (job, result)
                }
            })
            .buffer_unordered(options.max_downloads.max(1))
            .collect()
            .await;

    let mut report = MaterializeReport::default();
    for (job, result) in results {
        match result {
            Ok(()) => {
                tracing::debug!(item = %job.id, "Materialized artwork");
                report.completed.push(job.id);
            }
            Err(error) => {
                tracing::error!(item = %job.id, thumb = %job.thumb, %error, "Error downloading image");
                report.failed.push(FailedArtwork { id: job.id, error });
            }
        }
    }
    // buffer_unordered completes out of order
    report.completed.sort();
    report.failed.sort_by(|a, b| a.id.cmp(&b.id));

    tracing::info!(
        completed = report.completed.len(),
        failed = report.failed.len(),
        "Artwork materialized"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::test_helpers::MockSource;
    use tempfile::TempDir;

    fn options(dir: &std::path::Path) -> MaterializeOptions {
        MaterializeOptions {
            images_dir: dir.to_path_buf(),
            quality: Quality::default(),
            max_downloads: 2,
        }
    }

    fn job(id: &str) -> ArtworkJob {
        ArtworkJob {
            id: id.into(),
            thumb: format!("/library/metadata/{id}/thumb"),
        }
    }

    #[tokio::test]
    async fn writes_all_three_files() {
        let tmp = TempDir::new().unwrap();
        let source = MockSource::new().with_artwork("/library/metadata/7/thumb", b"original".to_vec());
        let backend = Arc::new(MockBackend::new());

        let report = materialize_all(&source, backend, &[job("7")], &options(tmp.path())).await;

        assert_eq!(report.completed, vec!["7".to_string()]);
        assert!(report.failed.is_empty());
        assert_eq!(std::fs::read(tmp.path().join("7-hi.jpg")).unwrap(), b"original");
        assert!(!tmp.path().join("7-hi.jpg.part").exists());
        assert!(tmp.path().join("7-400.jpg").exists());
        assert!(tmp.path().join("7-200.jpg").exists());
    }

    #[tokio::test]
    async fn download_failure_is_reported_and_others_continue() {
        let tmp = TempDir::new().unwrap();
        let source = MockSource::new().with_artwork("/library/metadata/1/thumb", b"a".to_vec());
        let backend = Arc::new(MockBackend::new());

        let report = materialize_all(
            &source,
            backend,
            &[job("1"), job("2")],
            &options(tmp.path()),
        )
        .await;

        assert_eq!(report.completed, vec!["1".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].id, "2");
        assert!(matches!(report.failed[0].error, MaterializeError::Fetch(_)));
        assert!(!tmp.path().join("2-hi.jpg").exists());
        assert!(!tmp.path().join("2-hi.jpg.part").exists());
    }

    #[tokio::test]
    async fn resize_failure_keeps_hi_res() {
        let tmp = TempDir::new().unwrap();
        let source = MockSource::new().with_artwork("/library/metadata/3/thumb", b"x".to_vec());
        let backend = Arc::new(MockBackend::failing());

        let report = materialize_all(&source, backend, &[job("3")], &options(tmp.path())).await;

        assert!(matches!(report.failed[0].error, MaterializeError::Imaging(_)));
        assert!(tmp.path().join("3-hi.jpg").exists());
        assert!(!tmp.path().join("3-400.jpg").exists());
    }

    #[tokio::test]
    async fn no_jobs_is_empty_report() {
        let tmp = TempDir::new().unwrap();
        let report = materialize_all(
            &MockSource::new(),
            Arc::new(MockBackend::new()),
            &[],
            &options(&tmp.path().join("images")),
        )
        .await;
        assert!(report.completed.is_empty());
        assert!(report.failed.is_empty());
        assert!(tmp.path().join("images").is_dir());
    }
}
