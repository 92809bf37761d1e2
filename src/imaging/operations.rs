//! High-level image operations.
//!
//! These functions combine calculations with backend execution. Every output
//! is written to a `.part` sibling first and renamed into place, so a file at
//! its final path is always complete.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{MAX_JPEG_DIMENSION, scale_to_width};
use super::params::{Quality, ResizeParams};
use crate::naming::{self, ImageVariant};
use std::path::{Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// A resized variant written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedVariant {
    pub variant: ImageVariant,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Plan the resize for one variant without executing it.
pub fn plan_variant(
    source: &Path,
    output: &Path,
    original_dims: (u32, u32),
    target_width: u32,
    quality: Quality,
) -> ResizeParams {
    let (width, height) = scale_to_width(original_dims, target_width);
    ResizeParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        width,
        height,
        quality,
    }
}

/// Create the 400px and 200px variants of `source` for item `id`.
///
/// `source` is normally the already-written hi-res file.
pub fn create_resized_variants(
    backend: &impl ImageBackend,
    source: &Path,
    images_dir: &Path,
    id: &str,
    quality: Quality,
) -> Result<Vec<GeneratedVariant>> {
    let original_dims = get_dimensions(backend, source)?;
    let mut variants = Vec::new();

    for variant in ImageVariant::RESIZED {
        let Some(target_width) = variant.width() else {
            continue;
        };
        let final_path = naming::disk_path(images_dir, id, variant);
        let part_path = naming::partial_path(&final_path);

        let params = plan_variant(source, &part_path, original_dims, target_width, quality);
        // Checked before decoding: resize_exact would allocate the full canvas.
        if params.height > MAX_JPEG_DIMENSION {
            return Err(BackendError::ProcessingFailed(format!(
                "{}px variant of {}x{} source would be {} px tall (JPEG max {})",
                target_width, original_dims.0, original_dims.1, params.height, MAX_JPEG_DIMENSION
            )));
        }
        if let Err(e) = backend.resize(&params) {
            let _ = std::fs::remove_file(&part_path);
            return Err(e);
        }
        std::fs::rename(&part_path, &final_path)?;

        variants.push(GeneratedVariant {
            variant,
            path: final_path,
            width: params.width,
            height: params.height,
        });
    }

    Ok(variants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use tempfile::TempDir;

    #[test]
    fn get_dimensions_calls_backend() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 1920,
            height: 1080,
        }]);

        let dims = get_dimensions(&backend, Path::new("/test.jpg")).unwrap();
        assert_eq!(dims, (1920, 1080));
    }

    #[test]
    fn plan_variant_keeps_aspect() {
        let params = plan_variant(
            Path::new("/hi.jpg"),
            Path::new("/out.jpg"),
            (1000, 1500),
            400,
            Quality::default(),
        );
        assert_eq!((params.width, params.height), (400, 600));
        assert_eq!(params.quality.value(), 80);
    }

    #[test]
    fn creates_400_then_200() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 1000,
            height: 1500,
        }]);

        let variants = create_resized_variants(
            &backend,
            &tmp.path().join("101-hi.jpg"),
            tmp.path(),
            "101",
            Quality::new(75),
        )
        .unwrap();

        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].variant, ImageVariant::Width400);
        assert_eq!((variants[0].width, variants[0].height), (400, 600));
        assert_eq!(variants[1].variant, ImageVariant::Width200);
        assert_eq!((variants[1].width, variants[1].height), (200, 300));

        // Final files exist, no leftovers
        assert!(tmp.path().join("101-400.jpg").exists());
        assert!(tmp.path().join("101-200.jpg").exists());
        assert!(!tmp.path().join("101-400.jpg.part").exists());

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 3);
        assert!(matches!(&ops[0], RecordedOp::Identify(_)));
        assert!(matches!(
            &ops[1],
            RecordedOp::Resize { output, width: 400, quality: 75, .. } if output.ends_with("101-400.jpg.part")
        ));
        assert!(matches!(
            &ops[2],
            RecordedOp::Resize { width: 200, .. }
        ));
    }

    #[test]
    fn identify_failure_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::failing();

        let result = create_resized_variants(
            &backend,
            &tmp.path().join("1-hi.jpg"),
            tmp.path(),
            "1",
            Quality::default(),
        );

        assert!(result.is_err());
        assert!(!tmp.path().join("1-400.jpg").exists());
        assert!(!tmp.path().join("1-200.jpg").exists());
    }

    #[test]
    fn too_tall_variant_is_rejected_before_resize() {
        let tmp = TempDir::new().unwrap();
        // 1x100000 enlarged to 400 wide would be 40,000,000 px tall
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 1,
            height: 100_000,
        }]);

        let result = create_resized_variants(
            &backend,
            &tmp.path().join("9-hi.jpg"),
            tmp.path(),
            "9",
            Quality::default(),
        );

        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Identify(_)));
        assert!(!tmp.path().join("9-400.jpg").exists());
        assert!(!tmp.path().join("9-400.jpg.part").exists());
    }

    #[test]
    fn tallest_encodable_variant_is_allowed() {
        let tmp = TempDir::new().unwrap();
        // 400 wide → exactly 65535 tall
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 400,
            height: 65_535,
        }]);

        let variants = create_resized_variants(
            &backend,
            &tmp.path().join("8-hi.jpg"),
            tmp.path(),
            "8",
            Quality::default(),
        )
        .unwrap();

        assert_eq!(variants[0].height, 65_535);
    }
}
