//! Snapshot persistence.
//!
//! The snapshot is the whole application state between restarts: a single
//! pretty-printed JSON array of sections at `{data_dir}/library.json`. Each run
//! replaces it entirely. Writes go to `library.json.part` and are renamed over
//! the target, so a concurrent reader sees either the previous snapshot or the
//! new one, never a prefix.

use crate::naming;
use crate::types::Snapshot;
use std::io;
use std::path::Path;
use thiserror::Error;

/// File name of the snapshot inside the data directory.
pub const SNAPSHOT_FILENAME: &str = "library.json";

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write `bytes` to a `.part` sibling of `path`, then rename it into place.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let part = naming::partial_path(path);
    if let Err(e) = tokio::fs::write(&part, bytes).await {
        let _ = tokio::fs::remove_file(&part).await;
        return Err(e);
    }
    tokio::fs::rename(&part, path).await
}

/// Serialize a snapshot the way it is stored on disk (two-space indent).
pub fn to_json(sections: &Snapshot) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string_pretty(sections)?)
}

/// Replace the snapshot at `path` with `sections`.
pub async fn write_snapshot(path: &Path, sections: &Snapshot) -> Result<(), SnapshotError> {
    let json = to_json(sections)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    write_atomic(path, json.as_bytes()).await?;
    Ok(())
}

/// Read and parse the snapshot. `Ok(None)` when none has been written yet.
pub async fn read_snapshot(path: &Path) -> Result<Option<Snapshot>, SnapshotError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
}
