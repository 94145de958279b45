//! On-disk cache of raw dataset rows.
//!
//! Each dataset is stored as a JSON array at `<dir>/<dataset id>.json`,
//! which lets the pipeline rerun offline against a previous fetch.

use std::path::{Path, PathBuf};

use parcel_distress_source_models::RawRecord;

use crate::SourceError;

/// Returns the cache file path for a dataset.
#[must_use]
pub fn cache_path(dir: &Path, dataset_id: &str) -> PathBuf {
    dir.join(format!("{dataset_id}.json"))
}

/// Writes a dataset's rows to the cache, creating `dir` if needed.
///
/// # Errors
///
/// Returns [`SourceError`] if serialization or file I/O fails.
pub async fn write_cache(
    dir: &Path,
    dataset_id: &str,
    records: &[RawRecord],
) -> Result<PathBuf, SourceError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = cache_path(dir, dataset_id);
    let json = serde_json::to_vec(records)?;
    tokio::fs::write(&path, json).await?;
    log::debug!("Cached {} records to {}", records.len(), path.display());
    Ok(path)
}

/// Reads a dataset's rows from the cache.
///
/// # Errors
///
/// Returns [`SourceError`] if the file is missing or is not a JSON array
/// of objects.
pub async fn read_cache(dir: &Path, dataset_id: &str) -> Result<Vec<RawRecord>, SourceError> {
    let path = cache_path(dir, dataset_id);
    let bytes = tokio::fs::read(&path).await?;
    let records: Vec<RawRecord> = serde_json::from_slice(&bytes)?;
    log::debug!("Read {} cached records from {}", records.len(), path.display());
    Ok(records)
}
