//! Metadata codec
//!
//! Reads and writes the per-run `metadata.json` record. The lifecycle
//! manager only needs status and end time, so it decodes a narrow
//! `RetentionView` that tolerates missing and unknown fields.

use crate::codec::write_atomic;
use crate::paths::StorePaths;
use chrono::{DateTime, Utc};
use runvault_core::{Error, Result, RunMetadata, RunStatus};
use serde::Deserialize;
use std::fs;
use std::io;

/// The subset of `metadata.json` that drives retention decisions
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionView {
    /// Run status
    pub status: RunStatus,
    /// When the run ended
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    /// When the run started
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

/// Write the metadata record of `meta.run_id` atomically
pub fn write_metadata(paths: &StorePaths, meta: &RunMetadata) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(meta)?;
    write_atomic(&paths.metadata_file(&meta.run_id), &bytes)?;
    Ok(())
}

/// Read the full metadata record of `run_id`
///
/// Fails with `NotFound` when the run has no metadata file.
pub fn read_metadata(paths: &StorePaths, run_id: &str) -> Result<RunMetadata> {
    let bytes = read_metadata_bytes(paths, run_id)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Read only the fields retention needs
pub fn read_retention_view(paths: &StorePaths, run_id: &str) -> Result<RetentionView> {
    let bytes = read_metadata_bytes(paths, run_id)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Modification time of the metadata file
pub fn metadata_modified(paths: &StorePaths, run_id: &str) -> Result<DateTime<Utc>> {
    let modified = fs::metadata(paths.metadata_file(run_id))?.modified()?;
    Ok(modified.into())
}

fn read_metadata_bytes(paths: &StorePaths, run_id: &str) -> Result<Vec<u8>> {
    match fs::read(paths.metadata_file(run_id)) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::run_not_found(run_id)),
        Err(e) => Err(e.into()),
    }
}
