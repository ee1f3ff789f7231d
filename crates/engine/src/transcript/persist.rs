//! On-disk form of finished transcripts
//!
//! `transcript.json` holds the whole record (metadata flattened into the
//! top-level object, then the turns). Serialized transcripts above the
//! threshold are stored as `transcript.json.gz` instead; the codec never
//! leaves both forms behind.

use runvault_core::{Error, Result, Transcript};
use runvault_durability::codec::{read_blob, write_blob, StoredForm};
use runvault_durability::{write_metadata, StorePaths};

/// Write the transcript and then its metadata record
pub fn save_transcript(
    paths: &StorePaths,
    transcript: &Transcript,
    compress_above: usize,
) -> Result<StoredForm> {
    let bytes = serde_json::to_vec_pretty(transcript)?;
    let form = write_blob(
        &paths.transcript_file(transcript.run_id()),
        &bytes,
        compress_above,
    )?;
    write_metadata(paths, &transcript.metadata)?;
    Ok(form)
}

/// Read a persisted transcript, compressed form first
pub fn load_transcript(paths: &StorePaths, run_id: &str) -> Result<Transcript> {
    match read_blob(&paths.transcript_file(run_id))? {
        Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
        None => Err(Error::transcript_not_found(run_id)),
    }
}
