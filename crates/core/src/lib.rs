//! Core types for runvault
//!
//! This crate defines the foundational types shared by the storage and
//! engine layers:
//! - RunId: run identifiers, validation and archive month buckets
//! - RunStatus / RunMetadata: the per-run `metadata.json` record
//! - Turn / ToolCall / Transcript: conversation records
//! - ArtifactType: advisory type inferred from artifact names
//! - Error: error taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod artifact_types;
pub mod error;
pub mod run_types;
pub mod transcript;
pub mod types;

pub use artifact_types::{infer_artifact_type, ArtifactInfo, ArtifactType};
pub use error::{Error, Result};
pub use run_types::{NewRun, RunMetadata, RunStatus};
pub use transcript::{Role, ToolCall, Transcript, Turn};
pub use types::{month_bucket, month_bucket_at, validate_run_id, RunId, MONTH_BUCKET_LEN};
