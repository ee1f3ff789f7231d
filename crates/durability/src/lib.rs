//! Durability layer for runvault
//!
//! This crate handles everything that touches disk:
//!
//! - Store directory layout (`runs/`, `archive/`)
//! - Gzip blob codec with atomic writes and a single on-disk form per blob
//! - Metadata codec for the per-run `metadata.json`
//! - Artifact Manager: per-run named blobs and preserved files
//! - RunBundle: tar+gzip cold-storage archives with validated extraction
//! - Retention policy and the Lifecycle Manager that enforces it

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod artifacts; // Per-run named blob storage
pub mod codec; // Gzip codec and atomic blob writes
pub mod lifecycle; // Retention passes, archive tier, disk usage
pub mod metadata; // metadata.json read/write
pub mod paths; // Store directory layout
pub mod retention; // Retention thresholds and exemptions
pub mod run_bundle; // tar+gzip run archives

// === Re-exports ===

pub use artifacts::{names as artifact_names, ArtifactManager, DEFAULT_ARTIFACT_COMPRESS_ABOVE};
pub use codec::StoredForm;
pub use lifecycle::{
    directory_size, CleanupFailure, CleanupReport, Clock, DiskUsage, LifecycleManager, MockClock,
    SystemClock,
};
pub use metadata::{read_metadata, read_retention_view, write_metadata, RetentionView};
pub use paths::StorePaths;
pub use retention::{Disposition, RetentionPolicy};
pub use run_bundle::{
    BundleError, BundleInfo, BundleResult, ExtractInfo, RunBundleReader, RunBundleWriter,
};
