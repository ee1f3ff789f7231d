//! runvault - run artifact, transcript and retention store
//!
//! runvault keeps everything a multi-step workflow run produces under one
//! directory per run: artifacts, preserved files, the conversation
//! transcript and a `metadata.json` summary. Old runs are bundled into
//! `tar.gz` archives and eventually deleted according to a retention policy.
//!
//! # Quick Start
//!
//! ```ignore
//! use runvault::{NewRun, RunStatus, Turn, Vault};
//!
//! let vault = Vault::open(".runvault")?;
//! vault.transcripts().start_run("2026-01-05-build-a1", NewRun::for_flow("build"))?;
//! vault.transcripts().record_turn("2026-01-05-build-a1", Turn::user("hi"))?;
//! vault.artifacts().save_artifact("2026-01-05-build-a1", "spec.md", b"# spec")?;
//! vault.transcripts().end_run("2026-01-05-build-a1", RunStatus::Completed)?;
//!
//! let report = vault.lifecycle().cleanup(true)?;
//! ```
//!
//! # Architecture
//!
//! - `runvault-core`: ids, run metadata, transcript records, errors
//! - `runvault-durability`: on-disk layout, artifacts, archives, retention
//! - `runvault-engine`: active-run tracking, transcript search, [`Vault`]

pub use runvault_core::{
    ArtifactInfo, ArtifactType, Error, NewRun, Result, Role, RunMetadata, RunStatus, ToolCall,
    Transcript, Turn,
};
pub use runvault_durability::{
    ArtifactManager, CleanupFailure, CleanupReport, Clock, DiskUsage, LifecycleManager, MockClock,
    RetentionPolicy, StorePaths, SystemClock,
};
pub use runvault_engine::{
    RunFilter, RunObserver, SearchHit, SearchQuery, StorageConfig, TranscriptStore, Vault,
    VaultConfig,
};
