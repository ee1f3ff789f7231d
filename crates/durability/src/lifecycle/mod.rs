//! Lifecycle Manager
//!
//! Enforces the retention policy over the run directories and manages the
//! archive tier. Holds no in-process shared state: every pass scans the
//! filesystem and recomputes each run's disposition from the current time
//! and the run's metadata.
//!
//! Passes against one base directory must be serialized by the caller;
//! there is no cross-process locking.

mod archives;
mod cleanup;
mod clock;
mod usage;

pub use clock::{Clock, MockClock, SystemClock};
pub use usage::directory_size;

use crate::paths::{is_hidden_entry, StorePaths};
use crate::retention::RetentionPolicy;
use runvault_core::Result;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Purposes of the hidden `.<purpose>-<run_id>-<uuid>` directories under `runs/`
const STAGING_PURPOSES: [&str; 3] = ["removing", "archiving", "restore"];

/// One per-item failure inside a bulk pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupFailure {
    /// Run the failure belongs to
    pub run_id: String,
    /// Rendered error
    pub error: String,
}

/// Outcome of a `cleanup` or `cleanup_archives` pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Runs moved (or, on a dry run, that would move) to cold storage
    pub archived: Vec<String>,
    /// Runs or archives removed
    pub deleted: Vec<String>,
    /// Runs left in place
    pub kept: Vec<String>,
    /// Per-item failures; the items themselves were left untouched
    pub errors: Vec<CleanupFailure>,
    /// Bytes reclaimed: exact for deletions, half the original size for
    /// archival since the compression ratio is not known up front
    pub space_saved: u64,
    /// Compressed size of the archives actually written (0 on dry runs)
    pub archive_bytes_written: u64,
}

impl CleanupReport {
    /// True if no item failed
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn fail(&mut self, run_id: &str, error: impl ToString) {
        let error = error.to_string();
        warn!(target: "runvault::lifecycle", run_id = %run_id, error = %error, "Lifecycle action failed");
        self.errors.push(CleanupFailure {
            run_id: run_id.to_string(),
            error,
        });
    }
}

/// Disk usage of both tiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiskUsage {
    /// Run directories under `runs/`
    pub run_count: u64,
    /// Archives under `archive/`
    pub archive_count: u64,
    /// Bytes held by run directories
    pub active_size: u64,
    /// Bytes held by archives
    pub archive_size: u64,
    /// `active_size + archive_size`
    pub total_size: u64,
}

/// Retention enforcement and archive management for one base directory
#[derive(Clone)]
pub struct LifecycleManager {
    paths: StorePaths,
    policy: RetentionPolicy,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for LifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("paths", &self.paths)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl LifecycleManager {
    /// Create a manager using the wall clock
    pub fn new(paths: StorePaths, policy: RetentionPolicy) -> Self {
        Self::with_clock(paths, policy, Arc::new(SystemClock))
    }

    /// Create a manager with an injected clock
    pub fn with_clock(paths: StorePaths, policy: RetentionPolicy, clock: Arc<dyn Clock>) -> Self {
        LifecycleManager {
            paths,
            policy,
            clock,
        }
    }

    /// Store paths
    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Active retention policy
    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Replace the retention policy
    pub fn set_policy(&mut self, policy: RetentionPolicy) {
        self.policy = policy;
    }

    /// Ids of all run directories, sorted
    ///
    /// A missing `runs/` directory means there is nothing to do. Hidden
    /// staging entries and stray files are skipped.
    pub fn run_ids(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(self.paths.runs_dir()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(target: "runvault::lifecycle", error = %e, "Skipping unreadable run entry");
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().to_string();
            if is_hidden_entry(&name) {
                continue;
            }
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                ids.push(name);
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Hidden sibling under `runs/` used to stage a directory swap
    fn staging_dir(&self, purpose: &str, run_id: &str) -> PathBuf {
        self.paths.runs_dir().join(format!(
            ".{}-{}-{}",
            purpose,
            run_id,
            uuid::Uuid::new_v4().simple()
        ))
    }

    /// Remove a run directory by first hiding it from scans
    fn remove_run_dir(&self, run_id: &str) -> Result<()> {
        self.retire_run_dir(run_id, "removing", |staged| fs::remove_dir_all(staged))
    }

    /// Hide a run directory under a staging name, then delete it with `remove`
    ///
    /// If `remove` fails the staged directory is renamed back so the run
    /// stays visible to later passes, and the error is returned.
    fn retire_run_dir<F>(&self, run_id: &str, purpose: &str, remove: F) -> Result<()>
    where
        F: FnOnce(&Path) -> io::Result<()>,
    {
        let run_dir = self.paths.run_dir(run_id);
        let staged = self.staging_dir(purpose, run_id);
        fs::rename(&run_dir, &staged)?;
        if let Err(e) = remove(&staged) {
            if let Err(back) = fs::rename(&staged, &run_dir) {
                warn!(
                    target: "runvault::lifecycle",
                    run_id = %run_id,
                    path = %staged.display(),
                    error = %back,
                    "Failed to return run directory after aborted removal"
                );
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Remove staging directories left behind by interrupted operations
    ///
    /// Returns how many were removed.
    fn sweep_staging(&self) -> usize {
        let entries = match fs::read_dir(self.paths.runs_dir()) {
            Ok(entries) => entries,
            Err(_) => return 0,
        };

        let mut swept = 0;
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if !is_staging_name(&name) || !entry.path().is_dir() {
                continue;
            }
            match fs::remove_dir_all(entry.path()) {
                Ok(()) => {
                    debug!(target: "runvault::lifecycle", name = %name, "Removed stale staging directory");
                    swept += 1;
                }
                Err(e) => warn!(
                    target: "runvault::lifecycle",
                    name = %name,
                    error = %e,
                    "Failed to remove stale staging directory"
                ),
            }
        }
        swept
    }
}

/// Whether `name` is a staging directory created by `staging_dir`
fn is_staging_name(name: &str) -> bool {
    STAGING_PURPOSES.iter().any(|purpose| {
        name.strip_prefix('.')
            .and_then(|rest| rest.strip_prefix(purpose))
            .map_or(false, |rest| rest.starts_with('-'))
    })
}

/// Best-effort removal of a hidden staging directory
fn discard_staged(path: &Path) {
    if let Err(e) = fs::remove_dir_all(path) {
        warn!(
            target: "runvault::lifecycle",
            path = %path.display(),
            error = %e,
            "Failed to remove staging directory"
        );
    }
}
