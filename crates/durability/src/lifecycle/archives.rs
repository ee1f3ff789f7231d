//! Archive tier: archive, restore, list, delete and age out bundles

use super::{discard_staged, CleanupReport, LifecycleManager};
use crate::metadata::read_retention_view;
use crate::paths::{is_hidden_entry, ARCHIVE_EXTENSION};
use crate::run_bundle::{BundleInfo, ExtractInfo, RunBundleReader, RunBundleWriter};
use chrono::{DateTime, Utc};
use runvault_core::{validate_run_id, Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

impl LifecycleManager {
    /// Bundle a run into `archive/<YYYY-MM>/<run_id>.tar.gz` and remove its directory
    ///
    /// The source directory is only removed after the archive is complete.
    /// Fails with `InvalidState` for a run whose metadata says it is still
    /// running, and with `AlreadyExists` if an archive is already filed.
    pub fn archive_run(&self, run_id: &str) -> Result<BundleInfo> {
        validate_run_id(run_id)?;
        if !self.paths.run_dir(run_id).is_dir() {
            return Err(Error::run_not_found(run_id));
        }
        if let Ok(view) = read_retention_view(&self.paths, run_id) {
            if view.status.is_running() {
                return Err(Error::invalid_state(format!(
                    "run {} is still running",
                    run_id
                )));
            }
        }
        self.archive_unchecked(run_id)
    }

    pub(super) fn archive_unchecked(&self, run_id: &str) -> Result<BundleInfo> {
        self.archive_with(run_id, |staged| fs::remove_dir_all(staged))
    }

    /// Archive a run, deleting its hidden source directory with `remove`
    fn archive_with<F>(&self, run_id: &str, remove: F) -> Result<BundleInfo>
    where
        F: FnOnce(&Path) -> io::Result<()>,
    {
        if self.locate_archive(run_id)?.is_some() {
            return Err(Error::archive_exists(run_id));
        }

        let run_dir = self.paths.run_dir(run_id);
        let archive_path = self.paths.archive_file_at(run_id, self.clock.now());
        let bundle = RunBundleWriter::with_defaults().write(&run_dir, run_id, &archive_path)?;

        // Hide the source before removing it so the run never shows in both tiers
        if let Err(e) = self.retire_run_dir(run_id, "archiving", remove) {
            self.abandon_archive(run_id, &bundle);
            return Err(e);
        }

        info!(
            target: "runvault::lifecycle",
            run_id = %run_id,
            files = bundle.file_count,
            original_bytes = bundle.original_bytes,
            bundle_bytes = bundle.bundle_bytes,
            "Archived run"
        );
        Ok(bundle)
    }

    /// Undo a written archive after its source directory could not be removed
    ///
    /// The archive is deleted only when the run directory is back in place
    /// with every bundled file; otherwise it is the one complete copy and
    /// is kept.
    fn abandon_archive(&self, run_id: &str, bundle: &BundleInfo) {
        let run_dir = self.paths.run_dir(run_id);
        if !run_dir.is_dir() || count_files(&run_dir) != bundle.file_count {
            warn!(
                target: "runvault::lifecycle",
                run_id = %run_id,
                path = %bundle.path.display(),
                "Run directory incomplete after aborted archival, keeping archive"
            );
            return;
        }
        if let Err(e) = remove_archive_file(&bundle.path) {
            warn!(
                target: "runvault::lifecycle",
                path = %bundle.path.display(),
                error = %e,
                "Failed to remove archive after aborted archival"
            );
        }
    }

    /// Extract an archive back into `runs/<run_id>/`
    ///
    /// Extraction goes to a hidden staging directory that is renamed into
    /// place only when every entry was written. The archive is removed
    /// afterwards.
    pub fn restore_archive(&self, run_id: &str) -> Result<ExtractInfo> {
        validate_run_id(run_id)?;
        let archive_path = self
            .locate_archive(run_id)?
            .ok_or_else(|| Error::archive_not_found(run_id))?;
        let run_dir = self.paths.run_dir(run_id);
        if run_dir.exists() {
            return Err(Error::run_exists(run_id));
        }

        fs::create_dir_all(self.paths.runs_dir())?;
        let staging = self.staging_dir("restore", run_id);
        let extracted = match RunBundleReader::extract(&archive_path, run_id, &staging) {
            Ok(extracted) => extracted,
            Err(e) => {
                discard_staged(&staging);
                return Err(e.into());
            }
        };

        if run_dir.exists() {
            discard_staged(&staging);
            return Err(Error::run_exists(run_id));
        }
        if let Err(e) = fs::rename(&staging, &run_dir) {
            discard_staged(&staging);
            return Err(e.into());
        }

        if let Err(e) = remove_archive_file(&archive_path) {
            warn!(
                target: "runvault::lifecycle",
                run_id = %run_id,
                error = %e,
                "Restored run but could not remove its archive"
            );
        }

        info!(
            target: "runvault::lifecycle",
            run_id = %run_id,
            files = extracted.files,
            bytes = extracted.bytes,
            "Restored run from archive"
        );
        Ok(extracted)
    }

    /// Ids of every archived run, regardless of month bucket
    pub fn list_archives(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self
            .archive_entries()?
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    /// Remove the archive of `run_id`
    pub fn delete_archive(&self, run_id: &str) -> Result<()> {
        validate_run_id(run_id)?;
        let path = self
            .locate_archive(run_id)?
            .ok_or_else(|| Error::archive_not_found(run_id))?;
        remove_archive_file(&path)?;
        info!(target: "runvault::lifecycle", run_id = %run_id, "Deleted archive");
        Ok(())
    }

    /// Compressed size of the archive of `run_id`
    pub fn archive_size(&self, run_id: &str) -> Result<u64> {
        validate_run_id(run_id)?;
        let path = self
            .locate_archive(run_id)?
            .ok_or_else(|| Error::archive_not_found(run_id))?;
        Ok(fs::metadata(path)?.len())
    }

    /// Path of the archive of `run_id`, if any
    ///
    /// Checks the expected month bucket first, then scans the whole tree.
    pub fn locate_archive(&self, run_id: &str) -> Result<Option<PathBuf>> {
        let expected = self.paths.archive_file_at(run_id, self.clock.now());
        if expected.is_file() {
            return Ok(Some(expected));
        }
        Ok(self
            .archive_entries()?
            .into_iter()
            .find(|(id, _)| id == run_id)
            .map(|(_, path)| path))
    }

    /// Purge archives whose write time is at least `archive_retention_days` old
    pub fn cleanup_archives(&self, dry_run: bool) -> Result<CleanupReport> {
        let now = self.clock.now();
        let mut report = CleanupReport::default();

        for (run_id, path) in self.archive_entries()? {
            let meta = match fs::metadata(&path) {
                Ok(meta) => meta,
                Err(e) => {
                    report.fail(&run_id, e);
                    continue;
                }
            };
            let written: DateTime<Utc> = match meta.modified() {
                Ok(t) => t.into(),
                Err(e) => {
                    report.fail(&run_id, e);
                    continue;
                }
            };

            if !self.policy.archive_expired(now - written) {
                report.kept.push(run_id);
                continue;
            }

            if !dry_run {
                if let Err(e) = remove_archive_file(&path) {
                    report.fail(&run_id, e);
                    continue;
                }
            }
            debug!(target: "runvault::lifecycle", run_id = %run_id, dry_run, "Purged archive");
            report.space_saved += meta.len();
            report.deleted.push(run_id);
        }

        info!(
            target: "runvault::lifecycle",
            dry_run,
            deleted = report.deleted.len(),
            kept = report.kept.len(),
            errors = report.errors.len(),
            space_saved = report.space_saved,
            "Archive cleanup pass complete"
        );
        Ok(report)
    }

    /// Every `(run_id, path)` bundle under the archive tree
    pub(super) fn archive_entries(&self) -> Result<Vec<(String, PathBuf)>> {
        let root = self.paths.archive_dir();
        if !root.exists() {
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden_entry(&e.file_name().to_string_lossy()));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(std::io::Error::from(e).into()),
                Err(e) => {
                    warn!(target: "runvault::lifecycle", error = %e, "Skipping unreadable archive entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if let Some(run_id) = name.strip_suffix(ARCHIVE_EXTENSION) {
                if !run_id.is_empty() {
                    found.push((run_id.to_string(), entry.path().to_path_buf()));
                }
            }
        }
        Ok(found)
    }
}

/// Remove a bundle and, if now empty, its month bucket
fn count_files(dir: &Path) -> u64 {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .count() as u64
}

fn remove_archive_file(path: &Path) -> io::Result<()> {
    fs::remove_file(path)?;
    if let Some(bucket) = path.parent() {
        // Fails harmlessly while other archives remain in the bucket
        let _ = fs::remove_dir(bucket);
    }
    Ok(())
}
