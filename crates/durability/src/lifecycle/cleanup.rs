//! Retention pass over the run directories

use super::usage::directory_size;
use super::{CleanupReport, LifecycleManager};
use crate::metadata::{metadata_modified, read_retention_view};
use crate::retention::Disposition;
use chrono::{DateTime, Utc};
use runvault_core::{Result, RunStatus};
use tracing::{debug, info};

/// A run as seen by the retention pass
#[derive(Debug, Clone)]
struct Candidate {
    run_id: String,
    status: RunStatus,
    ended_at: DateTime<Utc>,
}

impl LifecycleManager {
    /// Run one retention pass
    ///
    /// Runs are visited oldest to newest. Running runs and, with
    /// `keep_failed`, failed runs are always kept. Every other run is
    /// deleted or archived by age, but only while more than
    /// `keep_min_runs` runs would remain. A dry run classifies and sizes
    /// everything without touching disk. An applied pass first removes
    /// staging directories left by interrupted archival, removal or restore.
    pub fn cleanup(&self, dry_run: bool) -> Result<CleanupReport> {
        let now = self.clock.now();
        let mut report = CleanupReport::default();

        if !dry_run {
            let swept = self.sweep_staging();
            if swept > 0 {
                info!(target: "runvault::lifecycle", swept, "Removed stale staging directories");
            }
        }

        let run_ids = self.run_ids()?;
        let mut remaining = run_ids.len();
        let mut candidates = Vec::with_capacity(run_ids.len());
        for run_id in run_ids {
            match self.inspect(&run_id) {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => report.fail(&run_id, e),
            }
        }
        candidates.sort_by(|a, b| {
            a.ended_at
                .cmp(&b.ended_at)
                .then_with(|| a.run_id.cmp(&b.run_id))
        });

        for candidate in candidates {
            let age = now - candidate.ended_at;
            let disposition = self.policy.classify(candidate.status, age);
            if !disposition.is_removal() || remaining <= self.policy.keep_min_runs {
                debug!(
                    target: "runvault::lifecycle",
                    run_id = %candidate.run_id,
                    ?disposition,
                    remaining,
                    "Keeping run"
                );
                report.kept.push(candidate.run_id);
                continue;
            }

            let size = match directory_size(&self.paths.run_dir(&candidate.run_id)) {
                Ok(size) => size,
                Err(e) => {
                    report.fail(&candidate.run_id, e);
                    continue;
                }
            };

            let outcome = match disposition {
                Disposition::Archive if dry_run => Ok(0),
                Disposition::Archive => self
                    .archive_unchecked(&candidate.run_id)
                    .map(|bundle| bundle.bundle_bytes),
                _ if dry_run => Ok(0),
                _ => self.remove_run_dir(&candidate.run_id).map(|()| 0),
            };

            match outcome {
                Ok(written) => {
                    remaining -= 1;
                    if disposition == Disposition::Archive {
                        report.space_saved += size / 2;
                        report.archive_bytes_written += written;
                        report.archived.push(candidate.run_id);
                    } else {
                        report.space_saved += size;
                        debug!(
                            target: "runvault::lifecycle",
                            run_id = %candidate.run_id,
                            dry_run,
                            "Deleted run"
                        );
                        report.deleted.push(candidate.run_id);
                    }
                }
                Err(e) => report.fail(&candidate.run_id, e),
            }
        }

        info!(
            target: "runvault::lifecycle",
            dry_run,
            archived = report.archived.len(),
            deleted = report.deleted.len(),
            kept = report.kept.len(),
            errors = report.errors.len(),
            space_saved = report.space_saved,
            "Cleanup pass complete"
        );
        Ok(report)
    }

    /// Read the status and effective end time of a run
    fn inspect(&self, run_id: &str) -> Result<Candidate> {
        let view = read_retention_view(&self.paths, run_id)?;
        let ended_at = match view.ended_at.or(view.started_at) {
            Some(t) => t,
            None => metadata_modified(&self.paths, run_id)?,
        };
        Ok(Candidate {
            run_id: run_id.to_string(),
            status: view.status,
            ended_at,
        })
    }
}
