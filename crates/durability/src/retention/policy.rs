//! Retention policy type and per-run classification

use chrono::Duration;
use runvault_core::RunStatus;
use serde::{Deserialize, Serialize};

/// What a lifecycle pass should do with one run, before min-runs accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Exempt: running, or failed with `keep_failed`
    Exempt,
    /// Younger than every threshold
    Keep,
    /// Old enough to move to cold storage
    Archive,
    /// Old enough to purge
    Delete,
}

impl Disposition {
    /// True for archive and delete
    pub fn is_removal(&self) -> bool {
        matches!(self, Disposition::Archive | Disposition::Delete)
    }
}

/// Retention thresholds and exemptions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    /// Delete finished runs at least this many days old
    pub retention_days: u32,
    /// Archive finished runs at least this many days old
    pub archive_after_days: u32,
    /// Purge archives at least this many days old
    pub archive_retention_days: u32,
    /// Never remove failed runs
    pub keep_failed: bool,
    /// Minimum number of runs that survive a pass
    pub keep_min_runs: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        RetentionPolicy {
            retention_days: 30,
            archive_after_days: 7,
            archive_retention_days: 90,
            keep_failed: true,
            keep_min_runs: 100,
        }
    }
}

impl RetentionPolicy {
    /// Set the deletion threshold
    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }

    /// Set the archival threshold
    pub fn with_archive_after_days(mut self, days: u32) -> Self {
        self.archive_after_days = days;
        self
    }

    /// Set the archive purge threshold
    pub fn with_archive_retention_days(mut self, days: u32) -> Self {
        self.archive_retention_days = days;
        self
    }

    /// Set whether failed runs are kept
    pub fn with_keep_failed(mut self, keep: bool) -> Self {
        self.keep_failed = keep;
        self
    }

    /// Set the minimum number of surviving runs
    pub fn with_keep_min_runs(mut self, n: usize) -> Self {
        self.keep_min_runs = n;
        self
    }

    /// Classify a run by status and age
    ///
    /// Deletion wins over archival when both thresholds are reached.
    pub fn classify(&self, status: RunStatus, age: Duration) -> Disposition {
        if status.is_running() || (status.is_failed() && self.keep_failed) {
            return Disposition::Exempt;
        }
        if age >= Duration::days(i64::from(self.retention_days)) {
            Disposition::Delete
        } else if age >= Duration::days(i64::from(self.archive_after_days)) {
            Disposition::Archive
        } else {
            Disposition::Keep
        }
    }

    /// True if an archive of this age should be purged
    pub fn archive_expired(&self, age: Duration) -> bool {
        age >= Duration::days(i64::from(self.archive_retention_days))
    }
}
