//! Disk usage accounting for both tiers

use super::{DiskUsage, LifecycleManager};
use runvault_core::Result;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Total size of the regular files under `path`
pub fn directory_size(path: &Path) -> io::Result<u64> {
    let mut total = 0u64;
    for entry in WalkDir::new(path) {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_file() {
            total += entry.metadata().map_err(io::Error::from)?.len();
        }
    }
    Ok(total)
}

impl LifecycleManager {
    /// Counts and byte totals of run directories and archives
    ///
    /// Entries that disappear or cannot be measured mid-scan are skipped.
    /// `total_size` is always the sum of the two tiers.
    pub fn disk_usage(&self) -> Result<DiskUsage> {
        let mut usage = DiskUsage::default();

        for run_id in self.run_ids()? {
            match directory_size(&self.paths.run_dir(&run_id)) {
                Ok(size) => {
                    usage.run_count += 1;
                    usage.active_size += size;
                }
                Err(e) => tracing::debug!(
                    target: "runvault::lifecycle",
                    run_id = %run_id,
                    error = %e,
                    "Skipping run in disk usage"
                ),
            }
        }

        for (_, path) in self.archive_entries()? {
            if let Ok(meta) = path.metadata() {
                usage.archive_count += 1;
                usage.archive_size += meta.len();
            }
        }

        usage.total_size = usage.active_size + usage.archive_size;
        Ok(usage)
    }
}
