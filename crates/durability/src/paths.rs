//! Store directory structure
//!
//! A store is a portable directory containing all run state.
//! The directory structure is:
//!
//! ```text
//! <base>/
//! ├── runvault.toml                  # Optional configuration
//! ├── runs/
//! │   └── <run_id>/
//! │       ├── metadata.json
//! │       ├── transcript.json[.gz]
//! │       ├── artifacts/<name>[.gz]
//! │       └── files/<relative-path>
//! └── archive/
//!     └── <YYYY-MM>/<run_id>.tar.gz
//! ```
//!
//! Entries under `runs/` whose names start with `.` are staging areas used
//! while archiving or restoring and are never treated as runs.

use chrono::{DateTime, Utc};
use runvault_core::month_bucket_at;
use std::path::{Path, PathBuf};

/// Name of the runs directory
pub const RUNS_DIR: &str = "runs";
/// Name of the cold-storage directory
pub const ARCHIVE_DIR: &str = "archive";
/// Per-run metadata record
pub const METADATA_FILE: &str = "metadata.json";
/// Per-run transcript (uncompressed form)
pub const TRANSCRIPT_FILE: &str = "transcript.json";
/// Per-run artifact directory
pub const ARTIFACTS_DIR: &str = "artifacts";
/// Per-run preserved source files directory
pub const FILES_DIR: &str = "files";
/// Archive file extension
pub const ARCHIVE_EXTENSION: &str = ".tar.gz";
/// Compressed sibling suffix
pub const GZ_SUFFIX: &str = ".gz";
/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "runvault.toml";

/// Store directory paths
///
/// Provides access to all paths within a store's base directory.
#[derive(Debug, Clone)]
pub struct StorePaths {
    /// Root base directory
    root: PathBuf,
}

impl StorePaths {
    /// Create paths from root directory
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        StorePaths {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the root base directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the config file path
    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    /// Directory holding one sub-directory per run
    pub fn runs_dir(&self) -> PathBuf {
        self.root.join(RUNS_DIR)
    }

    /// Cold-storage directory
    pub fn archive_dir(&self) -> PathBuf {
        self.root.join(ARCHIVE_DIR)
    }

    /// Directory of a single run
    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.runs_dir().join(run_id)
    }

    /// Metadata record of a run
    pub fn metadata_file(&self, run_id: &str) -> PathBuf {
        self.run_dir(run_id).join(METADATA_FILE)
    }

    /// Transcript of a run (uncompressed form)
    pub fn transcript_file(&self, run_id: &str) -> PathBuf {
        self.run_dir(run_id).join(TRANSCRIPT_FILE)
    }

    /// Artifact directory of a run
    pub fn artifacts_dir(&self, run_id: &str) -> PathBuf {
        self.run_dir(run_id).join(ARTIFACTS_DIR)
    }

    /// Preserved files directory of a run
    pub fn files_dir(&self, run_id: &str) -> PathBuf {
        self.run_dir(run_id).join(FILES_DIR)
    }

    /// Month bucket directory an archive for `run_id` is filed under
    pub fn archive_bucket_dir(&self, run_id: &str) -> PathBuf {
        self.archive_bucket_dir_at(run_id, Utc::now())
    }

    /// Month bucket directory for `run_id`, dating short ids at `now`
    pub fn archive_bucket_dir_at(&self, run_id: &str, now: DateTime<Utc>) -> PathBuf {
        self.archive_dir().join(month_bucket_at(run_id, now))
    }

    /// Expected archive path for `run_id`
    pub fn archive_file(&self, run_id: &str) -> PathBuf {
        self.archive_file_at(run_id, Utc::now())
    }

    /// Expected archive path for `run_id`, dating short ids at `now`
    pub fn archive_file_at(&self, run_id: &str, now: DateTime<Utc>) -> PathBuf {
        self.archive_bucket_dir_at(run_id, now)
            .join(format!("{}{}", run_id, ARCHIVE_EXTENSION))
    }

    /// Create the top-level directories
    pub fn create_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.runs_dir())?;
        std::fs::create_dir_all(self.archive_dir())?;
        Ok(())
    }
}

/// Path of the compressed sibling of `path`
pub fn gz_sibling(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(GZ_SUFFIX);
    PathBuf::from(name)
}

/// True for staging entries that scans must skip
pub fn is_hidden_entry(name: &str) -> bool {
    name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let paths = StorePaths::from_root("/data");
        assert_eq!(paths.runs_dir(), PathBuf::from("/data/runs"));
        assert_eq!(paths.archive_dir(), PathBuf::from("/data/archive"));
        assert_eq!(
            paths.metadata_file("r1"),
            PathBuf::from("/data/runs/r1/metadata.json")
        );
        assert_eq!(
            paths.transcript_file("r1"),
            PathBuf::from("/data/runs/r1/transcript.json")
        );
        assert_eq!(
            paths.artifacts_dir("r1"),
            PathBuf::from("/data/runs/r1/artifacts")
        );
        assert_eq!(paths.files_dir("r1"), PathBuf::from("/data/runs/r1/files"));
        assert_eq!(paths.config_file(), PathBuf::from("/data/runvault.toml"));
    }

    #[test]
    fn test_archive_file_bucketed_by_month() {
        let paths = StorePaths::from_root("/data");
        assert_eq!(
            paths.archive_file("2026-04-02-flow-abc"),
            PathBuf::from("/data/archive/2026-04/2026-04-02-flow-abc.tar.gz")
        );
    }

    #[test]
    fn test_short_id_bucketed_at_given_time() {
        use chrono::TimeZone;

        let paths = StorePaths::from_root("/data");
        let now = Utc.with_ymd_and_hms(2024, 11, 30, 23, 0, 0).unwrap();
        assert_eq!(
            paths.archive_file_at("r1", now),
            PathBuf::from("/data/archive/2024-11/r1.tar.gz")
        );
        // Dated ids ignore the clock
        assert_eq!(
            paths.archive_bucket_dir_at("2026-04-02-flow-abc", now),
            PathBuf::from("/data/archive/2026-04")
        );
    }

    #[test]
    fn test_gz_sibling() {
        assert_eq!(
            gz_sibling(Path::new("/a/transcript.json")),
            PathBuf::from("/a/transcript.json.gz")
        );
    }

    #[test]
    fn test_create_directories() {
        let dir = tempfile::tempdir().unwrap();
        let paths = StorePaths::from_root(dir.path().join("store"));
        paths.create_directories().unwrap();
        assert!(paths.runs_dir().is_dir());
        assert!(paths.archive_dir().is_dir());
    }

    #[test]
    fn test_hidden_entries() {
        assert!(is_hidden_entry(".restore-r1"));
        assert!(!is_hidden_entry("r1"));
    }
}
