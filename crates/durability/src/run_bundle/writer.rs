//! RunBundle archive writer
//!
//! Creates `<run_id>.tar.gz` archives of a whole run directory. Every entry
//! is stored under a top-level folder named after the run id, with the
//! source file's permission bits and modification time.

use crate::run_bundle::error::{BundleError, BundleResult};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tar::Builder;
use tracing::debug;
use walkdir::WalkDir;

/// Information about a written bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleInfo {
    /// Final archive path
    pub path: PathBuf,
    /// Number of regular files bundled
    pub file_count: u64,
    /// Sum of the bundled files' sizes
    pub original_bytes: u64,
    /// Size of the compressed archive
    pub bundle_bytes: u64,
}

/// Writer for RunBundle archives
///
/// Creates `.tar.gz` files with atomic write semantics.
#[derive(Debug, Clone)]
pub struct RunBundleWriter {
    compression: Compression,
}

impl Default for RunBundleWriter {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl RunBundleWriter {
    /// Create a writer with an explicit gzip level (0-9)
    pub fn new(level: u32) -> Self {
        Self {
            compression: Compression::new(level.min(9)),
        }
    }

    /// Create a new writer with default options
    pub fn with_defaults() -> Self {
        Self {
            compression: Compression::default(),
        }
    }

    /// Bundle `run_dir` into `path`, rooted under a folder named `run_id`
    ///
    /// This is an atomic operation - either the complete archive is written
    /// or no file is left behind.
    pub fn write(&self, run_dir: &Path, run_id: &str, path: &Path) -> BundleResult<BundleInfo> {
        if !run_dir.is_dir() {
            return Err(BundleError::InvalidSource(format!(
                "{} is not a directory",
                run_dir.display()
            )));
        }

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = temp_path_for(path);

        // Try to write, clean up on failure
        let result = self
            .write_inner(run_dir, run_id, &temp_path)
            .and_then(|info| {
                fs::rename(&temp_path, path)?;
                Ok(info)
            });

        match result {
            Ok(info) => Ok(BundleInfo {
                path: path.to_path_buf(),
                ..info
            }),
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                Err(e)
            }
        }
    }

    fn write_inner(&self, run_dir: &Path, run_id: &str, temp_path: &Path) -> BundleResult<BundleInfo> {
        let file = File::create(temp_path)?;
        let encoder = GzEncoder::new(BufWriter::new(file), self.compression);
        let mut builder = Builder::new(encoder);
        builder.follow_symlinks(false);

        let mut file_count = 0u64;
        let mut original_bytes = 0u64;

        for entry in WalkDir::new(run_dir).sort_by_file_name() {
            let entry = entry.map_err(|e| BundleError::Io(e.into()))?;
            let relative = entry
                .path()
                .strip_prefix(run_dir)
                .map_err(|e| BundleError::archive(e.to_string()))?;
            let name = if relative.as_os_str().is_empty() {
                PathBuf::from(run_id)
            } else {
                Path::new(run_id).join(relative)
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                builder
                    .append_dir(&name, entry.path())
                    .map_err(|e| BundleError::archive(format!("append dir '{}': {}", name.display(), e)))?;
            } else if file_type.is_file() {
                builder
                    .append_path_with_name(entry.path(), &name)
                    .map_err(|e| BundleError::archive(format!("append '{}': {}", name.display(), e)))?;
                file_count += 1;
                original_bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
            } else {
                debug!(
                    target: "runvault::lifecycle",
                    path = %entry.path().display(),
                    "Skipping non-regular entry while bundling"
                );
            }
        }

        // Finish tar archive, then the gzip stream, then flush to disk
        let encoder = builder
            .into_inner()
            .map_err(|e| BundleError::archive(format!("tar finish: {}", e)))?;
        let mut buf_writer = encoder.finish()?;
        buf_writer.flush()?;
        let file = buf_writer
            .into_inner()
            .map_err(|e| BundleError::Io(e.into_error()))?;
        file.sync_all()?;
        let bundle_bytes = file.metadata()?.len();

        Ok(BundleInfo {
            path: temp_path.to_path_buf(),
            file_count,
            original_bytes,
            bundle_bytes,
        })
    }
}

/// Temporary sibling used while an archive is being written
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}
