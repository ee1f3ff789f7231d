//! RunBundle archive reader
//!
//! Reads `.tar.gz` run bundles and extracts them with path validation:
//! every entry must live under `<run_id>/`, must not be absolute and must
//! not contain `..`. Only directories and regular files are accepted.

use crate::run_bundle::error::{BundleError, BundleResult};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};
use tar::{Archive, EntryType};

/// Summary of an extraction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractInfo {
    /// Regular files written
    pub files: u64,
    /// Bytes written
    pub bytes: u64,
}

/// Reader for RunBundle archives
pub struct RunBundleReader;

impl RunBundleReader {
    /// Extract the bundle at `path` into `dest`
    ///
    /// Entries are stripped of their `<run_id>/` prefix, so `dest` becomes the
    /// run directory. The caller owns `dest`; on error it may be partially
    /// populated and should be discarded.
    pub fn extract(path: &Path, run_id: &str, dest: &Path) -> BundleResult<ExtractInfo> {
        let file = File::open(path)?;
        Self::extract_from(BufReader::new(file), run_id, dest)
    }

    /// Extract from any reader producing a gzip-compressed tar stream
    pub fn extract_from<R: Read>(reader: R, run_id: &str, dest: &Path) -> BundleResult<ExtractInfo> {
        fs::create_dir_all(dest)?;
        let mut archive = Archive::new(GzDecoder::new(reader));
        let mut info = ExtractInfo::default();

        for entry in archive
            .entries()
            .map_err(|e| BundleError::archive(e.to_string()))?
        {
            let mut entry = entry.map_err(|e| BundleError::archive(e.to_string()))?;
            let raw_path = String::from_utf8_lossy(&entry.path_bytes()).to_string();
            let relative = entry_relative_path(&raw_path, run_id)?;
            let target = dest.join(&relative);
            if !target.starts_with(dest) {
                return Err(BundleError::unsafe_path(raw_path));
            }

            let header = entry.header();
            let entry_type = header.entry_type();
            let mode = header
                .mode()
                .map_err(|e| BundleError::archive(format!("mode of '{}': {}", raw_path, e)))?;

            match entry_type {
                EntryType::Directory => {
                    fs::create_dir_all(&target)?;
                }
                EntryType::Regular | EntryType::Continuous => {
                    if let Some(parent) = target.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    let mut out = File::create(&target)?;
                    let written = io::copy(&mut entry, &mut out)
                        .map_err(|e| BundleError::archive(format!("read '{}': {}", raw_path, e)))?;
                    drop(out);
                    set_permissions(&target, mode)?;
                    info.files += 1;
                    info.bytes += written;
                }
                other => {
                    return Err(BundleError::UnsupportedEntry {
                        path: raw_path,
                        kind: format!("{:?}", other),
                    });
                }
            }
        }

        Ok(info)
    }

    /// List entry paths without extracting
    pub fn list_entries(path: &Path) -> BundleResult<Vec<String>> {
        let file = File::open(path)?;
        let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));
        let mut names = Vec::new();
        for entry in archive
            .entries()
            .map_err(|e| BundleError::archive(e.to_string()))?
        {
            let entry = entry.map_err(|e| BundleError::archive(e.to_string()))?;
            names.push(String::from_utf8_lossy(&entry.path_bytes()).to_string());
        }
        Ok(names)
    }
}

/// Validate an entry path and return it relative to the run folder
fn entry_relative_path(raw: &str, run_id: &str) -> BundleResult<PathBuf> {
    let mut components = Path::new(raw).components();

    match components.next() {
        Some(Component::Normal(first)) if first == run_id => {}
        Some(Component::Normal(_)) => {
            return Err(BundleError::UnexpectedRoot {
                expected: run_id.to_string(),
                path: raw.to_string(),
            })
        }
        _ => return Err(BundleError::unsafe_path(raw)),
    }

    let mut relative = PathBuf::new();
    for component in components {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(BundleError::unsafe_path(raw))
            }
        }
    }
    Ok(relative)
}

#[cfg(unix)]
fn set_permissions(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
}

#[cfg(not(unix))]
fn set_permissions(path: &Path, mode: u32) -> io::Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_readonly(mode & 0o200 == 0);
    fs::set_permissions(path, perms)
}
