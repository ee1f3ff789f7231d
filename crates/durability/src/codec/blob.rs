//! Size-triggered compressed blob files
//!
//! A logical blob at `path` is stored either verbatim at `path` or
//! gzip-compressed at `path.gz`, chosen by payload size. After every write
//! exactly one of the two forms exists. Readers try the compressed form
//! first and fall back to the plain one.

use super::gzip;
use crate::paths::gz_sibling;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Suffix of in-flight temporary files (skipped by listings)
pub const TEMP_SUFFIX: &str = ".rvtmp";

/// Physical form a blob was stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredForm {
    /// Stored verbatim
    Plain,
    /// Stored gzip-compressed with a `.gz` suffix
    Gzip,
}

impl StoredForm {
    /// Whether this is the compressed form
    pub fn is_compressed(&self) -> bool {
        matches!(self, StoredForm::Gzip)
    }
}

/// True for temporary files left by an interrupted write
pub fn is_temp_file(name: &str) -> bool {
    name.ends_with(TEMP_SUFFIX)
}

/// Write `data` to `path` via a temporary sibling and rename
///
/// Either the complete content is visible at `path` or the previous
/// content is left untouched.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let mut temp_name = file_name.to_os_string();
    temp_name.push(format!(".{}{}", uuid::Uuid::new_v4().simple(), TEMP_SUFFIX));
    let temp_path = path.with_file_name(temp_name);

    let result = (|| {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

/// Store `data` at `path`, compressing when larger than `compress_above`
///
/// Parent directories are created as needed. A stale sibling in the other
/// form is removed after the new content is in place.
pub fn write_blob(path: &Path, data: &[u8], compress_above: usize) -> io::Result<StoredForm> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let gz_path = gz_sibling(path);
    let (form, target, stale) = if data.len() > compress_above {
        (StoredForm::Gzip, gz_path.as_path(), path)
    } else {
        (StoredForm::Plain, path, gz_path.as_path())
    };

    match form {
        StoredForm::Gzip => write_atomic(target, &gzip::compress(data)?)?,
        StoredForm::Plain => write_atomic(target, data)?,
    }
    remove_if_exists(stale)?;
    Ok(form)
}

/// Find the physical file backing `path`, compressed form first
pub fn locate_blob(path: &Path) -> Option<(PathBuf, StoredForm)> {
    let gz_path = gz_sibling(path);
    if gz_path.is_file() {
        return Some((gz_path, StoredForm::Gzip));
    }
    if path.is_file() {
        return Some((path.to_path_buf(), StoredForm::Plain));
    }
    None
}

/// Read and, if needed, decompress the blob at `path`
///
/// Returns `Ok(None)` when neither form exists.
pub fn read_blob(path: &Path) -> io::Result<Option<Vec<u8>>> {
    let Some((physical, form)) = locate_blob(path) else {
        return Ok(None);
    };
    let raw = match fs::read(&physical) {
        Ok(raw) => raw,
        // Raced with a concurrent delete
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    match form {
        StoredForm::Gzip => gzip::decompress(&raw).map(Some),
        StoredForm::Plain => Ok(Some(raw)),
    }
}

/// Remove both forms of the blob at `path`
///
/// Returns whether anything was removed.
pub fn remove_blob(path: &Path) -> io::Result<bool> {
    let removed_gz = remove_if_exists(&gz_sibling(path))?;
    let removed_plain = remove_if_exists(path)?;
    Ok(removed_gz || removed_plain)
}

fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
