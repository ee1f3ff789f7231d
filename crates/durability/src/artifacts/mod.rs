//! Artifact Manager
//!
//! Durable key→blob storage scoped by run. Blobs larger than the
//! compression threshold are stored gzip-compressed with a `.gz` suffix;
//! loading is transparent to the form. Two areas exist per run:
//!
//! - `artifacts/`: named outputs (specifications, diffs, reports)
//! - `files/`: generated source files preserved with their relative paths
//!
//! Names are relative sub-paths. Absolute paths, `..` components and names
//! ending in `.gz` are rejected before touching disk.

mod typed;

pub use typed::names;

use crate::codec::{self, is_temp_file, StoredForm};
use crate::paths::{StorePaths, GZ_SUFFIX};
use chrono::{DateTime, Utc};
use runvault_core::{infer_artifact_type, validate_run_id, ArtifactInfo, Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Default compression threshold for artifacts (10 KiB)
pub const DEFAULT_ARTIFACT_COMPRESS_ABOVE: usize = 10 * 1024;

/// Which per-run directory a blob lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Area {
    Artifacts,
    Files,
}

/// Per-run named blob storage with transparent compression
#[derive(Debug, Clone)]
pub struct ArtifactManager {
    paths: StorePaths,
    compress_above: usize,
}

impl ArtifactManager {
    /// Create a manager with the default compression threshold
    pub fn new(paths: StorePaths) -> Self {
        Self::with_threshold(paths, DEFAULT_ARTIFACT_COMPRESS_ABOVE)
    }

    /// Create a manager compressing payloads larger than `compress_above` bytes
    pub fn with_threshold(paths: StorePaths, compress_above: usize) -> Self {
        ArtifactManager {
            paths,
            compress_above,
        }
    }

    /// Store paths this manager writes under
    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Compression threshold in bytes
    pub fn compress_above(&self) -> usize {
        self.compress_above
    }

    /// Create the run directory and its artifact sub-directory
    ///
    /// Idempotent: repeated calls are no-ops.
    pub fn ensure_run_dir(&self, run_id: &str) -> Result<()> {
        validate_run_id(run_id)?;
        fs::create_dir_all(self.paths.artifacts_dir(run_id))?;
        Ok(())
    }

    // ========================================================================
    // Artifacts
    // ========================================================================

    /// Save an artifact, replacing any previous content under `name`
    pub fn save_artifact(&self, run_id: &str, name: &str, data: &[u8]) -> Result<()> {
        self.save(Area::Artifacts, run_id, name, data)
    }

    /// Load an artifact, decompressing if needed
    pub fn load_artifact(&self, run_id: &str, name: &str) -> Result<Vec<u8>> {
        self.load(Area::Artifacts, run_id, name)
    }

    /// All artifacts of a run, sorted by name
    pub fn list_artifacts(&self, run_id: &str) -> Result<Vec<ArtifactInfo>> {
        self.list(Area::Artifacts, run_id)
    }

    /// Whether an artifact exists in either form
    pub fn has_artifact(&self, run_id: &str, name: &str) -> Result<bool> {
        let path = self.resolve(Area::Artifacts, run_id, name)?;
        Ok(codec::locate_blob(&path).is_some())
    }

    /// Remove an artifact in whichever form it is stored
    pub fn delete_artifact(&self, run_id: &str, name: &str) -> Result<()> {
        self.delete(Area::Artifacts, run_id, name)
    }

    /// Name, size and modification time of an artifact
    pub fn artifact_info(&self, run_id: &str, name: &str) -> Result<ArtifactInfo> {
        self.info(Area::Artifacts, run_id, name)
    }

    // ========================================================================
    // Preserved files
    // ========================================================================

    /// Preserve a generated file at `relative_path`
    pub fn save_file(&self, run_id: &str, relative_path: &str, data: &[u8]) -> Result<()> {
        self.save(Area::Files, run_id, relative_path, data)
    }

    /// Load a preserved file
    pub fn load_file(&self, run_id: &str, relative_path: &str) -> Result<Vec<u8>> {
        self.load(Area::Files, run_id, relative_path)
    }

    /// All preserved files of a run, sorted by relative path
    pub fn list_files(&self, run_id: &str) -> Result<Vec<ArtifactInfo>> {
        self.list(Area::Files, run_id)
    }

    // ========================================================================
    // Shared implementation
    // ========================================================================

    fn area_dir(&self, area: Area, run_id: &str) -> PathBuf {
        match area {
            Area::Artifacts => self.paths.artifacts_dir(run_id),
            Area::Files => self.paths.files_dir(run_id),
        }
    }

    fn resolve(&self, area: Area, run_id: &str, name: &str) -> Result<PathBuf> {
        validate_run_id(run_id)?;
        let relative = validate_blob_name(name)?;
        Ok(self.area_dir(area, run_id).join(relative))
    }

    fn save(&self, area: Area, run_id: &str, name: &str, data: &[u8]) -> Result<()> {
        let path = self.resolve(area, run_id, name)?;
        self.ensure_run_dir(run_id)?;
        let form = codec::write_blob(&path, data, self.compress_above)?;
        debug!(
            target: "runvault::artifacts",
            run_id,
            name,
            bytes = data.len(),
            compressed = form.is_compressed(),
            "Saved blob"
        );
        Ok(())
    }

    fn load(&self, area: Area, run_id: &str, name: &str) -> Result<Vec<u8>> {
        let path = self.resolve(area, run_id, name)?;
        codec::read_blob(&path)?.ok_or_else(|| Error::artifact_not_found(name))
    }

    fn delete(&self, area: Area, run_id: &str, name: &str) -> Result<()> {
        let path = self.resolve(area, run_id, name)?;
        if !codec::remove_blob(&path)? {
            return Err(Error::artifact_not_found(name));
        }
        debug!(target: "runvault::artifacts", run_id, name, "Deleted blob");
        Ok(())
    }

    fn info(&self, area: Area, run_id: &str, name: &str) -> Result<ArtifactInfo> {
        let path = self.resolve(area, run_id, name)?;
        let (physical, form) =
            codec::locate_blob(&path).ok_or_else(|| Error::artifact_not_found(name))?;
        describe(name.to_string(), &physical, form)
    }

    fn list(&self, area: Area, run_id: &str) -> Result<Vec<ArtifactInfo>> {
        validate_run_id(run_id)?;
        let root = self.area_dir(area, run_id);
        if !root.is_dir() {
            return Ok(Vec::new());
        }

        // Keyed by logical name; the compressed form wins if both are
        // momentarily present during a form switch.
        let mut found: BTreeMap<String, (PathBuf, StoredForm)> = BTreeMap::new();
        for entry in WalkDir::new(&root).min_depth(1) {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy();
            if is_temp_file(&file_name) {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&root) else {
                continue;
            };
            let relative = to_slash_path(relative);
            let (logical, form) = match relative.strip_suffix(GZ_SUFFIX) {
                Some(stripped) => (stripped.to_string(), StoredForm::Gzip),
                None => (relative, StoredForm::Plain),
            };
            let replace = match found.get(&logical) {
                Some((_, existing)) => !existing.is_compressed() && form.is_compressed(),
                None => true,
            };
            if replace {
                found.insert(logical, (entry.into_path(), form));
            }
        }

        found
            .into_iter()
            .map(|(name, (physical, form))| describe(name, &physical, form))
            .collect()
    }
}

/// Check a caller-supplied blob name and return it as a relative path
fn validate_blob_name(name: &str) -> Result<PathBuf> {
    if name.is_empty() {
        return Err(Error::invalid_name("artifact name must not be empty"));
    }
    if name.ends_with(GZ_SUFFIX) {
        return Err(Error::invalid_name(format!(
            "artifact name '{}' must not end with '{}'",
            name, GZ_SUFFIX
        )));
    }
    if is_temp_file(name) {
        return Err(Error::invalid_name(format!(
            "artifact name '{}' uses a reserved suffix",
            name
        )));
    }

    let mut relative = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => {
                return Err(Error::invalid_name(format!(
                    "artifact name '{}' must be a relative path without '..'",
                    name
                )))
            }
        }
    }
    if relative.as_os_str().is_empty() {
        return Err(Error::invalid_name(format!(
            "artifact name '{}' has no file component",
            name
        )));
    }
    Ok(relative)
}

fn to_slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn describe(name: String, physical: &Path, form: StoredForm) -> Result<ArtifactInfo> {
    let meta = fs::metadata(physical)?;
    let modified: DateTime<Utc> = meta.modified()?.into();
    Ok(ArtifactInfo {
        artifact_type: infer_artifact_type(&name),
        name,
        size: meta.len(),
        modified,
        compressed: form.is_compressed(),
    })
}
