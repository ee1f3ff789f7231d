//! Store configuration via `runvault.toml`
//!
//! The file lives in the base directory. A missing file means defaults;
//! `runvault init` writes a commented default. Edit the file and reopen the
//! store to change settings.

use runvault_core::{Error, Result};
use runvault_durability::{RetentionPolicy, DEFAULT_ARTIFACT_COMPRESS_ABOVE};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use runvault_durability::paths::CONFIG_FILE_NAME;

/// Default transcript compression threshold (100 KiB)
pub const DEFAULT_TRANSCRIPT_COMPRESS_ABOVE: usize = 100 * 1024;

/// Size thresholds above which payloads are gzip-compressed on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Artifacts and preserved files larger than this are compressed
    pub artifact_compress_above: usize,
    /// Serialized transcripts larger than this are compressed
    pub transcript_compress_above: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            artifact_compress_above: DEFAULT_ARTIFACT_COMPRESS_ABOVE,
            transcript_compress_above: DEFAULT_TRANSCRIPT_COMPRESS_ABOVE,
        }
    }
}

/// Store configuration loaded from `runvault.toml`
///
/// # Example
///
/// ```toml
/// [retention]
/// retention_days = 30
/// archive_after_days = 7
///
/// [storage]
/// artifact_compress_above = 10240
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Lifecycle thresholds
    pub retention: RetentionPolicy,
    /// Compression thresholds
    pub storage: StorageConfig,
}

impl VaultConfig {
    /// Set the retention policy
    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    /// Set the storage thresholds
    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }

    /// Reject settings the store cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.storage.artifact_compress_above == 0 {
            return Err(Error::config("storage.artifact_compress_above must be > 0"));
        }
        if self.storage.transcript_compress_above == 0 {
            return Err(Error::config("storage.transcript_compress_above must be > 0"));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# runvault store configuration

[retention]
# Delete finished runs at least this many days old
retention_days = 30
# Move finished runs to archive/ at least this many days old
archive_after_days = 7
# Purge archives at least this many days old
archive_retention_days = 90
# Never remove failed runs
keep_failed = true
# Always keep at least this many runs
keep_min_runs = 100

[storage]
# Artifacts larger than this (bytes) are stored as <name>.gz
artifact_compress_above = 10240
# Transcripts larger than this (bytes) are stored as transcript.json.gz
transcript_compress_above = 102400
"#
    }

    /// Load `<base>/runvault.toml`, or defaults if the file does not exist
    pub fn load(base: &Path) -> Result<Self> {
        let path = base.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Read and parse config from a file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: VaultConfig = toml::from_str(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `true` if the file was created.
    pub fn write_default_if_missing(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        std::fs::write(path, Self::default_toml()).map_err(|e| {
            Error::config(format!(
                "Failed to write default config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Ok(true)
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_toml_matches_defaults() {
        let config: VaultConfig = toml::from_str(VaultConfig::default_toml()).unwrap();
        assert_eq!(config, VaultConfig::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config: VaultConfig = toml::from_str("[retention]\nkeep_min_runs = 3\n").unwrap();
        assert_eq!(config.retention.keep_min_runs, 3);
        assert_eq!(config.retention.retention_days, 30);
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn missing_file_means_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(VaultConfig::load(dir.path()).unwrap(), VaultConfig::default());
    }

    #[test]
    fn write_default_creates_file_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        assert!(VaultConfig::write_default_if_missing(&path).unwrap());
        std::fs::write(&path, "[retention]\nretention_days = 5\n").unwrap();
        assert!(!VaultConfig::write_default_if_missing(&path).unwrap());

        let config = VaultConfig::from_file(&path).unwrap();
        assert_eq!(config.retention.retention_days, 5);
    }

    #[test]
    fn write_to_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = VaultConfig::default()
            .with_retention(RetentionPolicy::default().with_keep_failed(false))
            .with_storage(StorageConfig {
                artifact_compress_above: 1,
                transcript_compress_above: 2,
            });

        config.write_to_file(&path).unwrap();
        assert_eq!(VaultConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn zero_threshold_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[storage]\nartifact_compress_above = 0\n").unwrap();
        assert!(matches!(VaultConfig::from_file(&path), Err(Error::Config(_))));
    }

    #[test]
    fn garbage_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "retention = [").unwrap();
        assert!(matches!(VaultConfig::from_file(&path), Err(Error::Config(_))));
    }
}
