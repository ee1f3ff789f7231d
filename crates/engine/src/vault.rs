//! Vault: one handle per base directory
//!
//! Wires the Artifact Manager, Transcript Store and Lifecycle Manager
//! around a shared directory layout and configuration. A `Vault` is `Send +
//! Sync`; share it between threads behind an `Arc`.

use crate::config::VaultConfig;
use crate::observer::RunObserver;
use crate::transcript::TranscriptStore;
use runvault_core::Result;
use runvault_durability::{ArtifactManager, Clock, LifecycleManager, StorePaths};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Run artifact, transcript and retention store rooted at one directory
#[derive(Debug)]
pub struct Vault {
    paths: StorePaths,
    config: VaultConfig,
    artifacts: ArtifactManager,
    transcripts: TranscriptStore,
    lifecycle: LifecycleManager,
}

impl Vault {
    /// Open the store at `base` using `<base>/runvault.toml` (or defaults)
    pub fn open(base: impl AsRef<Path>) -> Result<Self> {
        let config = VaultConfig::load(base.as_ref())?;
        Self::open_with_config(base, config)
    }

    /// Open the store at `base` with an explicit configuration
    ///
    /// Creates `runs/` and `archive/` if missing.
    pub fn open_with_config(base: impl AsRef<Path>, config: VaultConfig) -> Result<Self> {
        config.validate()?;
        let paths = StorePaths::from_root(base);
        paths.create_directories()?;
        debug!(
            target: "runvault::lifecycle",
            root = %paths.root().display(),
            "Opened store"
        );

        Ok(Vault {
            artifacts: ArtifactManager::with_threshold(
                paths.clone(),
                config.storage.artifact_compress_above,
            ),
            transcripts: TranscriptStore::with_threshold(
                paths.clone(),
                config.storage.transcript_compress_above,
            ),
            lifecycle: LifecycleManager::new(paths.clone(), config.retention.clone()),
            paths,
            config,
        })
    }

    /// Replace the lifecycle clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.lifecycle =
            LifecycleManager::with_clock(self.paths.clone(), self.config.retention.clone(), clock);
        self
    }

    /// Register a run-ended observer
    pub fn add_observer(&self, observer: Arc<dyn RunObserver>) {
        self.transcripts.add_observer(observer);
    }

    /// Directory layout
    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Effective configuration
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Artifact Manager
    pub fn artifacts(&self) -> &ArtifactManager {
        &self.artifacts
    }

    /// Transcript Store
    pub fn transcripts(&self) -> &TranscriptStore {
        &self.transcripts
    }

    /// Lifecycle Manager
    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }
}
