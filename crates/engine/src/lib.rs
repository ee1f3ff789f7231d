//! Engine layer for runvault
//!
//! - Transcript Store: concurrent active-run table, persistence, listing
//! - Transcript search over external line-search tools
//! - Run-ended observer hook
//! - `runvault.toml` configuration
//! - `Vault`, the handle that ties the components to one base directory

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod observer;
pub mod search;
pub mod transcript;
pub mod vault;

pub use config::{StorageConfig, VaultConfig, CONFIG_FILE_NAME, DEFAULT_TRANSCRIPT_COMPRESS_ABOVE};
pub use observer::RunObserver;
pub use search::{GrepBackend, RipgrepBackend, SearchBackend, SearchHit, SearchQuery};
pub use transcript::{RunFilter, TranscriptStore};
pub use vault::Vault;
