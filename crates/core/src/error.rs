//! Error types for runvault
//!
//! This module defines the error taxonomy shared by every component.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::io;
use thiserror::Error;

/// Result type alias for runvault operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the run artifact and retention store
#[derive(Debug, Error)]
pub enum Error {
    /// A run, artifact, file or archive does not exist
    #[error("{kind} not found: {id}")]
    NotFound {
        /// What was looked up ("run", "artifact", "archive", ...)
        kind: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Duplicate start, or restore target collision
    #[error("{kind} already exists: {id}")]
    AlreadyExists {
        /// What collided ("run", "run directory", ...)
        kind: &'static str,
        /// Identifier that collided
        id: String,
    },

    /// Operation requires an active run but the run is not being tracked
    #[error("Run not started: {0}")]
    NotStarted(String),

    /// Operation attempted against a run in the wrong lifecycle state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Run id or artifact name that cannot be mapped onto the directory layout
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// I/O error (file operations, compression streams)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Path traversal or corrupt tar/gzip stream detected during restore
    #[error("Invalid archive: {0}")]
    InvalidArchive(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be read, parsed or validated
    #[error("Config error: {0}")]
    Config(String),

    /// No external line-search tool is installed
    #[error("Search unavailable: {0}")]
    SearchUnavailable(String),

    /// The external search tool failed
    #[error("Search failed: {0}")]
    SearchFailed(String),
}

impl Error {
    /// Run directory or in-memory run is absent
    pub fn run_not_found(run_id: impl Into<String>) -> Self {
        Error::NotFound {
            kind: "run",
            id: run_id.into(),
        }
    }

    /// Artifact (or preserved file) is absent
    pub fn artifact_not_found(name: impl Into<String>) -> Self {
        Error::NotFound {
            kind: "artifact",
            id: name.into(),
        }
    }

    /// Archive bundle is absent
    pub fn archive_not_found(run_id: impl Into<String>) -> Self {
        Error::NotFound {
            kind: "archive",
            id: run_id.into(),
        }
    }

    /// Persisted transcript is absent
    pub fn transcript_not_found(run_id: impl Into<String>) -> Self {
        Error::NotFound {
            kind: "transcript",
            id: run_id.into(),
        }
    }

    /// Run is already tracked or already has a directory
    pub fn run_exists(run_id: impl Into<String>) -> Self {
        Error::AlreadyExists {
            kind: "run",
            id: run_id.into(),
        }
    }

    /// An archive for the run is already filed
    pub fn archive_exists(run_id: impl Into<String>) -> Self {
        Error::AlreadyExists {
            kind: "archive",
            id: run_id.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Error::InvalidState(msg.into())
    }

    /// Create an invalid name error
    pub fn invalid_name(msg: impl Into<String>) -> Self {
        Error::InvalidName(msg.into())
    }

    /// Create an invalid archive error
    pub fn invalid_archive(msg: impl Into<String>) -> Self {
        Error::InvalidArchive(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// True for every `NotFound` variant
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// True for every `AlreadyExists` variant
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Error::AlreadyExists { .. })
    }

    /// True when the run was not in the active-run table
    pub fn is_not_started(&self) -> bool {
        matches!(self, Error::NotStarted(_))
    }

    /// True for archive validation failures
    pub fn is_invalid_archive(&self) -> bool {
        matches!(self, Error::InvalidArchive(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
