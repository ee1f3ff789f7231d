//! RunBundle error types

use runvault_core::Error;
use std::io;
use thiserror::Error as ThisError;

/// Errors that can occur during RunBundle operations
#[derive(Debug, ThisError)]
pub enum BundleError {
    /// Entry path is absolute or escapes the destination
    #[error("Unsafe entry path in bundle: {0}")]
    UnsafePath(String),

    /// Entry is not rooted under the expected run folder
    #[error("Bundle entry {path} is not under {expected}/")]
    UnexpectedRoot {
        /// Folder every entry must start with
        expected: String,
        /// Offending entry path
        path: String,
    },

    /// Entry type that is never written into bundles (links, devices, ...)
    #[error("Unsupported entry type {kind} for {path}")]
    UnsupportedEntry {
        /// Offending entry path
        path: String,
        /// Tar entry type
        kind: String,
    },

    /// Source directory cannot be bundled
    #[error("Invalid source: {0}")]
    InvalidSource(String),

    /// Corrupt tar or gzip stream
    #[error("Archive error: {0}")]
    Archive(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl BundleError {
    /// Create an archive error
    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive(msg.into())
    }

    /// Create an unsafe path error
    pub fn unsafe_path(path: impl Into<String>) -> Self {
        Self::UnsafePath(path.into())
    }
}

impl From<BundleError> for Error {
    fn from(e: BundleError) -> Self {
        match e {
            BundleError::Io(io) => Error::Io(io),
            BundleError::InvalidSource(msg) => Error::invalid_state(msg),
            other => Error::invalid_archive(other.to_string()),
        }
    }
}

/// Result type for RunBundle operations
pub type BundleResult<T> = Result<T, BundleError>;
