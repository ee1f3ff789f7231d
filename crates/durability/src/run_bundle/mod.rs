//! RunBundle — cold-storage archive format for finished runs
//!
//! A run directory is packed into a single gzip-compressed tar file:
//!
//! ```text
//! archive/<YYYY-MM>/<run_id>.tar.gz
//! └── <run_id>/
//!     ├── metadata.json
//!     ├── transcript.json[.gz]
//!     ├── artifacts/...
//!     └── files/...
//! ```
//!
//! ## Design Principles
//!
//! - Writes are atomic: a temp file is renamed into place
//! - Every entry lives under the `<run_id>/` folder
//! - Extraction rejects absolute paths, `..` components and link entries

mod error;
mod reader;
mod writer;

pub use error::{BundleError, BundleResult};
pub use reader::{ExtractInfo, RunBundleReader};
pub use writer::{temp_path_for, BundleInfo, RunBundleWriter};
