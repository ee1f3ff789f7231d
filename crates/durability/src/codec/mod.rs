//! Storage codec
//!
//! - `gzip`: the byte-level compression codec
//! - `blob`: size-triggered compressed files with at most one physical form

pub mod blob;
pub mod gzip;

pub use blob::{
    is_temp_file, locate_blob, read_blob, remove_blob, write_atomic, write_blob, StoredForm,
    TEMP_SUFFIX,
};
