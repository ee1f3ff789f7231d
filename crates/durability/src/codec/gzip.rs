//! Gzip byte codec
//!
//! All compressed blobs (artifacts, preserved files, transcripts) and the
//! run bundle stream use gzip so any standard tool can inspect them.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, Read, Write};

/// Identifier of this codec in logs and reports
pub const CODEC_ID: &str = "gzip";

/// Gzip-compress `data` at the default level
pub fn compress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Decompress a complete gzip stream
///
/// A truncated or corrupt stream yields an `InvalidData`/`UnexpectedEof` error.
pub fn decompress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::with_capacity(data.len().saturating_mul(2));
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
