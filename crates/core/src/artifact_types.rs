//! Artifact type inference
//!
//! The type of an artifact is advisory metadata derived from its file name
//! extension. It is never needed to load an artifact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of content an artifact holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    /// Markdown specification
    Specification,
    /// Unified diff or patch
    Diff,
    /// JSON document
    Json,
    /// Plain text or log
    Text,
    /// Source code
    Code,
    /// Image, document or archive
    Binary,
    /// No known extension
    Unknown,
}

impl ArtifactType {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::Specification => "specification",
            ArtifactType::Diff => "diff",
            ArtifactType::Json => "json",
            ArtifactType::Text => "text",
            ArtifactType::Code => "code",
            ArtifactType::Binary => "binary",
            ArtifactType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extension (lowercase, without dot) to type table
const EXTENSION_TYPES: &[(&str, ArtifactType)] = &[
    ("md", ArtifactType::Specification),
    ("markdown", ArtifactType::Specification),
    ("diff", ArtifactType::Diff),
    ("patch", ArtifactType::Diff),
    ("json", ArtifactType::Json),
    ("txt", ArtifactType::Text),
    ("log", ArtifactType::Text),
    // source
    ("rs", ArtifactType::Code),
    ("go", ArtifactType::Code),
    ("py", ArtifactType::Code),
    ("js", ArtifactType::Code),
    ("jsx", ArtifactType::Code),
    ("ts", ArtifactType::Code),
    ("tsx", ArtifactType::Code),
    ("java", ArtifactType::Code),
    ("kt", ArtifactType::Code),
    ("c", ArtifactType::Code),
    ("h", ArtifactType::Code),
    ("cc", ArtifactType::Code),
    ("cpp", ArtifactType::Code),
    ("hpp", ArtifactType::Code),
    ("cs", ArtifactType::Code),
    ("rb", ArtifactType::Code),
    ("php", ArtifactType::Code),
    ("swift", ArtifactType::Code),
    ("scala", ArtifactType::Code),
    ("sh", ArtifactType::Code),
    ("sql", ArtifactType::Code),
    ("html", ArtifactType::Code),
    ("css", ArtifactType::Code),
    ("yaml", ArtifactType::Code),
    ("yml", ArtifactType::Code),
    ("toml", ArtifactType::Code),
    // binary
    ("png", ArtifactType::Binary),
    ("jpg", ArtifactType::Binary),
    ("jpeg", ArtifactType::Binary),
    ("gif", ArtifactType::Binary),
    ("webp", ArtifactType::Binary),
    ("pdf", ArtifactType::Binary),
    ("docx", ArtifactType::Binary),
    ("xlsx", ArtifactType::Binary),
    ("zip", ArtifactType::Binary),
    ("gz", ArtifactType::Binary),
    ("tar", ArtifactType::Binary),
    ("bin", ArtifactType::Binary),
];

/// Infer an artifact's type from its name
///
/// Only the final path component's extension is considered, case-insensitively.
pub fn infer_artifact_type(name: &str) -> ArtifactType {
    let file_name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let ext = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => return ArtifactType::Unknown,
    };

    EXTENSION_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, t)| *t)
        .unwrap_or(ArtifactType::Unknown)
}

/// Listing entry for a stored artifact or file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactInfo {
    /// Logical name (compression suffix stripped, `/`-separated)
    pub name: String,
    /// Inferred type
    pub artifact_type: ArtifactType,
    /// Size on disk in bytes
    pub size: u64,
    /// Last modification time
    pub modified: DateTime<Utc>,
    /// Whether the artifact is stored gzip-compressed
    pub compressed: bool,
}
