//! Content search over persisted transcripts
//!
//! Search shells out to an external line-search tool. Two backends exist:
//! ripgrep (preferred, also searches `transcript.json.gz` via
//! `--search-zip`) and grep (fallback, plain transcripts only). The backend
//! is chosen once by probing `PATH`; both normalize their output into
//! [`SearchHit`]s. A tool's "no matches" exit status means zero hits.

mod grep;
mod ripgrep;

pub use grep::GrepBackend;
pub use ripgrep::RipgrepBackend;

use runvault_core::{Error, Result};
use runvault_durability::paths::is_hidden_entry;
use serde::Serialize;
use std::path::Path;
use std::process::Output;
use std::sync::Arc;
use tracing::debug;

/// File name pattern of plain transcripts
const TRANSCRIPT_GLOB: &str = "transcript.json";
/// File name pattern of compressed transcripts
const TRANSCRIPT_GZ_GLOB: &str = "transcript.json.gz";

/// One matching line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    /// Run whose transcript matched
    pub run_id: String,
    /// 1-based line number, when the tool reports one
    pub line: Option<u64>,
    /// Matched line, trimmed
    pub text: String,
}

/// Search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Literal text to look for
    pub pattern: String,
    /// Match regardless of case
    pub ignore_case: bool,
    /// Cap on the number of hits
    pub limit: Option<usize>,
}

impl SearchQuery {
    /// Case-sensitive search for `pattern`
    pub fn new(pattern: impl Into<String>) -> Self {
        SearchQuery {
            pattern: pattern.into(),
            ignore_case: false,
            limit: None,
        }
    }

    /// Match regardless of case
    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    /// Cap the number of hits
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// An external line-search tool
pub trait SearchBackend: Send + Sync {
    /// Tool name for logs and diagnostics
    fn name(&self) -> &'static str;

    /// Search every transcript under `runs_dir`
    fn search(&self, runs_dir: &Path, query: &SearchQuery) -> Result<Vec<SearchHit>>;
}

/// Pick the best available backend: ripgrep, then grep
pub fn detect_backend() -> Option<Arc<dyn SearchBackend>> {
    if let Some(rg) = RipgrepBackend::locate() {
        debug!(target: "runvault::search", backend = "ripgrep", "Search backend selected");
        return Some(Arc::new(rg));
    }
    if let Some(grep) = GrepBackend::locate() {
        debug!(target: "runvault::search", backend = "grep", "Search backend selected");
        return Some(Arc::new(grep));
    }
    None
}

/// Turn a finished tool invocation into hits
///
/// Exit status 0 means matches, 1 means no matches, anything else is a
/// failure.
fn collect_hits(
    tool: &str,
    runs_dir: &Path,
    output: Output,
    limit: Option<usize>,
) -> Result<Vec<SearchHit>> {
    match output.status.code() {
        Some(0) => {}
        Some(1) => return Ok(Vec::new()),
        _ => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::SearchFailed(format!(
                "{} exited with {}: {}",
                tool,
                output.status,
                stderr.trim()
            )));
        }
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut hits: Vec<SearchHit> = stdout
        .lines()
        .filter_map(|line| parse_hit(runs_dir, line))
        .collect();
    hits.sort_by(|a, b| a.run_id.cmp(&b.run_id).then_with(|| a.line.cmp(&b.line)));
    if let Some(limit) = limit {
        hits.truncate(limit);
    }
    Ok(hits)
}

/// Parse one `path:line:text` record
fn parse_hit(runs_dir: &Path, line: &str) -> Option<SearchHit> {
    let root = runs_dir.to_string_lossy();
    let rest = line.strip_prefix(root.as_ref())?;
    let rest = rest.trim_start_matches(|c| c == '/' || c == '\\');

    let (run_id, after_run) = rest.split_once(|c| c == '/' || c == '\\')?;
    if run_id.is_empty() || is_hidden_entry(run_id) {
        return None;
    }
    let (_file, after_file) = after_run.split_once(':')?;
    let (line_no, text) = match after_file.split_once(':') {
        Some((n, text)) => match n.parse::<u64>() {
            Ok(n) => (Some(n), text),
            Err(_) => (None, after_file),
        },
        None => (None, after_file),
    };

    Some(SearchHit {
        run_id: run_id.to_string(),
        line: line_no,
        text: text.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_hit() {
        let dir = PathBuf::from("/base/runs");
        let hit = parse_hit(&dir, "/base/runs/r1/transcript.json:12:    \"content\": \"hi\",").unwrap();
        assert_eq!(hit.run_id, "r1");
        assert_eq!(hit.line, Some(12));
        assert_eq!(hit.text, "\"content\": \"hi\",");
    }

    #[test]
    fn test_parse_hit_without_line_number() {
        let dir = PathBuf::from("/base/runs");
        let hit = parse_hit(&dir, "/base/runs/r1/transcript.json:no number here").unwrap();
        assert_eq!(hit.line, None);
        assert_eq!(hit.text, "no number here");
    }

    #[test]
    fn test_parse_hit_rejects_foreign_and_hidden() {
        let dir = PathBuf::from("/base/runs");
        assert!(parse_hit(&dir, "/elsewhere/r1/transcript.json:1:x").is_none());
        assert!(parse_hit(&dir, "/base/runs/.restore-r1-abc/transcript.json:1:x").is_none());
    }

    #[test]
    fn test_query_builder() {
        let q = SearchQuery::new("needle").ignore_case().with_limit(3);
        assert_eq!(q.pattern, "needle");
        assert!(q.ignore_case);
        assert_eq!(q.limit, Some(3));
    }
}
