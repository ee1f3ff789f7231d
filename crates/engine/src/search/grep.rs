//! grep backend (fallback)
//!
//! grep cannot read gzip members, so compressed transcripts are not searched.

use super::{collect_hits, SearchBackend, SearchHit, SearchQuery, TRANSCRIPT_GLOB};
use runvault_core::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Searches with `grep -r`
#[derive(Debug, Clone)]
pub struct GrepBackend {
    program: PathBuf,
}

impl GrepBackend {
    /// Use the `grep` binary at `program`
    pub fn new(program: impl Into<PathBuf>) -> Self {
        GrepBackend {
            program: program.into(),
        }
    }

    /// Find `grep` on `PATH`
    pub fn locate() -> Option<Self> {
        which::which("grep").ok().map(Self::new)
    }
}

impl SearchBackend for GrepBackend {
    fn name(&self) -> &'static str {
        "grep"
    }

    fn search(&self, runs_dir: &Path, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-r", "-n", "-H", "-F"]);
        cmd.arg(format!("--include={}", TRANSCRIPT_GLOB));
        if query.ignore_case {
            cmd.arg("-i");
        }
        cmd.arg("-e").arg(&query.pattern).arg(runs_dir);

        debug!(target: "runvault::search", pattern = %query.pattern, "Running grep");
        let output = cmd
            .output()
            .map_err(|e| Error::SearchFailed(format!("failed to run grep: {}", e)))?;
        collect_hits(self.name(), runs_dir, output, query.limit)
    }
}
