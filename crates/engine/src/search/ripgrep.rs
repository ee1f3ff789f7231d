//! ripgrep backend

use super::{collect_hits, SearchBackend, SearchHit, SearchQuery, TRANSCRIPT_GLOB, TRANSCRIPT_GZ_GLOB};
use runvault_core::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Searches with `rg`, including gzip-compressed transcripts
#[derive(Debug, Clone)]
pub struct RipgrepBackend {
    program: PathBuf,
}

impl RipgrepBackend {
    /// Use the `rg` binary at `program`
    pub fn new(program: impl Into<PathBuf>) -> Self {
        RipgrepBackend {
            program: program.into(),
        }
    }

    /// Find `rg` on `PATH`
    pub fn locate() -> Option<Self> {
        which::which("rg").ok().map(Self::new)
    }
}

impl SearchBackend for RipgrepBackend {
    fn name(&self) -> &'static str {
        "ripgrep"
    }

    fn search(&self, runs_dir: &Path, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        let mut cmd = Command::new(&self.program);
        cmd.args([
            "--no-heading",
            "--with-filename",
            "--line-number",
            "--color",
            "never",
            "--no-ignore",
            "--fixed-strings",
            "--search-zip",
            "--glob",
            TRANSCRIPT_GLOB,
            "--glob",
            TRANSCRIPT_GZ_GLOB,
        ]);
        if query.ignore_case {
            cmd.arg("--ignore-case");
        }
        cmd.arg("-e").arg(&query.pattern).arg(runs_dir);

        debug!(target: "runvault::search", pattern = %query.pattern, "Running ripgrep");
        let output = cmd
            .output()
            .map_err(|e| Error::SearchFailed(format!("failed to run rg: {}", e)))?;
        collect_hits(self.name(), runs_dir, output, query.limit)
    }
}
