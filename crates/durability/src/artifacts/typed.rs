//! Typed convenience wrappers over artifact save/load
//!
//! Pure serialization helpers: each wrapper maps to a well-known artifact
//! name and encodes its value as UTF-8 text or pretty JSON.

use super::ArtifactManager;
use runvault_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Well-known artifact names
pub mod names {
    /// Generated specification
    pub const SPEC: &str = "spec.md";
    /// Structured review report
    pub const REVIEW: &str = "review.json";
    /// Captured test runner output
    pub const TEST_OUTPUT: &str = "test-output.txt";
    /// Captured linter output
    pub const LINT_OUTPUT: &str = "lint-output.txt";
    /// Unified diff of the run's changes
    pub const DIFF: &str = "changes.diff";
}

impl ArtifactManager {
    /// Save the run's specification
    pub fn save_spec(&self, run_id: &str, spec: &str) -> Result<()> {
        self.save_artifact(run_id, names::SPEC, spec.as_bytes())
    }

    /// Load the run's specification
    pub fn load_spec(&self, run_id: &str) -> Result<String> {
        self.load_text(run_id, names::SPEC)
    }

    /// Save a structured review report
    pub fn save_review<T: Serialize>(&self, run_id: &str, review: &T) -> Result<()> {
        self.save_json(run_id, names::REVIEW, review)
    }

    /// Load a structured review report
    pub fn load_review<T: DeserializeOwned>(&self, run_id: &str) -> Result<T> {
        self.load_json(run_id, names::REVIEW)
    }

    /// Save test runner output
    pub fn save_test_output(&self, run_id: &str, output: &str) -> Result<()> {
        self.save_artifact(run_id, names::TEST_OUTPUT, output.as_bytes())
    }

    /// Load test runner output
    pub fn load_test_output(&self, run_id: &str) -> Result<String> {
        self.load_text(run_id, names::TEST_OUTPUT)
    }

    /// Save linter output
    pub fn save_lint_output(&self, run_id: &str, output: &str) -> Result<()> {
        self.save_artifact(run_id, names::LINT_OUTPUT, output.as_bytes())
    }

    /// Load linter output
    pub fn load_lint_output(&self, run_id: &str) -> Result<String> {
        self.load_text(run_id, names::LINT_OUTPUT)
    }

    /// Save the run's diff
    pub fn save_diff(&self, run_id: &str, diff: &str) -> Result<()> {
        self.save_artifact(run_id, names::DIFF, diff.as_bytes())
    }

    /// Load the run's diff
    pub fn load_diff(&self, run_id: &str) -> Result<String> {
        self.load_text(run_id, names::DIFF)
    }

    /// Save any serializable value as pretty JSON under `name`
    pub fn save_json<T: Serialize>(&self, run_id: &str, name: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.save_artifact(run_id, name, &bytes)
    }

    /// Load and decode a JSON artifact
    pub fn load_json<T: DeserializeOwned>(&self, run_id: &str, name: &str) -> Result<T> {
        let bytes = self.load_artifact(run_id, name)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn load_text(&self, run_id: &str, name: &str) -> Result<String> {
        let bytes = self.load_artifact(run_id, name)?;
        String::from_utf8(bytes)
            .map_err(|e| Error::Serialization(format!("artifact '{}' is not UTF-8: {}", name, e)))
    }
}
