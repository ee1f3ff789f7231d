//! Run lifecycle types
//!
//! `RunMetadata` is the small per-run record persisted as `metadata.json`.
//! It is the single source of truth for age and status decisions made by the
//! lifecycle manager, and the record listing reads instead of full transcripts.
//!
//! ## Status transitions
//!
//! ```text
//! running ──► completed | failed | canceled
//! ```
//!
//! Status is only mutable while `running` and is frozen when the run ends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Lifecycle status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Run is in progress
    Running,
    /// Run finished normally
    Completed,
    /// Run finished with an error
    Failed,
    /// Run was canceled by the caller
    Canceled,
}

impl RunStatus {
    /// Check if run is still in progress
    pub fn is_running(&self) -> bool {
        matches!(self, RunStatus::Running)
    }

    /// Check if run reached a terminal status
    pub fn is_terminal(&self) -> bool {
        !self.is_running()
    }

    /// Check if run failed
    pub fn is_failed(&self) -> bool {
        matches!(self, RunStatus::Failed)
    }

    /// Get string representation (matches the on-disk encoding)
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed),
            "canceled" | "cancelled" => Ok(RunStatus::Canceled),
            other => Err(Error::invalid_state(format!(
                "unknown run status '{}'",
                other
            ))),
        }
    }
}

/// Per-run metadata record (`metadata.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    /// Run ID
    pub run_id: String,
    /// Workflow the run belongs to
    #[serde(default)]
    pub flow_id: String,
    /// Current status
    pub status: RunStatus,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run ended (unset while running)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Tokens attributed to user and system turns
    #[serde(default)]
    pub total_tokens_in: u64,
    /// Tokens attributed to assistant turns
    #[serde(default)]
    pub total_tokens_out: u64,
    /// Accumulated cost
    #[serde(default)]
    pub total_cost: f64,
    /// Number of recorded turns
    #[serde(default)]
    pub turn_count: u64,
    /// Error message recorded when the run ended
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Free-form caller labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl RunMetadata {
    /// Create metadata for a run starting at `started_at`
    pub fn new(run_id: impl Into<String>, flow_id: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        RunMetadata {
            run_id: run_id.into(),
            flow_id: flow_id.into(),
            status: RunStatus::Running,
            started_at,
            ended_at: None,
            total_tokens_in: 0,
            total_tokens_out: 0,
            total_cost: 0.0,
            turn_count: 0,
            error: None,
            labels: BTreeMap::new(),
        }
    }

    /// Seal the record with a terminal status
    pub fn finish(&mut self, status: RunStatus, ended_at: DateTime<Utc>, error: Option<String>) {
        self.status = status;
        self.ended_at = Some(ended_at);
        if error.is_some() {
            self.error = error;
        }
    }

    /// Wall-clock duration (if ended)
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.ended_at.map(|e| e - self.started_at)
    }
}

/// Options supplied by the caller when starting a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewRun {
    /// Workflow identifier
    pub flow_id: String,
    /// Free-form labels copied into the metadata record
    pub labels: BTreeMap<String, String>,
}

impl NewRun {
    /// Start options for a run of `flow_id`
    pub fn for_flow(flow_id: impl Into<String>) -> Self {
        NewRun {
            flow_id: flow_id.into(),
            labels: BTreeMap::new(),
        }
    }

    /// Attach a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}
