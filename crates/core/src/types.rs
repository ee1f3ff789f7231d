//! Run identifiers
//!
//! Run ids are plain strings chosen by the caller. By convention they start
//! with a sortable `YYYY-MM-DD` date followed by the workflow identifier and
//! a random suffix, e.g. `2026-03-14-review-3f9a0c1d`. The date prefix doubles
//! as the month bucket archives are filed under.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length in characters of the `YYYY-MM` prefix used as an archive month bucket
pub const MONTH_BUCKET_LEN: usize = 7;

/// Unique identifier for a workflow run
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Wrap an existing id after validating it
    pub fn parse(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_run_id(&id)?;
        Ok(RunId(id))
    }

    /// Generate a fresh id: `YYYY-MM-DD-<flow>-<8 hex>`
    ///
    /// Characters of `flow_id` that cannot appear in a directory name are
    /// replaced with `-`.
    pub fn generate(flow_id: &str) -> Self {
        Self::generate_at(flow_id, Utc::now())
    }

    /// Generate an id dated at `now`
    pub fn generate_at(flow_id: &str, now: DateTime<Utc>) -> Self {
        let flow: String = flow_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        let flow = if flow.is_empty() { "run".to_string() } else { flow };
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        RunId(format!(
            "{}-{}-{}",
            now.format("%Y-%m-%d"),
            flow,
            &suffix[..8]
        ))
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Month bucket this run's archive is filed under
    pub fn month_bucket(&self) -> String {
        month_bucket(&self.0)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RunId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<RunId> for String {
    fn from(id: RunId) -> Self {
        id.0
    }
}

/// Check that a run id can be used as a single directory name
///
/// Rejects empty ids, `.`/`..`, ids containing path separators or NUL.
pub fn validate_run_id(run_id: &str) -> Result<()> {
    if run_id.is_empty() {
        return Err(Error::invalid_name("run id must not be empty"));
    }
    if run_id == "." || run_id == ".." {
        return Err(Error::invalid_name(format!("run id '{}' is reserved", run_id)));
    }
    if run_id.contains(['/', '\\', '\0']) {
        return Err(Error::invalid_name(format!(
            "run id '{}' must not contain path separators",
            run_id
        )));
    }
    if run_id.starts_with('.') {
        return Err(Error::invalid_name(format!(
            "run id '{}' must not start with '.'",
            run_id
        )));
    }
    Ok(())
}

/// Month bucket for `run_id`, using the current month for short ids
pub fn month_bucket(run_id: &str) -> String {
    month_bucket_at(run_id, Utc::now())
}

/// Month bucket for `run_id`, using `now` for ids too short to carry a date
pub fn month_bucket_at(run_id: &str, now: DateTime<Utc>) -> String {
    let prefix: String = run_id.chars().take(MONTH_BUCKET_LEN).collect();
    if prefix.chars().count() == MONTH_BUCKET_LEN {
        prefix
    } else {
        now.format("%Y-%m").to_string()
    }
}
