//! Listing filter for persisted runs

use chrono::{DateTime, Utc};
use runvault_core::{RunMetadata, RunStatus};

/// Criteria for `TranscriptStore::list`
///
/// Empty criteria match everything. The time window applies to the run's
/// start time and is inclusive on both ends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunFilter {
    /// Only runs of this workflow
    pub flow_id: Option<String>,
    /// Only runs with this status
    pub status: Option<RunStatus>,
    /// Only runs started at or after this time
    pub since: Option<DateTime<Utc>>,
    /// Only runs started at or before this time
    pub until: Option<DateTime<Utc>>,
    /// Cap on the number of results (newest first)
    pub limit: Option<usize>,
}

impl RunFilter {
    /// Match everything
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to one workflow
    pub fn with_flow(mut self, flow_id: impl Into<String>) -> Self {
        self.flow_id = Some(flow_id.into());
        self
    }

    /// Restrict to one status
    pub fn with_status(mut self, status: RunStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restrict to runs started at or after `since`
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Restrict to runs started at or before `until`
    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    /// Cap the result count
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `meta` satisfies every criterion (the limit aside)
    pub fn matches(&self, meta: &RunMetadata) -> bool {
        if let Some(flow) = &self.flow_id {
            if &meta.flow_id != flow {
                return false;
            }
        }
        if let Some(status) = self.status {
            if meta.status != status {
                return false;
            }
        }
        if let Some(since) = self.since {
            if meta.started_at < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if meta.started_at > until {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn meta(flow: &str, status: RunStatus, hour: u32) -> RunMetadata {
        let started = Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap();
        let mut m = RunMetadata::new(format!("{}-{}", flow, hour), flow, started);
        m.status = status;
        m
    }

    #[test]
    fn test_empty_filter_matches_all() {
        assert!(RunFilter::all().matches(&meta("a", RunStatus::Failed, 1)));
    }

    #[test]
    fn test_flow_and_status() {
        let f = RunFilter::all().with_flow("a").with_status(RunStatus::Completed);
        assert!(f.matches(&meta("a", RunStatus::Completed, 1)));
        assert!(!f.matches(&meta("b", RunStatus::Completed, 1)));
        assert!(!f.matches(&meta("a", RunStatus::Failed, 1)));
    }

    #[test]
    fn test_time_window_inclusive() {
        let at = |h| Utc.with_ymd_and_hms(2026, 3, 1, h, 0, 0).unwrap();
        let f = RunFilter::all().since(at(2)).until(at(4));
        assert!(!f.matches(&meta("a", RunStatus::Completed, 1)));
        assert!(f.matches(&meta("a", RunStatus::Completed, 2)));
        assert!(f.matches(&meta("a", RunStatus::Completed, 4)));
        assert!(!f.matches(&meta("a", RunStatus::Completed, 5)));
        assert!(RunFilter::all()
            .since(at(4) + Duration::seconds(1))
            .matches(&meta("a", RunStatus::Completed, 5)));
    }
}
