//! Retention policy for run directories and the archive tier
//!
//! The policy is pure configuration: it is never persisted by the store and
//! every lifecycle pass recomputes each run's disposition from the current
//! time and the run's metadata.
//!
//! # Thresholds
//!
//! - **archive_after_days**: finished runs at least this old are archived
//! - **retention_days**: finished runs at least this old are deleted outright
//! - **archive_retention_days**: archives at least this old are purged
//!
//! # Exemptions
//!
//! - Running runs are always kept
//! - Failed runs are kept while `keep_failed` is set
//! - At least `keep_min_runs` runs survive every pass

mod policy;

pub use policy::{Disposition, RetentionPolicy};
