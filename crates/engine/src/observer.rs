//! Run-ended notification hook
//!
//! Observers are called after a run's transcript and metadata have been
//! persisted, outside of any store lock. They must not block for long;
//! anything slow (webhooks, chat notifications) belongs on the observer's
//! own thread.

use runvault_core::RunMetadata;

/// Receives final metadata of every run that ends
pub trait RunObserver: Send + Sync {
    /// Called once per run, after it has been persisted
    fn on_run_ended(&self, metadata: &RunMetadata);
}

impl<F> RunObserver for F
where
    F: Fn(&RunMetadata) + Send + Sync,
{
    fn on_run_ended(&self, metadata: &RunMetadata) {
        self(metadata)
    }
}
