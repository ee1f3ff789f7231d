//! In-memory table of runs that are currently recording
//!
//! One entry per active run, sharded by run id. Each entry carries its own
//! lock so that turns for different runs never contend beyond the shard
//! bookkeeping, while calls for the same run are serialized.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use runvault_core::{Error, Result, Transcript};
use std::sync::Arc;

/// Live record of one active run
#[derive(Debug)]
pub struct ActiveRun {
    /// Transcript accumulated so far
    pub transcript: Transcript,
    /// Set once the run has been persisted by `end_run`; late writers that
    /// still hold the handle must treat the run as not started
    pub closed: bool,
}

impl ActiveRun {
    fn new(transcript: Transcript) -> Self {
        ActiveRun {
            transcript,
            closed: false,
        }
    }
}

/// Shared handle to one active run
pub type RunHandle = Arc<Mutex<ActiveRun>>;

/// Active-run table
#[derive(Debug, Default)]
pub struct ActiveRunTable {
    runs: DashMap<String, RunHandle>,
}

impl ActiveRunTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a run
    ///
    /// The entry is inserted with its lock already held, then the shard is
    /// released and `prepare` runs (this is where the on-disk directory is
    /// created). Callers looking up the same run wait on the entry lock;
    /// other runs are not blocked. If `prepare` fails the entry is closed
    /// and removed, so waiters see `NotStarted`.
    pub fn register<F>(&self, transcript: Transcript, prepare: F) -> Result<RunHandle>
    where
        F: FnOnce(&Transcript) -> Result<()>,
    {
        let run_id = transcript.run_id().to_string();
        let handle = Arc::new(Mutex::new(ActiveRun::new(transcript)));
        let mut run = handle.lock();

        match self.runs.entry(run_id.clone()) {
            Entry::Occupied(_) => return Err(Error::run_exists(&run_id)),
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&handle));
            }
        }

        if let Err(e) = prepare(&run.transcript) {
            run.closed = true;
            drop(run);
            self.remove(&run_id, &handle);
            return Err(e);
        }
        drop(run);
        Ok(handle)
    }

    /// Handle of an active run
    pub fn get(&self, run_id: &str) -> Option<RunHandle> {
        self.runs.get(run_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Handle of an active run, or `NotStarted`
    pub fn require(&self, run_id: &str) -> Result<RunHandle> {
        self.get(run_id)
            .ok_or_else(|| Error::NotStarted(run_id.to_string()))
    }

    /// Drop the entry if it still refers to `handle`
    pub fn remove(&self, run_id: &str, handle: &RunHandle) -> bool {
        self.runs
            .remove_if(run_id, |_, current| Arc::ptr_eq(current, handle))
            .is_some()
    }

    /// Whether a run is being tracked
    pub fn contains(&self, run_id: &str) -> bool {
        self.runs.contains_key(run_id)
    }

    /// Ids of all tracked runs, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.runs.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Number of tracked runs
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// True if no run is being tracked
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use runvault_core::RunMetadata;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn transcript(id: &str) -> Transcript {
        Transcript::new(RunMetadata::new(id, "flow", Utc::now()))
    }

    fn ready(_: &Transcript) -> Result<()> {
        Ok(())
    }

    #[test]
    fn test_register_and_get() {
        let table = ActiveRunTable::new();
        table.register(transcript("r1"), ready).unwrap();
        assert!(table.contains("r1"));
        assert_eq!(table.get("r1").unwrap().lock().transcript.run_id(), "r1");
        assert_eq!(table.ids(), vec!["r1"]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_duplicate_register_rejected() {
        let table = ActiveRunTable::new();
        table.register(transcript("r1"), ready).unwrap();
        let err = table.register(transcript("r1"), ready).unwrap_err();
        assert!(err.is_already_exists());
    }

    #[test]
    fn test_failed_prepare_leaves_no_entry() {
        let table = ActiveRunTable::new();
        let result = table.register(transcript("r1"), |_| Err(Error::invalid_state("disk full")));
        assert!(result.is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn test_remove_only_matching_handle() {
        let table = ActiveRunTable::new();
        let first = table.register(transcript("r1"), ready).unwrap();
        assert!(table.remove("r1", &first));
        let second = table.register(transcript("r1"), ready).unwrap();
        assert!(!table.remove("r1", &first));
        assert!(table.remove("r1", &second));
        assert!(table.require("r1").unwrap_err().is_not_started());
    }

    /// Start `slow-run` with a prepare step that blocks until released
    fn start_blocked(
        table: &Arc<ActiveRunTable>,
        outcome: Result<()>,
    ) -> (mpsc::Sender<()>, thread::JoinHandle<Result<RunHandle>>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let starter = {
            let table = Arc::clone(table);
            thread::spawn(move || {
                table.register(transcript("slow-run"), move |_| {
                    entered_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                    outcome
                })
            })
        };
        entered_rx.recv().unwrap();
        (release_tx, starter)
    }

    #[test]
    fn test_prepare_does_not_block_other_runs() {
        let table = Arc::new(ActiveRunTable::new());
        let (release, starter) = start_blocked(&table, Ok(()));

        // Enough ids that several share the slow run's shard
        let (done_tx, done_rx) = mpsc::channel();
        {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                for i in 0..64 {
                    let id = format!("other-{}", i);
                    table.register(transcript(&id), ready).unwrap();
                    let handle = table.require(&id).unwrap();
                    assert_eq!(handle.lock().transcript.run_id(), id);
                    assert!(table.contains(&id));
                }
                done_tx.send(table.len()).unwrap();
            });
        }

        let registered = done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("other runs blocked behind a preparing run");
        assert_eq!(registered, 65);

        release.send(()).unwrap();
        starter.join().unwrap().unwrap();
        assert!(table.require("slow-run").is_ok());
    }

    #[test]
    fn test_waiter_sees_failed_start_as_not_started() {
        let table = Arc::new(ActiveRunTable::new());
        let (release, starter) = start_blocked(&table, Err(Error::invalid_state("disk full")));

        let handle = table.require("slow-run").unwrap();
        let waiter = thread::spawn(move || handle.lock().closed);

        release.send(()).unwrap();
        assert!(starter.join().unwrap().is_err());
        assert!(waiter.join().unwrap());
        assert!(table.require("slow-run").unwrap_err().is_not_started());
    }
}
