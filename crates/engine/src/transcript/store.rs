use super::active::{ActiveRunTable, RunHandle};
use super::filter::RunFilter;
use super::persist::{load_transcript, save_transcript};
use crate::config::DEFAULT_TRANSCRIPT_COMPRESS_ABOVE;
use crate::observer::RunObserver;
use crate::search::{detect_backend, SearchBackend, SearchHit, SearchQuery};
use chrono::Utc;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use runvault_core::{
    validate_run_id, Error, NewRun, Result, RunMetadata, RunStatus, ToolCall, Transcript, Turn,
};
use runvault_durability::paths::is_hidden_entry;
use runvault_durability::{read_metadata, write_metadata, StorePaths};
use std::fs;
use std::io;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Concurrent per-run transcript tracking with durable persistence
pub struct TranscriptStore {
    paths: StorePaths,
    compress_above: usize,
    active: ActiveRunTable,
    observers: RwLock<Vec<Arc<dyn RunObserver>>>,
    search_backend: OnceCell<Option<Arc<dyn SearchBackend>>>,
}

impl std::fmt::Debug for TranscriptStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscriptStore")
            .field("paths", &self.paths)
            .field("compress_above", &self.compress_above)
            .field("active", &self.active.len())
            .finish_non_exhaustive()
    }
}

impl TranscriptStore {
    /// Create a store with the default compression threshold
    pub fn new(paths: StorePaths) -> Self {
        Self::with_threshold(paths, DEFAULT_TRANSCRIPT_COMPRESS_ABOVE)
    }

    /// Create a store compressing transcripts larger than `compress_above` bytes
    pub fn with_threshold(paths: StorePaths, compress_above: usize) -> Self {
        TranscriptStore {
            paths,
            compress_above,
            active: ActiveRunTable::new(),
            observers: RwLock::new(Vec::new()),
            search_backend: OnceCell::new(),
        }
    }

    /// Use `backend` for search instead of probing `PATH`
    pub fn with_search_backend(self, backend: Arc<dyn SearchBackend>) -> Self {
        let _ = self.search_backend.set(Some(backend));
        self
    }

    /// Store paths
    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Register an observer for ended runs
    pub fn add_observer(&self, observer: Arc<dyn RunObserver>) {
        self.observers.write().push(observer);
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Start tracking a run
    ///
    /// Fails with `AlreadyExists` if the run is already active or a run
    /// directory of that id exists on disk. Creates the directory and writes
    /// the initial `running` metadata record.
    pub fn start_run(&self, run_id: &str, new_run: NewRun) -> Result<RunMetadata> {
        validate_run_id(run_id)?;

        let mut meta = RunMetadata::new(run_id, new_run.flow_id, Utc::now());
        meta.labels = new_run.labels;
        let handle = self
            .active
            .register(Transcript::new(meta), |transcript| {
                self.create_run_dir(&transcript.metadata)
            })?;

        let meta = handle.lock().transcript.metadata.clone();
        info!(
            target: "runvault::transcript",
            run_id = %run_id,
            flow_id = %meta.flow_id,
            "Run started"
        );
        Ok(meta)
    }

    fn create_run_dir(&self, meta: &RunMetadata) -> Result<()> {
        fs::create_dir_all(self.paths.runs_dir())?;
        let run_dir = self.paths.run_dir(&meta.run_id);
        match fs::create_dir(&run_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(Error::run_exists(&meta.run_id))
            }
            Err(e) => return Err(e.into()),
        }
        if let Err(e) = write_metadata(&self.paths, meta) {
            let _ = fs::remove_dir_all(&run_dir);
            return Err(e);
        }
        Ok(())
    }

    /// Append a turn to an active run
    ///
    /// Returns the turn's sequence id. Concurrent calls for the same run are
    /// serialized; a call racing `end_run` either lands before persistence
    /// or fails with `NotStarted`.
    pub fn record_turn(&self, run_id: &str, turn: Turn) -> Result<u64> {
        self.with_active(run_id, |transcript| {
            let id = transcript.append(turn, Utc::now());
            debug!(target: "runvault::transcript", run_id = %run_id, turn_id = id, "Turn recorded");
            Ok(id)
        })
    }

    /// Attach a tool call to the most recent assistant turn
    pub fn record_tool_call(&self, run_id: &str, call: ToolCall) -> Result<()> {
        self.with_active(run_id, |transcript| match transcript.last_assistant_turn_mut() {
            Some(turn) => {
                turn.tool_calls.push(call);
                Ok(())
            }
            None => Err(Error::invalid_state(format!(
                "run {} has no assistant turn to attach a tool call to",
                run_id
            ))),
        })
    }

    /// Add to the run's accumulated cost
    ///
    /// Negative and non-finite amounts are rejected.
    pub fn add_cost(&self, run_id: &str, cost: f64) -> Result<()> {
        if !cost.is_finite() || cost < 0.0 {
            return Err(Error::invalid_state(format!("invalid cost {}", cost)));
        }
        self.with_active(run_id, |transcript| {
            transcript.metadata.total_cost += cost;
            Ok(())
        })
    }

    /// End a run with a terminal status and persist it
    pub fn end_run(&self, run_id: &str, status: RunStatus) -> Result<RunMetadata> {
        self.end_run_with_error(run_id, status, None)
    }

    /// End a run, recording an error message in its metadata
    ///
    /// If persisting fails the run stays active and the call may be retried.
    pub fn end_run_with_error(
        &self,
        run_id: &str,
        status: RunStatus,
        error: Option<String>,
    ) -> Result<RunMetadata> {
        if status.is_running() {
            return Err(Error::invalid_state("a run cannot end with status running"));
        }
        let handle = self.active.require(run_id)?;

        let metadata = {
            let mut run = handle.lock();
            if run.closed {
                return Err(Error::NotStarted(run_id.to_string()));
            }
            let mut finished = run.transcript.clone();
            finished.metadata.finish(status, Utc::now(), error);
            save_transcript(&self.paths, &finished, self.compress_above)?;
            run.closed = true;
            run.transcript = finished;
            run.transcript.metadata.clone()
        };
        self.active.remove(run_id, &handle);

        info!(
            target: "runvault::transcript",
            run_id = %run_id,
            status = %metadata.status,
            turns = metadata.turn_count,
            tokens_in = metadata.total_tokens_in,
            tokens_out = metadata.total_tokens_out,
            "Run ended"
        );

        let observers: Vec<Arc<dyn RunObserver>> = self.observers.read().clone();
        for observer in observers {
            observer.on_run_ended(&metadata);
        }
        Ok(metadata)
    }

    fn with_active<T>(
        &self,
        run_id: &str,
        f: impl FnOnce(&mut Transcript) -> Result<T>,
    ) -> Result<T> {
        let handle = self.active.require(run_id)?;
        let mut run = handle.lock();
        if run.closed {
            return Err(Error::NotStarted(run_id.to_string()));
        }
        f(&mut run.transcript)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Whether a run is currently active
    pub fn is_active(&self, run_id: &str) -> bool {
        self.active.contains(run_id)
    }

    /// Ids of all active runs, sorted
    pub fn active_runs(&self) -> Vec<String> {
        self.active.ids()
    }

    /// Full transcript of a run
    ///
    /// For an active run this is an independent snapshot; later turns do
    /// not show up in it.
    pub fn load(&self, run_id: &str) -> Result<Transcript> {
        if let Some(transcript) = self.snapshot(run_id, |t| t.clone()) {
            return Ok(transcript);
        }
        validate_run_id(run_id)?;
        load_transcript(&self.paths, run_id)
    }

    /// Metadata record of a run
    pub fn load_metadata(&self, run_id: &str) -> Result<RunMetadata> {
        if let Some(meta) = self.snapshot(run_id, |t| t.metadata.clone()) {
            return Ok(meta);
        }
        validate_run_id(run_id)?;
        read_metadata(&self.paths, run_id)
    }

    fn snapshot<T>(&self, run_id: &str, f: impl FnOnce(&Transcript) -> T) -> Option<T> {
        let handle: RunHandle = self.active.get(run_id)?;
        let run = handle.lock();
        if run.closed {
            None
        } else {
            Some(f(&run.transcript))
        }
    }

    /// Metadata of every run matching `filter`, newest first
    ///
    /// Runs whose metadata cannot be read are skipped.
    pub fn list(&self, filter: &RunFilter) -> Result<Vec<RunMetadata>> {
        let entries = match fs::read_dir(self.paths.runs_dir()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut runs = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(target: "runvault::transcript", error = %e, "Skipping unreadable run entry");
                    continue;
                }
            };
            let run_id = entry.file_name().to_string_lossy().to_string();
            if is_hidden_entry(&run_id) || !entry.path().is_dir() {
                continue;
            }
            match self.load_metadata(&run_id) {
                Ok(meta) if filter.matches(&meta) => runs.push(meta),
                Ok(_) => {}
                Err(e) => warn!(
                    target: "runvault::transcript",
                    run_id = %run_id,
                    error = %e,
                    "Skipping run with unreadable metadata"
                ),
            }
        }

        runs.sort_by(|a, b| {
            b.started_at
                .cmp(&a.started_at)
                .then_with(|| b.run_id.cmp(&a.run_id))
        });
        if let Some(limit) = filter.limit {
            runs.truncate(limit);
        }
        Ok(runs)
    }

    /// Remove a finished run's directory
    pub fn delete(&self, run_id: &str) -> Result<()> {
        validate_run_id(run_id)?;
        if self.active.contains(run_id) {
            return Err(Error::invalid_state(format!(
                "run {} is active and cannot be deleted",
                run_id
            )));
        }
        match fs::remove_dir_all(self.paths.run_dir(run_id)) {
            Ok(()) => {
                info!(target: "runvault::transcript", run_id = %run_id, "Run deleted");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::run_not_found(run_id)),
            Err(e) => Err(e.into()),
        }
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Search persisted transcripts for a literal string
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        if query.pattern.is_empty() {
            return Err(Error::invalid_state("search pattern must not be empty"));
        }
        let backend = self
            .search_backend
            .get_or_init(detect_backend)
            .clone()
            .ok_or_else(|| {
                Error::SearchUnavailable("neither rg nor grep was found on PATH".to_string())
            })?;

        let runs_dir = self.paths.runs_dir();
        if !runs_dir.is_dir() {
            return Ok(Vec::new());
        }
        let hits = backend.search(&runs_dir, query)?;
        debug!(
            target: "runvault::search",
            backend = backend.name(),
            hits = hits.len(),
            "Transcript search complete"
        );
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::{tempdir, TempDir};

    fn store() -> (TempDir, TranscriptStore) {
        let dir = tempdir().unwrap();
        let store = TranscriptStore::new(StorePaths::from_root(dir.path()));
        (dir, store)
    }

    #[test]
    fn test_start_creates_dir_and_metadata() {
        let (_dir, store) = store();
        let meta = store
            .start_run("r1", NewRun::for_flow("f").with_label("team", "core"))
            .unwrap();
        assert_eq!(meta.status, RunStatus::Running);
        assert!(store.paths().run_dir("r1").is_dir());
        let on_disk = read_metadata(store.paths(), "r1").unwrap();
        assert_eq!(on_disk.flow_id, "f");
        assert_eq!(on_disk.labels.get("team").map(String::as_str), Some("core"));
        assert!(store.is_active("r1"));
    }

    #[test]
    fn test_start_twice_fails() {
        let (_dir, store) = store();
        store.start_run("r1", NewRun::for_flow("f")).unwrap();
        assert!(store
            .start_run("r1", NewRun::for_flow("f"))
            .unwrap_err()
            .is_already_exists());
    }

    #[test]
    fn test_start_over_existing_directory_fails() {
        let (_dir, store) = store();
        fs::create_dir_all(store.paths().run_dir("r1")).unwrap();
        assert!(store
            .start_run("r1", NewRun::for_flow("f"))
            .unwrap_err()
            .is_already_exists());
        assert!(!store.is_active("r1"));
    }

    #[test]
    fn test_operations_on_unknown_run() {
        let (_dir, store) = store();
        assert!(store.record_turn("nope", Turn::user("x")).unwrap_err().is_not_started());
        assert!(store.add_cost("nope", 1.0).unwrap_err().is_not_started());
        assert!(store
            .end_run("nope", RunStatus::Completed)
            .unwrap_err()
            .is_not_started());
    }

    #[test]
    fn test_token_accumulation() {
        let (_dir, store) = store();
        store.start_run("r1", NewRun::for_flow("f")).unwrap();
        store.record_turn("r1", Turn::user("a").with_tokens_in(100)).unwrap();
        store.record_turn("r1", Turn::assistant("b").with_tokens_out(50)).unwrap();
        store.record_turn("r1", Turn::user("c").with_tokens_in(20)).unwrap();
        store.record_turn("r1", Turn::assistant("d").with_tokens_out(80)).unwrap();

        let meta = store.load_metadata("r1").unwrap();
        assert_eq!(meta.total_tokens_in, 120);
        assert_eq!(meta.total_tokens_out, 130);
        assert_eq!(meta.turn_count, 4);
    }

    #[test]
    fn test_tool_calls_and_cost() {
        let (_dir, store) = store();
        store.start_run("r1", NewRun::for_flow("f")).unwrap();
        assert!(matches!(
            store.record_tool_call("r1", ToolCall::new("ls", "{}", "")),
            Err(Error::InvalidState(_))
        ));
        store.record_turn("r1", Turn::assistant("calling")).unwrap();
        store.record_turn("r1", Turn::tool_result("ok")).unwrap();
        store
            .record_tool_call("r1", ToolCall::new("ls", "{}", "a b"))
            .unwrap();

        store.add_cost("r1", 0.25).unwrap();
        store.add_cost("r1", 0.5).unwrap();
        assert!(matches!(store.add_cost("r1", -1.0), Err(Error::InvalidState(_))));
        assert!(matches!(store.add_cost("r1", f64::NAN), Err(Error::InvalidState(_))));

        let t = store.load("r1").unwrap();
        assert_eq!(t.turns[0].tool_calls.len(), 1);
        assert!(t.turns[1].tool_calls.is_empty());
        assert!((t.metadata.total_cost - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let (_dir, store) = store();
        store.start_run("r1", NewRun::for_flow("f")).unwrap();
        store.record_turn("r1", Turn::user("one")).unwrap();
        let snapshot = store.load("r1").unwrap();
        store.record_turn("r1", Turn::user("two")).unwrap();

        assert_eq!(snapshot.turns.len(), 1);
        assert_eq!(store.load("r1").unwrap().turns.len(), 2);
    }

    #[test]
    fn test_end_run_persists_and_deactivates() {
        let (_dir, store) = store();
        store.start_run("r1", NewRun::for_flow("f")).unwrap();
        store.record_turn("r1", Turn::user("hi").with_tokens_in(3)).unwrap();
        let meta = store
            .end_run_with_error("r1", RunStatus::Failed, Some("boom".to_string()))
            .unwrap();

        assert_eq!(meta.status, RunStatus::Failed);
        assert_eq!(meta.error.as_deref(), Some("boom"));
        assert!(meta.ended_at.is_some());
        assert!(!store.is_active("r1"));
        assert!(store.record_turn("r1", Turn::user("late")).unwrap_err().is_not_started());

        let t = store.load("r1").unwrap();
        assert_eq!(t.turns.len(), 1);
        assert_eq!(t.metadata, meta);
        assert_eq!(read_metadata(store.paths(), "r1").unwrap(), meta);
    }

    #[test]
    fn test_end_with_running_status_rejected() {
        let (_dir, store) = store();
        store.start_run("r1", NewRun::for_flow("f")).unwrap();
        assert!(matches!(
            store.end_run("r1", RunStatus::Running),
            Err(Error::InvalidState(_))
        ));
        assert!(store.is_active("r1"));
    }

    #[test]
    fn test_observer_called_once() {
        let (_dir, store) = store();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        store.add_observer(Arc::new(move |meta: &RunMetadata| {
            assert_eq!(meta.status, RunStatus::Completed);
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        store.start_run("r1", NewRun::for_flow("f")).unwrap();
        store.end_run("r1", RunStatus::Completed).unwrap();
        assert!(store.end_run("r1", RunStatus::Completed).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_list_filters_and_orders() {
        let (_dir, store) = store();
        for (id, flow) in [("r1", "a"), ("r2", "b"), ("r3", "a")] {
            store.start_run(id, NewRun::for_flow(flow)).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        store.end_run("r1", RunStatus::Completed).unwrap();
        store.end_run("r2", RunStatus::Failed).unwrap();
        fs::create_dir_all(store.paths().run_dir("broken")).unwrap();

        let all = store.list(&RunFilter::all()).unwrap();
        let ids: Vec<_> = all.iter().map(|m| m.run_id.as_str()).collect();
        assert_eq!(ids, vec!["r3", "r2", "r1"]);

        let flow_a = store.list(&RunFilter::all().with_flow("a")).unwrap();
        assert_eq!(flow_a.len(), 2);

        let running = store
            .list(&RunFilter::all().with_status(RunStatus::Running))
            .unwrap();
        assert_eq!(running[0].run_id, "r3");

        let limited = store.list(&RunFilter::all().with_limit(1)).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].run_id, "r3");
    }

    #[test]
    fn test_delete() {
        let (_dir, store) = store();
        store.start_run("r1", NewRun::for_flow("f")).unwrap();
        assert!(matches!(store.delete("r1"), Err(Error::InvalidState(_))));
        store.end_run("r1", RunStatus::Completed).unwrap();
        store.delete("r1").unwrap();
        assert!(store.delete("r1").unwrap_err().is_not_found());
        assert!(store.load("r1").unwrap_err().is_not_found());
    }

    #[test]
    fn test_large_transcript_compressed() {
        let dir = tempdir().unwrap();
        let store = TranscriptStore::with_threshold(StorePaths::from_root(dir.path()), 512);
        store.start_run("r1", NewRun::for_flow("f")).unwrap();
        store.record_turn("r1", Turn::user("z".repeat(4096))).unwrap();
        store.end_run("r1", RunStatus::Completed).unwrap();

        let file = store.paths().transcript_file("r1");
        assert!(!file.exists());
        assert!(runvault_durability::paths::gz_sibling(&file).exists());
        assert_eq!(store.load("r1").unwrap().turns[0].content.len(), 4096);
    }

    #[test]
    fn test_empty_search_pattern_rejected() {
        let (_dir, store) = store();
        assert!(matches!(
            store.search(&SearchQuery::new("")),
            Err(Error::InvalidState(_))
        ));
    }
}
