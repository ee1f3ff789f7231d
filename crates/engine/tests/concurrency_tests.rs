//! Multi-threaded Transcript Store tests
//!
//! Validates that turns recorded concurrently for one run get unique,
//! contiguous ids, that different runs do not interfere, and that a turn
//! racing `end_run` is either persisted or rejected, never lost.

use runvault_core::{NewRun, RunStatus, Turn};
use runvault_engine::TranscriptStore;
use runvault_durability::StorePaths;
use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

fn store() -> (TempDir, Arc<TranscriptStore>) {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(TranscriptStore::new(StorePaths::from_root(temp_dir.path())));
    (temp_dir, store)
}

// ============================================================================
// Same run
// ============================================================================

/// Test: N threads each record one turn -> ids 1..=N, no gaps, no duplicates
#[test]
fn test_concurrent_turns_get_contiguous_ids() {
    const THREADS: usize = 16;
    let (_dir, store) = store();
    store.start_run("r1", NewRun::for_flow("f")).unwrap();

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store
                    .record_turn("r1", Turn::user(format!("turn {}", i)).with_tokens_in(1))
                    .unwrap()
            })
        })
        .collect();

    let ids: BTreeSet<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(ids, (1..=THREADS as u64).collect::<BTreeSet<_>>());

    let transcript = store.load("r1").unwrap();
    assert_eq!(transcript.turns.len(), THREADS);
    assert_eq!(transcript.metadata.turn_count, THREADS as u64);
    assert_eq!(transcript.metadata.total_tokens_in, THREADS as u64);
    let persisted_ids: Vec<u64> = transcript.turns.iter().map(|t| t.id).collect();
    assert_eq!(persisted_ids, (1..=THREADS as u64).collect::<Vec<_>>());
}

/// Test: many turns per thread across several threads
#[test]
fn test_concurrent_bursts() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 50;
    let (_dir, store) = store();
    store.start_run("r1", NewRun::for_flow("f")).unwrap();

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..PER_THREAD {
                    store
                        .record_turn("r1", Turn::assistant("x").with_tokens_out(2))
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let meta = store.end_run("r1", RunStatus::Completed).unwrap();
    assert_eq!(meta.turn_count, (THREADS * PER_THREAD) as u64);
    assert_eq!(meta.total_tokens_out, (THREADS * PER_THREAD * 2) as u64);
}

// ============================================================================
// Different runs
// ============================================================================

/// Test: each thread owns its own run -> every run sees only its own turns
#[test]
fn test_independent_runs_do_not_interfere() {
    const RUNS: usize = 8;
    let (_dir, store) = store();
    let barrier = Arc::new(Barrier::new(RUNS));

    let handles: Vec<_> = (0..RUNS)
        .map(|i| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let run_id = format!("run-{}", i);
                store.start_run(&run_id, NewRun::for_flow("f")).unwrap();
                barrier.wait();
                for _ in 0..=i {
                    store.record_turn(&run_id, Turn::user("hi")).unwrap();
                }
                store.end_run(&run_id, RunStatus::Completed).unwrap()
            })
        })
        .collect();

    for (i, h) in handles.into_iter().enumerate() {
        let meta = h.join().unwrap();
        assert_eq!(meta.run_id, format!("run-{}", i));
        assert_eq!(meta.turn_count, i as u64 + 1);
    }
    assert!(store.active_runs().is_empty());
}

/// Test: racing starts of the same id -> exactly one wins
#[test]
fn test_racing_starts_single_winner() {
    const THREADS: usize = 8;
    let (_dir, store) = store();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store.start_run("r1", NewRun::for_flow("f")).is_ok()
            })
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(winners, 1);
}

// ============================================================================
// Turns racing end_run
// ============================================================================

/// Test: every successfully recorded turn is in the persisted transcript
#[test]
fn test_turns_racing_end_are_never_lost() {
    const WRITERS: usize = 4;
    let (_dir, store) = store();
    store.start_run("r1", NewRun::for_flow("f")).unwrap();

    let barrier = Arc::new(Barrier::new(WRITERS + 1));
    let writers: Vec<_> = (0..WRITERS)
        .map(|_| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut accepted = 0u64;
                loop {
                    match store.record_turn("r1", Turn::user("x")) {
                        Ok(_) => accepted += 1,
                        Err(e) => {
                            assert!(e.is_not_started());
                            return accepted;
                        }
                    }
                }
            })
        })
        .collect();

    barrier.wait();
    thread::sleep(std::time::Duration::from_millis(5));
    let meta = store.end_run("r1", RunStatus::Completed).unwrap();

    let accepted: u64 = writers.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(meta.turn_count, accepted);
    assert_eq!(store.load("r1").unwrap().turns.len() as u64, accepted);
}
