//! End-to-end scenarios across the artifact, transcript and lifecycle layers
//!
//! Each test opens a fresh store in a temporary directory and drives it only
//! through the public facade.

use chrono::{Duration, Utc};
use runvault::{
    MockClock, NewRun, RetentionPolicy, RunFilter, RunMetadata, RunStatus, ToolCall, Turn, Vault,
    VaultConfig,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn open_vault() -> (TempDir, Vault) {
    let dir = TempDir::new().unwrap();
    let vault = Vault::open(dir.path()).unwrap();
    (dir, vault)
}

/// Complete a run with two turns and one artifact
fn complete_run(vault: &Vault, run_id: &str) {
    let transcripts = vault.transcripts();
    transcripts
        .start_run(run_id, NewRun::for_flow("build"))
        .unwrap();
    transcripts
        .record_turn(run_id, Turn::user("hi").with_tokens_in(10))
        .unwrap();
    transcripts
        .record_turn(run_id, Turn::assistant("hello").with_tokens_out(5))
        .unwrap();
    vault
        .artifacts()
        .save_artifact(run_id, "spec.md", &vec![b'x'; 800])
        .unwrap();
    transcripts.end_run(run_id, RunStatus::Completed).unwrap();
}

// ============================================================================
// Run recording
// ============================================================================

#[test]
fn test_record_and_reload_run() {
    let (_dir, vault) = open_vault();
    complete_run(&vault, "r1");

    let transcript = vault.transcripts().load("r1").unwrap();
    assert_eq!(transcript.turns.len(), 2);
    assert_eq!(transcript.metadata.status, RunStatus::Completed);
    assert_eq!(transcript.metadata.total_tokens_in, 10);
    assert_eq!(transcript.metadata.total_tokens_out, 5);
    assert_eq!(transcript.metadata.turn_count, 2);
    assert!(transcript.metadata.ended_at.is_some());

    // 800 bytes stays below the compression threshold
    let info = vault.artifacts().artifact_info("r1", "spec.md").unwrap();
    assert!(!info.compressed);
    assert_eq!(info.size, 800);
    assert_eq!(
        vault.artifacts().load_artifact("r1", "spec.md").unwrap(),
        vec![b'x'; 800]
    );
    assert!(!vault.transcripts().is_active("r1"));
}

#[test]
fn test_tool_calls_and_cost_are_persisted() {
    let (_dir, vault) = open_vault();
    let transcripts = vault.transcripts();
    transcripts
        .start_run("r-tools", NewRun::for_flow("lint").with_label("ci", "true"))
        .unwrap();
    transcripts
        .record_turn("r-tools", Turn::assistant("running lint"))
        .unwrap();
    transcripts
        .record_tool_call("r-tools", ToolCall::new("lint", "src/", "ok"))
        .unwrap();
    transcripts.add_cost("r-tools", 0.25).unwrap();
    transcripts
        .end_run_with_error("r-tools", RunStatus::Failed, Some("lint failed".to_string()))
        .unwrap();

    let transcript = transcripts.load("r-tools").unwrap();
    assert_eq!(transcript.turns[0].tool_calls.len(), 1);
    assert_eq!(transcript.metadata.total_cost, 0.25);
    assert_eq!(transcript.metadata.error.as_deref(), Some("lint failed"));
    assert_eq!(
        transcript.metadata.labels.get("ci").map(String::as_str),
        Some("true")
    );
}

#[test]
fn test_list_filters_by_flow_and_status() {
    let (_dir, vault) = open_vault();
    complete_run(&vault, "2026-01-01-build-a");
    complete_run(&vault, "2026-01-02-build-b");
    vault
        .transcripts()
        .start_run("2026-01-03-deploy-c", NewRun::for_flow("deploy"))
        .unwrap();

    let builds = vault
        .transcripts()
        .list(&RunFilter::all().with_flow("build"))
        .unwrap();
    assert_eq!(builds.len(), 2);

    let running = vault
        .transcripts()
        .list(&RunFilter::all().with_status(RunStatus::Running))
        .unwrap();
    assert_eq!(running.len(), 1);
    assert_eq!(running[0].run_id, "2026-01-03-deploy-c");

    let limited = vault
        .transcripts()
        .list(&RunFilter::all().with_limit(1))
        .unwrap();
    assert_eq!(limited.len(), 1);
}

#[test]
fn test_observer_sees_ended_runs() {
    let (_dir, vault) = open_vault();
    let ended = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ended);
    vault.add_observer(Arc::new(move |meta: &RunMetadata| {
        assert!(meta.ended_at.is_some());
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    complete_run(&vault, "r1");
    complete_run(&vault, "r2");
    assert_eq!(ended.load(Ordering::SeqCst), 2);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_cleanup_archive_and_restore_cycle() {
    let dir = TempDir::new().unwrap();
    let config = VaultConfig::default()
        .with_retention(RetentionPolicy::default().with_keep_min_runs(0));
    let vault = Vault::open_with_config(dir.path(), config.clone()).unwrap();
    complete_run(&vault, "2026-01-05-build-old");

    // Ten days later the run is past archive_after_days but inside retention
    let later = Arc::new(MockClock::new(Utc::now() + Duration::days(10)));
    let vault = Vault::open_with_config(dir.path(), config)
        .unwrap()
        .with_clock(later);

    let preview = vault.lifecycle().cleanup(true).unwrap();
    assert_eq!(preview.archived, vec!["2026-01-05-build-old".to_string()]);
    assert!(vault.paths().run_dir("2026-01-05-build-old").exists());

    let report = vault.lifecycle().cleanup(false).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.archived, vec!["2026-01-05-build-old".to_string()]);
    assert!(report.archive_bytes_written > 0);
    assert!(!vault.paths().run_dir("2026-01-05-build-old").exists());
    assert_eq!(
        vault.lifecycle().list_archives().unwrap(),
        vec!["2026-01-05-build-old".to_string()]
    );

    let usage = vault.lifecycle().disk_usage().unwrap();
    assert_eq!(usage.run_count, 0);
    assert_eq!(usage.archive_count, 1);

    vault
        .lifecycle()
        .restore_archive("2026-01-05-build-old")
        .unwrap();
    let transcript = vault.transcripts().load("2026-01-05-build-old").unwrap();
    assert_eq!(transcript.turns.len(), 2);
    assert_eq!(
        vault
            .artifacts()
            .load_artifact("2026-01-05-build-old", "spec.md")
            .unwrap()
            .len(),
        800
    );
    assert!(vault.lifecycle().list_archives().unwrap().is_empty());
}

#[test]
fn test_active_runs_survive_cleanup() {
    let dir = TempDir::new().unwrap();
    let config = VaultConfig::default().with_retention(
        RetentionPolicy::default()
            .with_keep_min_runs(0)
            .with_retention_days(1)
            .with_archive_after_days(1),
    );
    let vault = Vault::open_with_config(dir.path(), config.clone()).unwrap();
    vault
        .transcripts()
        .start_run("r-live", NewRun::for_flow("build"))
        .unwrap();

    let later = Arc::new(MockClock::new(Utc::now() + Duration::days(60)));
    let aged = Vault::open_with_config(dir.path(), config)
        .unwrap()
        .with_clock(later);
    let report = aged.lifecycle().cleanup(false).unwrap();
    assert!(report.archived.is_empty());
    assert!(report.deleted.is_empty());
    assert_eq!(report.kept, vec!["r-live".to_string()]);

    // The original handle can still finish the run
    vault
        .transcripts()
        .record_turn("r-live", Turn::user("still here"))
        .unwrap();
    vault
        .transcripts()
        .end_run("r-live", RunStatus::Completed)
        .unwrap();
}

#[test]
fn test_delete_removes_everything() {
    let (_dir, vault) = open_vault();
    complete_run(&vault, "r1");
    vault.transcripts().delete("r1").unwrap();

    assert!(vault.transcripts().load("r1").unwrap_err().is_not_found());
    assert!(vault.artifacts().list_artifacts("r1").unwrap().is_empty());
    assert!(!vault.paths().run_dir("r1").exists());
    assert_eq!(vault.lifecycle().disk_usage().unwrap().run_count, 0);
}
