//! runvault CLI: inspect and maintain a run artifact store.
//!
//! `runvault [--base DIR] [--json] [-v] COMMAND` runs a single command and
//! exits. Diagnostics go to stderr through `tracing`; results go to stdout.

mod commands;
mod format;
mod parse;

use std::path::{Path, PathBuf};
use std::process;

use runvault_core::Result;
use runvault_engine::{Vault, VaultConfig, CONFIG_FILE_NAME};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use format::{
    format_artifacts, format_bundle, format_error, format_hits, format_ids, format_report,
    format_restore, format_run, format_runs, format_usage, OutputMode,
};
use parse::{matches_to_action, CliAction};

const DEFAULT_BASE: &str = ".runvault";

fn main() {
    let matches = build_cli().get_matches();

    init_tracing(matches.get_count("verbose"));

    let mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let base = matches
        .get_one::<String>("base")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BASE));

    let action = match matches_to_action(&matches) {
        Ok(action) => action,
        Err(msg) => {
            eprintln!("(error) {}", msg);
            process::exit(2);
        }
    };

    match execute(&base, action, mode) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("{}", format_error(&e, mode));
            process::exit(1);
        }
    }
}

/// `RUST_LOG` wins; otherwise `-v` raises the level from warn.
fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn execute(base: &Path, action: CliAction, mode: OutputMode) -> Result<String> {
    let vault = Vault::open(base)?;
    debug!(target: "runvault::cli", root = %base.display(), action = ?action, "Dispatching");

    let output = match action {
        CliAction::Init => init_store(&vault, base, mode)?,
        CliAction::Cleanup { dry_run } => {
            let report = vault.lifecycle().cleanup(dry_run)?;
            format_report(&report, dry_run, mode)
        }
        CliAction::CleanupArchives { dry_run } => {
            let report = vault.lifecycle().cleanup_archives(dry_run)?;
            format_report(&report, dry_run, mode)
        }
        CliAction::Archive { run_id } => {
            let bundle = vault.lifecycle().archive_run(&run_id)?;
            format_bundle(&run_id, &bundle, mode)
        }
        CliAction::Restore { run_id } => {
            let info = vault.lifecycle().restore_archive(&run_id)?;
            format_restore(&run_id, &info, mode)
        }
        CliAction::Archives => format_ids(&vault.lifecycle().list_archives()?, mode),
        CliAction::DeleteArchive { run_id } => {
            vault.lifecycle().delete_archive(&run_id)?;
            match mode {
                OutputMode::Json => format_ids(&[run_id], mode),
                OutputMode::Human => format!("deleted archive {}", run_id),
            }
        }
        CliAction::DiskUsage => format_usage(&vault.lifecycle().disk_usage()?, mode),
        CliAction::List(filter) => format_runs(&vault.transcripts().list(&filter)?, mode),
        CliAction::Show { run_id } => {
            format_run(&vault.transcripts().load_metadata(&run_id)?, mode)
        }
        CliAction::Artifacts { run_id } => {
            format_artifacts(&vault.artifacts().list_artifacts(&run_id)?, mode)
        }
        CliAction::Search(query) => format_hits(&vault.transcripts().search(&query)?, mode),
    };
    Ok(output)
}

fn init_store(vault: &Vault, base: &Path, mode: OutputMode) -> Result<String> {
    let written = VaultConfig::write_default_if_missing(&base.join(CONFIG_FILE_NAME))?;
    let root = vault.paths().root().display().to_string();
    Ok(match mode {
        OutputMode::Json => serde_json::json!({
            "root": root,
            "config_written": written,
        })
        .to_string(),
        OutputMode::Human if written => format!("initialized store at {}", root),
        OutputMode::Human => format!("store at {} already initialized", root),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use runvault_core::{NewRun, RunStatus};
    use runvault_engine::SearchQuery;

    #[test]
    fn init_writes_config_once() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("store");

        let out = execute(&base, CliAction::Init, OutputMode::Human).unwrap();
        assert!(out.starts_with("initialized store"));
        assert!(base.join(CONFIG_FILE_NAME).exists());

        let again = execute(&base, CliAction::Init, OutputMode::Human).unwrap();
        assert!(again.contains("already initialized"));
    }

    #[test]
    fn archive_then_restore_through_commands() {
        let dir = tempfile::tempdir().unwrap();
        let vault = Vault::open(dir.path()).unwrap();
        vault
            .transcripts()
            .start_run("2026-01-05-flow-aa", NewRun::for_flow("flow"))
            .unwrap();
        vault
            .transcripts()
            .end_run("2026-01-05-flow-aa", RunStatus::Completed)
            .unwrap();
        let id = "2026-01-05-flow-aa".to_string();

        let out = execute(
            dir.path(),
            CliAction::Archive { run_id: id.clone() },
            OutputMode::Human,
        )
        .unwrap();
        assert!(out.starts_with("archived 2026-01-05-flow-aa"));

        let listed = execute(dir.path(), CliAction::Archives, OutputMode::Json).unwrap();
        let ids: Vec<String> = serde_json::from_str(&listed).unwrap();
        assert_eq!(ids, vec![id.clone()]);

        execute(dir.path(), CliAction::Restore { run_id: id.clone() }, OutputMode::Human)
            .unwrap();
        let shown = execute(dir.path(), CliAction::Show { run_id: id }, OutputMode::Human).unwrap();
        assert!(shown.contains("status:     completed"));
    }

    #[test]
    fn missing_run_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = execute(
            dir.path(),
            CliAction::Show {
                run_id: "nope".to_string(),
            },
            OutputMode::Human,
        )
        .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn empty_search_pattern_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = execute(dir.path(), CliAction::Search(SearchQuery::new("")), OutputMode::Human);
        assert!(result.is_err());
    }
}
