//! ArgMatches → CliAction conversion.

use clap::ArgMatches;
use runvault_core::RunStatus;
use runvault_engine::{RunFilter, SearchQuery};

/// The result of parsing the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum CliAction {
    /// Create the layout and default config
    Init,
    /// Retention pass over run directories
    Cleanup { dry_run: bool },
    /// Retention pass over archives
    CleanupArchives { dry_run: bool },
    /// Archive one run
    Archive { run_id: String },
    /// Restore one run
    Restore { run_id: String },
    /// List archived runs
    Archives,
    /// Delete one archive
    DeleteArchive { run_id: String },
    /// Disk usage
    DiskUsage,
    /// List runs
    List(RunFilter),
    /// Show one run's metadata
    Show { run_id: String },
    /// List one run's artifacts
    Artifacts { run_id: String },
    /// Search transcripts
    Search(SearchQuery),
}

/// Convert parsed subcommand matches into an action.
pub fn matches_to_action(matches: &ArgMatches) -> Result<CliAction, String> {
    let (name, sub) = matches
        .subcommand()
        .ok_or_else(|| "no command given".to_string())?;

    let action = match name {
        "init" => CliAction::Init,
        "cleanup" => CliAction::Cleanup {
            dry_run: sub.get_flag("dry-run"),
        },
        "cleanup-archives" => CliAction::CleanupArchives {
            dry_run: sub.get_flag("dry-run"),
        },
        "archive" => CliAction::Archive {
            run_id: required(sub, "run_id")?,
        },
        "restore" => CliAction::Restore {
            run_id: required(sub, "run_id")?,
        },
        "archives" => CliAction::Archives,
        "delete-archive" => CliAction::DeleteArchive {
            run_id: required(sub, "run_id")?,
        },
        "du" => CliAction::DiskUsage,
        "list" => {
            let mut filter = RunFilter::all();
            if let Some(flow) = sub.get_one::<String>("flow") {
                filter = filter.with_flow(flow.clone());
            }
            if let Some(status) = sub.get_one::<String>("status") {
                let status: RunStatus = status
                    .parse()
                    .map_err(|_| format!("unknown status '{}'", status))?;
                filter = filter.with_status(status);
            }
            if let Some(limit) = sub.get_one::<usize>("limit") {
                filter = filter.with_limit(*limit);
            }
            CliAction::List(filter)
        }
        "show" => CliAction::Show {
            run_id: required(sub, "run_id")?,
        },
        "artifacts" => CliAction::Artifacts {
            run_id: required(sub, "run_id")?,
        },
        "search" => {
            let mut query = SearchQuery::new(required(sub, "pattern")?);
            if sub.get_flag("ignore-case") {
                query = query.ignore_case();
            }
            if let Some(limit) = sub.get_one::<usize>("limit") {
                query = query.with_limit(*limit);
            }
            CliAction::Search(query)
        }
        other => return Err(format!("unknown command '{}'", other)),
    };
    Ok(action)
}

fn required(matches: &ArgMatches, name: &str) -> Result<String, String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .ok_or_else(|| format!("missing argument <{}>", name))
}
