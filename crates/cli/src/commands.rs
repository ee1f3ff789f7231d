//! Clap command tree definition.

use clap::{value_parser, Arg, ArgAction, Command};

/// Build the complete CLI command tree.
pub fn build_cli() -> Command {
    Command::new("runvault")
        .about("Run artifact, transcript and retention store")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("base")
                .long("base")
                .help("Store base directory (default: .runvault)")
                .global(true),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("JSON output mode")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log more (-v info, -vv debug)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(Command::new("init").about("Create the store layout and a default runvault.toml"))
        .subcommand(
            Command::new("cleanup")
                .about("Apply the retention policy to run directories")
                .arg(dry_run()),
        )
        .subcommand(
            Command::new("cleanup-archives")
                .about("Purge archives older than archive_retention_days")
                .arg(dry_run()),
        )
        .subcommand(
            Command::new("archive")
                .about("Move one run into cold storage")
                .arg(run_id()),
        )
        .subcommand(
            Command::new("restore")
                .about("Restore an archived run")
                .arg(run_id()),
        )
        .subcommand(Command::new("archives").about("List archived runs"))
        .subcommand(
            Command::new("delete-archive")
                .about("Delete one archive")
                .arg(run_id()),
        )
        .subcommand(Command::new("du").about("Show disk usage of runs and archives"))
        .subcommand(
            Command::new("list")
                .about("List runs, newest first")
                .arg(Arg::new("flow").long("flow").help("Only runs of this flow"))
                .arg(
                    Arg::new("status")
                        .long("status")
                        .help("Only runs with this status (running, completed, failed, canceled)"),
                )
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .help("Maximum number of runs")
                        .value_parser(value_parser!(usize)),
                ),
        )
        .subcommand(
            Command::new("show")
                .about("Show a run's metadata")
                .arg(run_id()),
        )
        .subcommand(
            Command::new("artifacts")
                .about("List a run's artifacts")
                .arg(run_id()),
        )
        .subcommand(
            Command::new("search")
                .about("Search persisted transcripts for a literal string")
                .arg(Arg::new("pattern").required(true).help("Text to search for"))
                .arg(
                    Arg::new("ignore-case")
                        .short('i')
                        .long("ignore-case")
                        .action(ArgAction::SetTrue)
                        .help("Match regardless of case"),
                )
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .help("Maximum number of hits")
                        .value_parser(value_parser!(usize)),
                ),
        )
}

fn dry_run() -> Arg {
    Arg::new("dry-run")
        .long("dry-run")
        .help("Report what would happen without changing anything")
        .action(ArgAction::SetTrue)
}

fn run_id() -> Arg {
    Arg::new("run_id").required(true).help("Run id")
}
