//! Result → human/json string formatting.
//!
//! - **Human** (default): aligned plain text
//! - **JSON** (`--json`): `serde_json::to_string_pretty`

use runvault_core::{ArtifactInfo, Error, RunMetadata};
use runvault_durability::{BundleInfo, CleanupReport, DiskUsage, ExtractInfo};
use runvault_engine::SearchHit;
use serde::Serialize;

/// Output formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Format an error.
pub fn format_error(err: &Error, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => json(&serde_json::json!({ "error": err.to_string() })),
        OutputMode::Human => format!("(error) {}", err),
    }
}

fn json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

/// Format a cleanup report.
pub fn format_report(report: &CleanupReport, dry_run: bool, mode: OutputMode) -> String {
    if mode == OutputMode::Json {
        return json(report);
    }
    let mut out = String::new();
    if dry_run {
        out.push_str("(dry run)\n");
    }
    for id in &report.archived {
        out.push_str(&format!("archived  {}\n", id));
    }
    for id in &report.deleted {
        out.push_str(&format!("deleted   {}\n", id));
    }
    for failure in &report.errors {
        out.push_str(&format!("error     {}: {}\n", failure.run_id, failure.error));
    }
    out.push_str(&format!(
        "{} archived, {} deleted, {} kept, {} errors, {} reclaimed",
        report.archived.len(),
        report.deleted.len(),
        report.kept.len(),
        report.errors.len(),
        human_bytes(report.space_saved),
    ));
    if report.archive_bytes_written > 0 {
        out.push_str(&format!(
            " ({} written to archives)",
            human_bytes(report.archive_bytes_written)
        ));
    }
    out
}

/// Format the result of archiving one run.
pub fn format_bundle(run_id: &str, bundle: &BundleInfo, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => json(&serde_json::json!({
            "run_id": run_id,
            "path": bundle.path.display().to_string(),
            "files": bundle.file_count,
            "original_bytes": bundle.original_bytes,
            "bundle_bytes": bundle.bundle_bytes,
        })),
        OutputMode::Human => format!(
            "archived {} → {} ({} files, {} → {})",
            run_id,
            bundle.path.display(),
            bundle.file_count,
            human_bytes(bundle.original_bytes),
            human_bytes(bundle.bundle_bytes),
        ),
    }
}

/// Format the result of restoring one run.
pub fn format_restore(run_id: &str, info: &ExtractInfo, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => json(&serde_json::json!({
            "run_id": run_id,
            "files": info.files,
            "bytes": info.bytes,
        })),
        OutputMode::Human => format!(
            "restored {} ({} files, {})",
            run_id,
            info.files,
            human_bytes(info.bytes)
        ),
    }
}

/// Format a list of ids (archives).
pub fn format_ids(ids: &[String], mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => json(ids),
        OutputMode::Human if ids.is_empty() => "(empty)".to_string(),
        OutputMode::Human => ids.join("\n"),
    }
}

/// Format disk usage.
pub fn format_usage(usage: &DiskUsage, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => json(usage),
        OutputMode::Human => format!(
            "runs      {:>6}  {:>10}\narchives  {:>6}  {:>10}\ntotal             {:>10}",
            usage.run_count,
            human_bytes(usage.active_size),
            usage.archive_count,
            human_bytes(usage.archive_size),
            human_bytes(usage.total_size),
        ),
    }
}

/// Format a run listing.
pub fn format_runs(runs: &[RunMetadata], mode: OutputMode) -> String {
    if mode == OutputMode::Json {
        return json(runs);
    }
    if runs.is_empty() {
        return "(empty)".to_string();
    }
    runs.iter()
        .map(|m| {
            format!(
                "{:<40} {:<10} {:<16} {}",
                m.run_id,
                m.status,
                m.flow_id,
                m.started_at.format("%Y-%m-%d %H:%M:%S")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format one run's metadata.
pub fn format_run(meta: &RunMetadata, mode: OutputMode) -> String {
    if mode == OutputMode::Json {
        return json(meta);
    }
    let mut lines = vec![
        format!("run:        {}", meta.run_id),
        format!("flow:       {}", meta.flow_id),
        format!("status:     {}", meta.status),
        format!("started:    {}", meta.started_at.to_rfc3339()),
    ];
    if let Some(ended) = meta.ended_at {
        lines.push(format!("ended:      {}", ended.to_rfc3339()));
    }
    lines.push(format!("turns:      {}", meta.turn_count));
    lines.push(format!(
        "tokens:     {} in / {} out",
        meta.total_tokens_in, meta.total_tokens_out
    ));
    lines.push(format!("cost:       {:.4}", meta.total_cost));
    if let Some(error) = &meta.error {
        lines.push(format!("error:      {}", error));
    }
    for (k, v) in &meta.labels {
        lines.push(format!("label:      {}={}", k, v));
    }
    lines.join("\n")
}

/// Format a run's artifacts.
pub fn format_artifacts(artifacts: &[ArtifactInfo], mode: OutputMode) -> String {
    if mode == OutputMode::Json {
        return json(artifacts);
    }
    if artifacts.is_empty() {
        return "(empty)".to_string();
    }
    artifacts
        .iter()
        .map(|a| {
            format!(
                "{:<40} {:<14} {:>10}{}",
                a.name,
                a.artifact_type,
                human_bytes(a.size),
                if a.compressed { "  (gz)" } else { "" }
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format search hits.
pub fn format_hits(hits: &[SearchHit], mode: OutputMode) -> String {
    if mode == OutputMode::Json {
        return json(hits);
    }
    if hits.is_empty() {
        return "(no matches)".to_string();
    }
    hits.iter()
        .map(|h| match h.line {
            Some(line) => format!("{}:{}: {}", h.run_id, line, h.text),
            None => format!("{}: {}", h.run_id, h.text),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
