//! Human and JSON rendering shared by every mode.

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use keeper_core::{CommitId, CommitInfo, TrackedFile};
use keeper_sync::{
    BackupCleanup, BatchOutcome, FileClassification, FileStatus, InstallationStatus,
    IntegrityReport,
};

// ---------------------------------------------------------------------------
// Commit summary
// ---------------------------------------------------------------------------

pub fn print_commit(out: &mut dyn Write, commit: &CommitInfo) -> io::Result<()> {
    writeln!(out, "Latest version: {}", commit.id.short().bold())?;
    writeln!(out, "Commit message: {}", commit.message)?;
    writeln!(out, "Author: {}", commit.author)?;
    match commit.committed_at() {
        Some(at) => writeln!(out, "Date: {} ({} ago)", commit.date, format_age(at, Utc::now()))?,
        None => writeln!(out, "Date: {}", commit.date)?,
    }
    Ok(())
}

/// Compact age of `at` relative to `now`: `45s`, `3m`, `2h`, `5d`.
pub fn format_age(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(at).num_seconds().max(0) as u64;
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}

// ---------------------------------------------------------------------------
// Integrity report
// ---------------------------------------------------------------------------

#[derive(Tabled)]
struct FileRow {
    #[tabled(rename = "file")]
    file: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "detail")]
    detail: String,
}

pub fn status_label(status: InstallationStatus) -> String {
    match status {
        InstallationStatus::FirstRun => "FIRST RUN".cyan().bold().to_string(),
        InstallationStatus::Healthy => "HEALTHY".green().bold().to_string(),
        InstallationStatus::UpdateAvailable => "UPDATE AVAILABLE".yellow().bold().to_string(),
        InstallationStatus::NeedsRepair => "NEEDS REPAIR".red().bold().to_string(),
    }
}

fn file_detail(classification: &FileClassification) -> String {
    match &classification.status {
        FileStatus::Healthy => String::new(),
        FileStatus::Missing => "not on disk".to_string(),
        FileStatus::Corrupted {
            local_hash,
            remote_hash,
        } => format!("local {} != remote {}", short(local_hash), short(remote_hash)),
        FileStatus::UpdateAvailable { remote_hash, .. } => format!("remote {}", short(remote_hash)),
        FileStatus::FetchError { cause } => cause.clone(),
    }
}

fn short(hash: &str) -> &str {
    hash.get(..8).unwrap_or(hash)
}

pub fn print_report(out: &mut dyn Write, report: &IntegrityReport) -> io::Result<()> {
    writeln!(out, "Status: {}", status_label(report.status()))?;
    match &report.recorded_commit {
        Some(recorded) if report.commit_changed() => writeln!(
            out,
            "Installed: {}  Latest: {}",
            recorded.short(),
            report.commit.id.short()
        )?,
        Some(recorded) => writeln!(out, "Installed: {} (latest)", recorded.short())?,
        None => writeln!(out, "Installed: none recorded  Latest: {}", report.commit.id.short())?,
    }

    let rows: Vec<FileRow> = report
        .files
        .iter()
        .map(|c| FileRow {
            file: c.file.to_string(),
            status: c.status.label().to_string(),
            detail: file_detail(c),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    writeln!(out, "{table}")
}

// ---------------------------------------------------------------------------
// Batch outcome
// ---------------------------------------------------------------------------

pub fn print_outcome(out: &mut dyn Write, verb: &str, outcome: &BatchOutcome) -> io::Result<()> {
    for applied in &outcome.applied {
        writeln!(out, "  {} {}", "✓".green(), applied.file)?;
        if let Some(backup) = &applied.backup {
            writeln!(out, "    (backup: {})", backup.display())?;
        }
    }
    for failed in &outcome.failed {
        writeln!(out, "  {} {}: {}", "✗".red(), failed.file, failed.cause)?;
    }
    writeln!(
        out,
        "\n{verb} complete: {} written, {} failed",
        outcome.applied.len(),
        outcome.failed.len()
    )?;
    if outcome.commit_advanced {
        writeln!(out, "Now at {}", outcome.commit.id.short())?;
    }
    if let Some(err) = &outcome.save_error {
        writeln!(out, "{} version record not saved: {err}", "warning:".yellow().bold())?;
    }
    print_cleanup(out, &outcome.backups)
}

fn print_cleanup(out: &mut dyn Write, cleanup: &BackupCleanup) -> io::Result<()> {
    if cleanup.kept {
        return writeln!(out, "Backup files preserved (--keep-backups was specified)");
    }
    if !cleanup.removed.is_empty() {
        writeln!(out, "Cleaned up {} backup files", cleanup.removed.len())?;
    }
    if !cleanup.failed.is_empty() {
        writeln!(out, "Failed to clean up some backup files:")?;
        for (path, err) in &cleanup.failed {
            writeln!(out, "  {} {}: {err}", "✗".red(), path.display())?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON payloads
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ReportJson<'a> {
    pub status: InstallationStatus,
    pub is_first_run: bool,
    pub needs_repair: bool,
    pub updates_available: bool,
    pub commit: &'a CommitInfo,
    pub commit_age: Option<String>,
    pub recorded_commit: Option<&'a CommitId>,
    pub missing_files: Vec<&'a TrackedFile>,
    pub corrupted_files: Vec<&'a TrackedFile>,
    pub pending_updates: Vec<&'a TrackedFile>,
    pub fetch_errors: Vec<&'a TrackedFile>,
    pub files: &'a [FileClassification],
}

impl<'a> ReportJson<'a> {
    pub fn new(report: &'a IntegrityReport) -> Self {
        let status = report.status();
        Self {
            status,
            is_first_run: report.is_first_run(),
            needs_repair: report.needs_repair(),
            updates_available: status == InstallationStatus::UpdateAvailable,
            commit: &report.commit,
            commit_age: report
                .commit
                .committed_at()
                .map(|at| format_age(at, Utc::now())),
            recorded_commit: report.recorded_commit.as_ref(),
            missing_files: report.missing(),
            corrupted_files: report.corrupted(),
            pending_updates: report.pending_updates(),
            fetch_errors: report.fetch_errors(),
            files: &report.files,
        }
    }
}

#[derive(Serialize)]
struct ErrorJson<'a> {
    status: &'static str,
    message: &'a str,
}

pub fn print_json(out: &mut dyn Write, value: &impl Serialize) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    writeln!(out, "{text}")?;
    Ok(())
}

pub fn print_error_json(out: &mut dyn Write, message: &str) -> anyhow::Result<()> {
    print_json(
        out,
        &ErrorJson {
            status: "error",
            message,
        },
    )
}
