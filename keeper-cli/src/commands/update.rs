//! `keeper --update [--force]`: apply available updates without prompting.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use serde::Serialize;

use keeper_sync::{BatchOutcome, UpdateOptions, UpdateRun};

use super::{exit_code, Session};
use crate::output::{self, ReportJson};

#[derive(Serialize)]
struct UpdateJson<'a> {
    status: &'static str,
    report: ReportJson<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<&'a BatchOutcome>,
}

pub fn run(session: &Session, force: bool) -> Result<ExitCode> {
    let options = UpdateOptions {
        keep_backups: session.keep_backups,
        force,
    };
    let run = session
        .installation
        .update(options)
        .context("update failed")?;

    let mut out = io::stdout().lock();
    if session.json {
        let (status, report, outcome) = match &run {
            UpdateRun::UpToDate { report } => ("up-to-date", report, None),
            UpdateRun::Applied { report, outcome } if outcome.is_success() => {
                ("updated", report, Some(outcome))
            }
            UpdateRun::Applied { report, outcome } => ("partial", report, Some(outcome)),
        };
        output::print_json(
            &mut out,
            &UpdateJson {
                status,
                report: ReportJson::new(report),
                outcome,
            },
        )?;
        return Ok(exit_code(outcome.map_or(true, BatchOutcome::is_success)));
    }

    render(&mut out, &run)
}

/// Human rendering shared with the interactive prompt.
pub fn render(out: &mut dyn Write, run: &UpdateRun) -> Result<ExitCode> {
    match run {
        UpdateRun::UpToDate { .. } => {
            writeln!(out, "You have the latest version!")?;
            Ok(ExitCode::SUCCESS)
        }
        UpdateRun::Applied { report, outcome } => {
            if outcome.applied.is_empty() && outcome.failed.is_empty() {
                writeln!(out, "No file changes detected.")?;
            } else {
                writeln!(out, "Updating files...")?;
            }
            output::print_outcome(out, "Update", outcome)?;
            if report.needs_repair() {
                writeln!(
                    out,
                    "Some files are missing or corrupted; run 'keeper --repair' to restore them."
                )?;
            } else if !outcome.commit_advanced && outcome.is_success() {
                writeln!(
                    out,
                    "Local files differ from {}; run 'keeper --update --force' to adopt it.",
                    report.commit.id.short()
                )?;
            }
            Ok(exit_code(outcome.is_success()))
        }
    }
}
