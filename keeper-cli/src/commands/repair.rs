//! `keeper --repair`: restore missing and corrupted files only.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use serde::Serialize;

use keeper_sync::{BatchOutcome, RepairOptions, RepairRun};

use super::{exit_code, Session};
use crate::output::{self, ReportJson};

#[derive(Serialize)]
struct RepairJson<'a> {
    status: &'static str,
    report: ReportJson<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<&'a BatchOutcome>,
}

pub fn run(session: &Session) -> Result<ExitCode> {
    let options = RepairOptions {
        keep_backups: session.keep_backups,
    };
    let run = session
        .installation
        .repair(options)
        .context("error during repair")?;

    let mut out = io::stdout().lock();
    if session.json {
        let (status, report, outcome) = match &run {
            RepairRun::NothingToRepair { report } => ("healthy", report, None),
            RepairRun::Repaired { report, outcome } if outcome.is_success() => {
                ("repaired", report, Some(outcome))
            }
            RepairRun::Repaired { report, outcome } => ("partial", report, Some(outcome)),
        };
        output::print_json(
            &mut out,
            &RepairJson {
                status,
                report: ReportJson::new(report),
                outcome,
            },
        )?;
        return Ok(exit_code(outcome.map_or(true, BatchOutcome::is_success)));
    }

    match &run {
        RepairRun::NothingToRepair { .. } => {
            writeln!(out, "Installation is healthy - no repairs needed.")?;
            Ok(ExitCode::SUCCESS)
        }
        RepairRun::Repaired { report, outcome } => {
            writeln!(
                out,
                "Found {} missing and {} corrupted files",
                report.missing().len(),
                report.corrupted().len()
            )?;
            output::print_outcome(&mut out, "Repair", outcome)?;
            if !outcome.failed.is_empty() {
                let names: Vec<String> = outcome.failed.iter().map(|f| f.file.to_string()).collect();
                writeln!(out, "Failed repairs: {}", names.join(", "))?;
            }
            Ok(exit_code(outcome.is_success()))
        }
    }
}
