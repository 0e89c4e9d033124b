//! `keeper --verify`: integrity report, with first-run baseline initialization.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use serde::Serialize;

use super::{exit_code, Session};
use crate::output::{self, ReportJson};

#[derive(Serialize)]
struct VerifyJson<'a> {
    #[serde(flatten)]
    report: ReportJson<'a>,
    initialized: bool,
    save_error: Option<&'a str>,
}

/// Exits 1 when any tracked file is missing, corrupted or unverifiable.
pub fn run(session: &Session) -> Result<ExitCode> {
    let verification = session
        .installation
        .verify()
        .context("failed to verify installation")?;
    let report = &verification.report;
    let code = exit_code(!report.needs_repair());

    let mut out = io::stdout().lock();
    if session.json {
        output::print_json(
            &mut out,
            &VerifyJson {
                report: ReportJson::new(report),
                initialized: verification.initialized,
                save_error: verification.save_error.as_deref(),
            },
        )?;
        return Ok(code);
    }

    output::print_report(&mut out, report)?;
    if verification.initialized {
        writeln!(
            out,
            "Version tracking initialized at {}.",
            report.commit.id.short()
        )?;
    }
    if let Some(err) = &verification.save_error {
        writeln!(out, "Could not save version tracking: {err}")?;
    }
    if report.needs_repair() {
        writeln!(out, "Run 'keeper --repair' to restore missing or corrupted files.")?;
    }
    Ok(code)
}
