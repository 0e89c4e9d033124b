//! `keeper --check`: report status, change nothing.

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};

use super::Session;
use crate::output::{self, ReportJson};

pub fn run(session: &Session) -> Result<ExitCode> {
    let checked = session
        .installation
        .check()
        .context("failed to check for updates")?;
    let report = &checked.report;

    let mut out = io::stdout().lock();
    if session.json {
        output::print_json(&mut out, &ReportJson::new(report))?;
        return Ok(ExitCode::SUCCESS);
    }

    output::print_commit(&mut out, &report.commit)?;
    output::print_report(&mut out, report)?;
    Ok(ExitCode::SUCCESS)
}
