//! Default mode: check, show the latest commit, and ask before updating.

use std::io::{BufRead, Write};
use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;

use keeper_sync::{Installation, InstallationStatus, UpdateOptions};
use keeper_remote::RemoteSource;

use super::{update, Session};
use crate::output;

pub fn run(session: &Session, input: &mut dyn BufRead, out: &mut dyn Write) -> Result<ExitCode> {
    prompt_update(&session.installation, session.keep_backups, input, out)
}

fn prompt_update<R: RemoteSource>(
    installation: &Installation<R>,
    keep_backups: bool,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    let rule = "=".repeat(70);
    writeln!(out, "{rule}")?;
    writeln!(out, "{}", "KEEPER - AUTO UPDATER".bold())?;
    writeln!(out, "{rule}")?;
    writeln!(out)?;

    let checked = match installation.check() {
        Ok(checked) => checked,
        Err(err) => {
            writeln!(out, "Error checking for updates: {err}")?;
            writeln!(out, "You can still use the current version of the tool.")?;
            return Ok(ExitCode::FAILURE);
        }
    };
    let report = &checked.report;

    match report.status() {
        InstallationStatus::Healthy => {
            writeln!(out, "You have the latest version!")?;
            return Ok(ExitCode::SUCCESS);
        }
        InstallationStatus::FirstRun => {
            output::print_report(out, report)?;
            writeln!(out, "No version has been recorded for this installation yet.")?;
            writeln!(
                out,
                "Run 'keeper --verify' to record it, or 'keeper --update --force' to install {}.",
                report.commit.id.short()
            )?;
            return Ok(ExitCode::SUCCESS);
        }
        InstallationStatus::NeedsRepair => {
            output::print_report(out, report)?;
            writeln!(
                out,
                "Some files are missing or corrupted; run 'keeper --repair' before updating."
            )?;
            return Ok(ExitCode::FAILURE);
        }
        InstallationStatus::UpdateAvailable => {}
    }

    writeln!(out, "{}", "Update Available!".yellow().bold())?;
    output::print_commit(out, &report.commit)?;
    writeln!(out)?;

    if !confirm(input, out, "Do you want to update now? (Y/N): ")? {
        writeln!(out, "Update skipped. You can run the updater again later.")?;
        return Ok(ExitCode::SUCCESS);
    }

    let options = UpdateOptions {
        keep_backups,
        force: false,
    };
    match installation.update(options) {
        Ok(run) => update::render(out, &run),
        Err(err) => {
            writeln!(out, "\nUpdate failed: {err}")?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Ask until the answer is Y or N. End of input counts as N.
fn confirm(input: &mut dyn BufRead, out: &mut dyn Write, question: &str) -> Result<bool> {
    loop {
        write!(out, "{question}")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            return Ok(false);
        }
        match line.trim().to_ascii_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            _ => writeln!(out, "Please enter Y or N.")?,
        }
    }
}
