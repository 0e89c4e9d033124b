//! Keeper: updater and integrity keeper for a tracked tool installation.
//!
//! # Usage
//!
//! ```text
//! keeper [--root <dir>] [--config <file>] [--json] [--keep-backups]
//! keeper --check
//! keeper --update [--force]
//! keeper --verify
//! keeper --repair
//! ```
//!
//! Without a mode flag keeper checks and asks before updating.

mod commands;
mod output;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Parser};
use colored::Colorize;

use commands::{Mode, Session};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "keeper",
    version,
    about = "Keep a tracked tool installation in sync with its repository",
    long_about = None,
    group(ArgGroup::new("mode").args(["check", "update", "verify", "repair"])),
)]
struct Cli {
    /// Report status without changing anything.
    #[arg(long)]
    check: bool,

    /// Apply every available update.
    #[arg(long)]
    update: bool,

    /// With --update, overwrite every file that differs from the remote.
    #[arg(long, requires = "update")]
    force: bool,

    /// Report integrity; records a baseline on a first run that matches the remote.
    #[arg(long)]
    verify: bool,

    /// Restore missing and corrupted files only.
    #[arg(long)]
    repair: bool,

    /// Leave `.backup` copies next to replaced files.
    #[arg(long)]
    keep_backups: bool,

    /// Installation root.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Config file to use instead of `<root>/keeper.yaml`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn mode(&self) -> Mode {
        if self.check {
            Mode::Check
        } else if self.update {
            Mode::Update { force: self.force }
        } else if self.verify {
            Mode::Verify
        } else if self.repair {
            Mode::Repair
        } else {
            Mode::Interactive
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let mode = cli.mode();
    let json = cli.json;

    let result = Session::open(&cli.root, cli.config.as_deref(), json, cli.keep_backups)
        .and_then(|session| session.run(mode));

    match result {
        Ok(code) => code,
        Err(err) => {
            tracing::debug!(error = ?err, "aborted");
            if json {
                let mut stdout = io::stdout().lock();
                let _ = output::print_error_json(&mut stdout, &format!("{err:#}"));
                let _ = stdout.flush();
            } else {
                eprintln!("{} {err:#}", "error:".red().bold());
            }
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr so stdout stays clean for `--json`. `RUST_LOG` overrides
/// the default `warn` level.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}
