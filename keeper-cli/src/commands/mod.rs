pub mod check;
pub mod interactive;
pub mod repair;
pub mod update;
pub mod verify;

use std::io;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};

use keeper_core::UpdaterConfig;
use keeper_remote::GitHubClient;
use keeper_sync::Installation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Check,
    Update { force: bool },
    Verify,
    Repair,
    Interactive,
}

/// Everything a mode needs: the installation plus output switches.
pub struct Session {
    pub installation: Installation<GitHubClient>,
    pub json: bool,
    pub keep_backups: bool,
}

impl Session {
    pub fn open(
        root: &Path,
        config: Option<&Path>,
        json: bool,
        keep_backups: bool,
    ) -> Result<Self> {
        let config = match config {
            Some(path) => UpdaterConfig::load_from(path),
            None => UpdaterConfig::load_at(root),
        }
        .context("failed to load config")?;
        tracing::debug!(
            root = %root.display(),
            repository = %format!("{}/{}", config.repository.owner, config.repository.name),
            branch = %config.repository.branch,
            "session"
        );

        let remote = GitHubClient::new(&config);
        Ok(Self {
            installation: Installation::new(root, config, remote),
            json,
            keep_backups,
        })
    }

    pub fn run(self, mode: Mode) -> Result<ExitCode> {
        match mode {
            Mode::Check => check::run(&self),
            Mode::Update { force } => update::run(&self, force),
            Mode::Verify => verify::run(&self),
            Mode::Repair => repair::run(&self),
            // No prompt when the output is for a machine.
            Mode::Interactive if self.json => check::run(&self),
            Mode::Interactive => {
                let stdin = io::stdin();
                interactive::run(&self, &mut stdin.lock(), &mut io::stdout().lock())
            }
        }
    }
}

/// Exit status for a finished mode.
pub fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
