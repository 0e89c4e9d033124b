//! Per-file integrity classification.
//!
//! Decision order for each tracked file:
//! 1. Remote fetch failed: `Missing` if the file is also absent, else `FetchError`.
//! 2. File absent on disk: `Missing`.
//! 3. First run (no recorded commit): `Healthy`. Local content that differs
//!    from the remote is pre-existing, never corruption.
//! 4. Live hash equals remote hash: `Healthy`.
//! 5. Live hash differs from the recorded hash: `Corrupted` (edited outside keeper).
//! 6. Recorded commit equals the latest commit: `Corrupted` (same version, different bytes).
//! 7. Otherwise: `UpdateAvailable`.

use std::fmt;

use serde::Serialize;

use keeper_core::{CommitId, CommitInfo, TrackedFile, VersionRecord};

use crate::snapshot::{RemoteFile, RemoteSnapshot};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Integrity verdict for one tracked file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum FileStatus {
    Healthy,
    Missing,
    Corrupted {
        local_hash: String,
        remote_hash: String,
    },
    UpdateAvailable {
        #[serde(skip)]
        content: String,
        remote_hash: String,
    },
    FetchError {
        cause: String,
    },
}

impl FileStatus {
    pub fn label(&self) -> &'static str {
        match self {
            FileStatus::Healthy => "healthy",
            FileStatus::Missing => "missing",
            FileStatus::Corrupted { .. } => "corrupted",
            FileStatus::UpdateAvailable { .. } => "update-available",
            FileStatus::FetchError { .. } => "fetch-error",
        }
    }

    /// Missing, corrupted or unverifiable.
    pub fn needs_repair(&self) -> bool {
        matches!(
            self,
            FileStatus::Missing | FileStatus::Corrupted { .. } | FileStatus::FetchError { .. }
        )
    }
}

/// A verdict plus the raw hashes it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileClassification {
    pub file: TrackedFile,
    /// Hash stored in the version record.
    pub recorded: Option<String>,
    /// Hash of the file currently on disk.
    pub live: Option<String>,
    /// Hash of the remote content at the latest commit.
    pub remote: Option<String>,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileClassification {
    /// On-disk bytes are known to equal the remote copy.
    pub fn matches_remote(&self) -> bool {
        self.live.is_some() && self.live == self.remote
    }
}

/// Aggregate state of the installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstallationStatus {
    FirstRun,
    Healthy,
    UpdateAvailable,
    NeedsRepair,
}

impl fmt::Display for InstallationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InstallationStatus::FirstRun => "first-run",
            InstallationStatus::Healthy => "healthy",
            InstallationStatus::UpdateAvailable => "update-available",
            InstallationStatus::NeedsRepair => "needs-repair",
        };
        f.write_str(label)
    }
}

/// Classification of every tracked file against one remote commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub commit: CommitInfo,
    pub recorded_commit: Option<CommitId>,
    pub files: Vec<FileClassification>,
}

impl IntegrityReport {
    pub fn is_first_run(&self) -> bool {
        self.recorded_commit.is_none()
    }

    /// The recorded commit is not the latest remote commit.
    pub fn commit_changed(&self) -> bool {
        self.recorded_commit.as_ref() != Some(&self.commit.id)
    }

    /// First run outranks repair, which outranks a pending update.
    pub fn status(&self) -> InstallationStatus {
        if self.is_first_run() {
            InstallationStatus::FirstRun
        } else if self.needs_repair() {
            InstallationStatus::NeedsRepair
        } else if self.commit_changed() || !self.pending_updates().is_empty() {
            InstallationStatus::UpdateAvailable
        } else {
            InstallationStatus::Healthy
        }
    }

    pub fn needs_repair(&self) -> bool {
        self.files.iter().any(|c| c.status.needs_repair())
    }

    pub fn get(&self, file: &TrackedFile) -> Option<&FileClassification> {
        self.files.iter().find(|c| &c.file == file)
    }

    pub fn missing(&self) -> Vec<&TrackedFile> {
        self.select(|s| matches!(s, FileStatus::Missing))
    }

    pub fn corrupted(&self) -> Vec<&TrackedFile> {
        self.select(|s| matches!(s, FileStatus::Corrupted { .. }))
    }

    pub fn pending_updates(&self) -> Vec<&TrackedFile> {
        self.select(|s| matches!(s, FileStatus::UpdateAvailable { .. }))
    }

    pub fn fetch_errors(&self) -> Vec<&TrackedFile> {
        self.select(|s| matches!(s, FileStatus::FetchError { .. }))
    }

    fn select(&self, pred: impl Fn(&FileStatus) -> bool) -> Vec<&TrackedFile> {
        self.files
            .iter()
            .filter(|c| pred(&c.status))
            .map(|c| &c.file)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// classify
// ---------------------------------------------------------------------------

/// Classify every file in `tracked` (and only those) in order.
///
/// `live_hash` returns the current on-disk digest of a file, `None` when it
/// does not exist. Nothing here touches the filesystem or network directly.
pub fn classify<F>(
    tracked: &[TrackedFile],
    record: &VersionRecord,
    snapshot: &RemoteSnapshot,
    mut live_hash: F,
) -> IntegrityReport
where
    F: FnMut(&TrackedFile) -> Option<String>,
{
    let first_run = record.is_first_run();
    let same_commit = record.last_commit.as_ref() == Some(&snapshot.commit.id);

    let files = tracked
        .iter()
        .map(|file| {
            let recorded = record.recorded_hash(file).map(str::to_owned);
            let live = live_hash(file);
            let (remote, status) = match snapshot.get(file) {
                Err(cause) => {
                    let status = if live.is_none() {
                        FileStatus::Missing
                    } else {
                        FileStatus::FetchError {
                            cause: cause.to_owned(),
                        }
                    };
                    (None, status)
                }
                Ok(remote) => {
                    let status = decide(
                        first_run,
                        same_commit,
                        recorded.as_deref(),
                        live.as_deref(),
                        remote,
                    );
                    (Some(remote.hash.clone()), status)
                }
            };
            tracing::debug!(file = %file, status = status.label(), "classified");
            FileClassification {
                file: file.clone(),
                recorded,
                live,
                remote,
                status,
            }
        })
        .collect();

    IntegrityReport {
        commit: snapshot.commit.clone(),
        recorded_commit: record.last_commit.clone(),
        files,
    }
}

fn decide(
    first_run: bool,
    same_commit: bool,
    recorded: Option<&str>,
    live: Option<&str>,
    remote: &RemoteFile,
) -> FileStatus {
    let Some(live) = live else {
        return FileStatus::Missing;
    };
    if first_run || live == remote.hash {
        return FileStatus::Healthy;
    }
    let locally_modified = recorded.is_some_and(|recorded| recorded != live);
    if locally_modified || same_commit {
        return FileStatus::Corrupted {
            local_hash: live.to_owned(),
            remote_hash: remote.hash.clone(),
        };
    }
    FileStatus::UpdateAvailable {
        content: remote.content.clone(),
        remote_hash: remote.hash.clone(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
