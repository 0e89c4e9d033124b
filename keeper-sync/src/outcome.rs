//! Batch results shared by the update and repair executors.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use keeper_core::{CommitInfo, TrackedFile, VersionRecord, VersionStore};

use crate::baseline;
use crate::classify::IntegrityReport;
use crate::replace::remove_backups;

/// A tracked file that was written, with the backup of its previous content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedFile {
    pub file: TrackedFile,
    pub backup: Option<PathBuf>,
}

/// A tracked file that could not be written, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    pub file: TrackedFile,
    pub cause: String,
}

/// Result of deleting backups after a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackupCleanup {
    /// Backups were left in place on request.
    pub kept: bool,
    pub removed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// What an update or repair batch did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub commit: CommitInfo,
    pub applied: Vec<AppliedFile>,
    pub failed: Vec<FailedFile>,
    /// The recorded commit now equals [`BatchOutcome::commit`].
    pub commit_advanced: bool,
    /// Set when the version record changed but could not be saved.
    pub save_error: Option<String>,
    pub backups: BackupCleanup,
}

impl BatchOutcome {
    /// Every file was written and the record persisted.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.save_error.is_none()
    }
}

/// Collects per-file results while a batch runs, then settles the record.
pub(crate) struct BatchLog {
    commit: CommitInfo,
    applied: Vec<AppliedFile>,
    failed: Vec<FailedFile>,
    written: BTreeMap<TrackedFile, String>,
}

impl BatchLog {
    pub(crate) fn new(commit: &CommitInfo) -> Self {
        Self {
            commit: commit.clone(),
            applied: Vec::new(),
            failed: Vec::new(),
            written: BTreeMap::new(),
        }
    }

    pub(crate) fn applied(
        &mut self,
        record: &mut VersionRecord,
        file: &TrackedFile,
        hash: String,
        backup: Option<PathBuf>,
    ) {
        record.record_hash(file, hash.clone());
        self.written.insert(file.clone(), hash);
        self.applied.push(AppliedFile {
            file: file.clone(),
            backup,
        });
    }

    pub(crate) fn failed(&mut self, file: &TrackedFile, cause: impl ToString) {
        let cause = cause.to_string();
        tracing::warn!(file = %file, %cause, "write failed");
        self.failed.push(FailedFile {
            file: file.clone(),
            cause,
        });
    }

    /// Settle the record against `report`, save it once if it changed, and
    /// clean up backups of written files unless `keep_backups`.
    pub(crate) fn finish(
        self,
        report: &IntegrityReport,
        before: &VersionRecord,
        record: &mut VersionRecord,
        store: &VersionStore,
        keep_backups: bool,
    ) -> BatchOutcome {
        let commit_advanced = baseline::settle(record, report, &self.written);

        let mut save_error = None;
        if record != before {
            if let Err(err) = store.save(record) {
                tracing::warn!(path = %store.path().display(), error = %err, "version record not saved");
                save_error = Some(err.to_string());
            }
        }

        let backups = if keep_backups {
            BackupCleanup {
                kept: true,
                ..BackupCleanup::default()
            }
        } else {
            remove_backups(self.applied.iter().filter_map(|a| a.backup.as_deref()))
        };

        BatchOutcome {
            commit: self.commit,
            applied: self.applied,
            failed: self.failed,
            commit_advanced,
            save_error,
            backups,
        }
    }
}
