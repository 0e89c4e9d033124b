//! Update executor: apply remote content for files behind the latest commit.

use std::path::{Path, PathBuf};

use keeper_core::{CommitInfo, TrackedFile, VersionRecord, VersionStore};

use crate::classify::{FileStatus, IntegrityReport};
use crate::outcome::{BatchLog, BatchOutcome};
use crate::replace::write_with_backup;
use crate::snapshot::RemoteSnapshot;

/// New content for one tracked file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWrite {
    pub file: TrackedFile,
    pub content: String,
    pub remote_hash: String,
}

/// Files to write, in tracked order, all taken from one commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateBatch {
    pub commit: CommitInfo,
    pub writes: Vec<PendingWrite>,
}

impl UpdateBatch {
    /// Every file classified `UpdateAvailable`.
    pub fn pending(report: &IntegrityReport) -> Self {
        let writes = report
            .files
            .iter()
            .filter_map(|c| match &c.status {
                FileStatus::UpdateAvailable {
                    content,
                    remote_hash,
                } => Some(PendingWrite {
                    file: c.file.clone(),
                    content: content.clone(),
                    remote_hash: remote_hash.clone(),
                }),
                _ => None,
            })
            .collect();
        Self {
            commit: report.commit.clone(),
            writes,
        }
    }

    /// Every file whose disk content differs from the fetched remote copy,
    /// whatever its classification. Files that failed to fetch are skipped.
    pub fn forced(report: &IntegrityReport, snapshot: &RemoteSnapshot) -> Self {
        let writes = report
            .files
            .iter()
            .filter(|c| !c.matches_remote())
            .filter_map(|c| {
                let remote = snapshot.get(&c.file).ok()?;
                Some(PendingWrite {
                    file: c.file.clone(),
                    content: remote.content.clone(),
                    remote_hash: remote.hash.clone(),
                })
            })
            .collect();
        Self {
            commit: snapshot.commit.clone(),
            writes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn files(&self) -> impl Iterator<Item = &TrackedFile> {
        self.writes.iter().map(|w| &w.file)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Leave `.backup` copies in place after a successful write.
    pub keep_backups: bool,
    /// Build the batch with [`UpdateBatch::forced`] instead of [`UpdateBatch::pending`].
    pub force: bool,
}

/// Writes an [`UpdateBatch`] under an install root.
pub struct UpdateExecutor<'a> {
    root: &'a Path,
    store: &'a VersionStore,
    options: UpdateOptions,
}

impl<'a> UpdateExecutor<'a> {
    pub fn new(root: &'a Path, store: &'a VersionStore, options: UpdateOptions) -> Self {
        Self {
            root,
            store,
            options,
        }
    }

    /// Apply `batch`, continuing past per-file failures.
    ///
    /// Hashes are recorded per written file; the commit is stamped only once
    /// the batch is done and every tracked file matches the remote. The
    /// record is saved once at the end.
    pub fn apply(
        &self,
        report: &IntegrityReport,
        batch: &UpdateBatch,
        record: &mut VersionRecord,
    ) -> BatchOutcome {
        let before = record.clone();
        let mut log = BatchLog::new(&batch.commit);

        for write in &batch.writes {
            let path: PathBuf = write.file.path_in(self.root);
            match write_with_backup(&path, &write.content) {
                Ok(backup) => {
                    tracing::info!(file = %write.file, "updated");
                    log.applied(record, &write.file, write.remote_hash.clone(), backup);
                }
                Err(err) => log.failed(&write.file, err),
            }
        }

        log.finish(report, &before, record, self.store, self.options.keep_backups)
    }
}
