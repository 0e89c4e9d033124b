//! Repair executor: restore missing and corrupted files from the latest commit.

use std::path::Path;

use keeper_core::hash::sha256_hex;
use keeper_core::{TrackedFile, VersionRecord, VersionStore};
use keeper_remote::RemoteSource;

use crate::classify::{FileStatus, IntegrityReport};
use crate::outcome::{BatchLog, BatchOutcome};
use crate::replace::replace_with_rollback;

/// Files a repair would touch for `report`, in tracked order.
pub fn targets(report: &IntegrityReport) -> Vec<&TrackedFile> {
    report
        .files
        .iter()
        .filter(|c| matches!(c.status, FileStatus::Missing | FileStatus::Corrupted { .. }))
        .map(|c| &c.file)
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairOptions {
    /// Leave `.backup` copies of replaced files in place.
    pub keep_backups: bool,
}

/// Restores files classified `Missing` or `Corrupted` and nothing else.
///
/// Content is fetched fresh at the report's commit, which is always the
/// latest remote commit of the current run.
pub struct RepairExecutor<'a, R> {
    root: &'a Path,
    store: &'a VersionStore,
    remote: R,
    options: RepairOptions,
}

impl<'a, R: RemoteSource> RepairExecutor<'a, R> {
    pub fn new(root: &'a Path, store: &'a VersionStore, remote: R, options: RepairOptions) -> Self {
        Self {
            root,
            store,
            remote,
            options,
        }
    }

    /// Repair every target, continuing past per-file failures.
    ///
    /// A failed file keeps its previous content (or stays absent) and its
    /// recorded hash is untouched, so it still needs repair next run.
    pub fn repair(&self, report: &IntegrityReport, record: &mut VersionRecord) -> BatchOutcome {
        let before = record.clone();
        let mut log = BatchLog::new(&report.commit);

        for file in targets(report) {
            let content = match self.remote.fetch_file(file, &report.commit.id) {
                Ok(content) => content,
                Err(err) => {
                    log.failed(file, format!("Failed to download {file}: {err}"));
                    continue;
                }
            };
            match replace_with_rollback(&file.path_in(self.root), &content) {
                Ok(backup) => {
                    tracing::info!(file = %file, "repaired");
                    log.applied(record, file, sha256_hex(content.as_bytes()), backup);
                }
                Err(err) => log.failed(file, err),
            }
        }

        log.finish(report, &before, record, self.store, self.options.keep_backups)
    }
}
