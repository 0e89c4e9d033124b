//! When the recorded commit may move.
//!
//! The record names a commit only when every tracked file is known to hold
//! that commit's content: either it was just written, or its live hash
//! already equals the remote hash. Hashes of files in that state are
//! recorded regardless, so a later divergence is measured against the
//! canonical bytes.

use std::collections::BTreeMap;

use keeper_core::{TrackedFile, VersionRecord};

use crate::classify::IntegrityReport;

/// Record known-good hashes and stamp the commit if the whole installation
/// is in sync. Returns whether the commit was stamped.
pub(crate) fn settle(
    record: &mut VersionRecord,
    report: &IntegrityReport,
    written: &BTreeMap<TrackedFile, String>,
) -> bool {
    let mut in_sync = true;
    for classification in &report.files {
        if let Some(hash) = written.get(&classification.file) {
            record.record_hash(&classification.file, hash.clone());
        } else if classification.matches_remote() {
            if let Some(live) = &classification.live {
                record.record_hash(&classification.file, live.clone());
            }
        } else {
            in_sync = false;
        }
    }

    if in_sync {
        record.stamp(&report.commit);
        tracing::info!(commit = %report.commit.id, "recorded commit advanced");
    }
    in_sync
}

/// Establish the first baseline for a first-run install whose tracked files
/// all already match the remote. Returns whether the record was initialized.
pub fn initialize(record: &mut VersionRecord, report: &IntegrityReport) -> bool {
    if !record.is_first_run() || !report.files.iter().all(|c| c.matches_remote()) {
        return false;
    }
    settle(record, report, &BTreeMap::new())
}
