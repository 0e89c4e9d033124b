//! Shared entrypoint used by every CLI mode.
//!
//! Each call loads the version record, fetches the latest commit and its
//! files once, classifies, and only then mutates disk or the record.

use std::path::{Path, PathBuf};

use keeper_core::{hash::live_hash, UpdaterConfig, VersionRecord, VersionStore};
use keeper_remote::RemoteSource;

use crate::baseline;
use crate::classify::{classify, InstallationStatus, IntegrityReport};
use crate::outcome::BatchOutcome;
use crate::repair::{targets, RepairExecutor, RepairOptions};
use crate::snapshot::{fetch_snapshot, RemoteSnapshot};
use crate::update::{UpdateBatch, UpdateExecutor, UpdateOptions};
use crate::SyncError;

/// Result of a read-only check.
#[derive(Debug, Clone)]
pub struct Checked {
    pub record: VersionRecord,
    pub snapshot: RemoteSnapshot,
    pub report: IntegrityReport,
}

/// Result of `verify`: the report plus whether a first baseline was written.
#[derive(Debug, Clone)]
pub struct Verification {
    pub report: IntegrityReport,
    pub initialized: bool,
    /// Set when a baseline was established but could not be saved.
    pub save_error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum UpdateRun {
    /// Nothing to write and the recorded commit is current.
    UpToDate { report: IntegrityReport },
    Applied {
        report: IntegrityReport,
        outcome: BatchOutcome,
    },
}

#[derive(Debug, Clone)]
pub enum RepairRun {
    /// No file was missing or corrupted.
    NothingToRepair { report: IntegrityReport },
    Repaired {
        report: IntegrityReport,
        outcome: BatchOutcome,
    },
}

/// One managed installation: a root directory, its config, its version
/// record and the remote it tracks.
pub struct Installation<R> {
    root: PathBuf,
    config: UpdaterConfig,
    store: VersionStore,
    remote: R,
}

impl<R: RemoteSource> Installation<R> {
    pub fn new(root: impl Into<PathBuf>, config: UpdaterConfig, remote: R) -> Self {
        let root = root.into();
        let store = VersionStore::at(&root, &config);
        Self {
            root,
            config,
            store,
            remote,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    pub fn store(&self) -> &VersionStore {
        &self.store
    }

    /// Classify every tracked file against the latest commit. No mutation.
    pub fn check(&self) -> Result<Checked, SyncError> {
        let record = self.store.load();
        let snapshot = fetch_snapshot(
            &self.remote,
            &self.config.repository.branch,
            &self.config.tracked_files,
        )?;
        let report = classify(&self.config.tracked_files, &record, &snapshot, |file| {
            live_hash(&file.path_in(&self.root))
        });
        tracing::debug!(status = %report.status(), commit = %report.commit.id, "checked");
        Ok(Checked {
            record,
            snapshot,
            report,
        })
    }

    /// Check, and on a first run whose files all match the remote, record
    /// that state as the baseline.
    pub fn verify(&self) -> Result<Verification, SyncError> {
        let Checked {
            mut record, report, ..
        } = self.check()?;

        let initialized = baseline::initialize(&mut record, &report);
        let mut save_error = None;
        if initialized {
            if let Err(err) = self.store.save(&record) {
                tracing::warn!(error = %err, "baseline not saved");
                save_error = Some(err.to_string());
            }
        }
        Ok(Verification {
            report,
            initialized,
            save_error,
        })
    }

    /// Apply pending updates, or with `force` overwrite every file that
    /// differs from the remote.
    pub fn update(&self, options: UpdateOptions) -> Result<UpdateRun, SyncError> {
        let Checked {
            mut record,
            snapshot,
            report,
        } = self.check()?;

        if !options.force && report.status() == InstallationStatus::Healthy {
            return Ok(UpdateRun::UpToDate { report });
        }

        let batch = if options.force {
            UpdateBatch::forced(&report, &snapshot)
        } else {
            UpdateBatch::pending(&report)
        };
        tracing::info!(files = batch.writes.len(), commit = %batch.commit.id, "applying update");

        let outcome =
            UpdateExecutor::new(&self.root, &self.store, options).apply(&report, &batch, &mut record);
        Ok(UpdateRun::Applied { report, outcome })
    }

    /// Restore missing and corrupted files from the latest commit.
    pub fn repair(&self, options: RepairOptions) -> Result<RepairRun, SyncError> {
        let Checked {
            mut record, report, ..
        } = self.check()?;

        if targets(&report).is_empty() {
            return Ok(RepairRun::NothingToRepair { report });
        }

        let outcome = RepairExecutor::new(&self.root, &self.store, &self.remote, options)
            .repair(&report, &mut record);
        Ok(RepairRun::Repaired { report, outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::fs;

    use keeper_core::{CommitId, CommitInfo, TrackedFile};
    use keeper_remote::RemoteError;
    use tempfile::TempDir;

    /// Remote whose commit and files can be changed between calls.
    #[derive(Default)]
    struct FakeRemote {
        commit: RefCell<String>,
        files: RefCell<HashMap<String, String>>,
        offline: RefCell<bool>,
    }

    impl FakeRemote {
        fn publish(&self, id: &str, files: &[(&str, &str)]) {
            *self.commit.borrow_mut() = id.to_string();
            *self.files.borrow_mut() = files
                .iter()
                .map(|(n, c)| (n.to_string(), c.to_string()))
                .collect();
        }
    }

    impl RemoteSource for FakeRemote {
        fn latest_commit(&self, _branch: &str) -> Result<CommitInfo, RemoteError> {
            if *self.offline.borrow() {
                return Err(RemoteError::Transport {
                    url: "fake://commits".into(),
                    message: "connection refused".into(),
                });
            }
            Ok(CommitInfo {
                id: CommitId(self.commit.borrow().clone()),
                message: "msg".into(),
                date: "2024-05-01T10:00:00Z".into(),
                author: "umbra".into(),
            })
        }

        fn fetch_file(&self, file: &TrackedFile, _commit: &CommitId) -> Result<String, RemoteError> {
            self.files
                .borrow()
                .get(file.as_str())
                .cloned()
                .ok_or_else(|| RemoteError::Status {
                    url: format!("fake://{file}"),
                    status: 404,
                })
        }
    }

    fn setup() -> (TempDir, Installation<FakeRemote>) {
        let tmp = TempDir::new().unwrap();
        let config = UpdaterConfig {
            tracked_files: vec![
                TrackedFile::new("a.txt").unwrap(),
                TrackedFile::new("b.txt").unwrap(),
            ],
            ..UpdaterConfig::default()
        };
        let installation = Installation::new(tmp.path(), config, FakeRemote::default());
        (tmp, installation)
    }

    fn write(root: &Path, name: &str, content: &str) {
        fs::write(root.join(name), content).unwrap();
    }

    #[test]
    fn check_does_not_mutate() {
        let (tmp, inst) = setup();
        inst.remote.publish("c1", &[("a.txt", "A"), ("b.txt", "B")]);
        write(tmp.path(), "a.txt", "A");

        let checked = inst.check().unwrap();
        assert_eq!(checked.report.status(), InstallationStatus::FirstRun);
        assert!(!inst.store().path().exists());
        assert!(!tmp.path().join("b.txt").exists());
    }

    #[test]
    fn commit_lookup_failure_escalates() {
        let (_tmp, inst) = setup();
        *inst.remote.offline.borrow_mut() = true;
        let err = inst.check().unwrap_err();
        assert!(matches!(err, SyncError::Remote(RemoteError::Transport { .. })));
        assert!(err.to_string().starts_with("failed to get commit info"));
    }

    #[test]
    fn verify_initializes_matching_first_run_once() {
        let (tmp, inst) = setup();
        inst.remote.publish("c1", &[("a.txt", "A"), ("b.txt", "B")]);
        write(tmp.path(), "a.txt", "A");
        write(tmp.path(), "b.txt", "B");

        let first = inst.verify().unwrap();
        assert!(first.initialized);
        assert_eq!(first.report.status(), InstallationStatus::FirstRun);
        assert_eq!(inst.store().load().last_commit, Some(CommitId::from("c1")));

        let second = inst.verify().unwrap();
        assert!(!second.initialized);
        assert_eq!(second.report.status(), InstallationStatus::Healthy);
    }

    #[test]
    fn verify_leaves_divergent_first_run_alone() {
        let (tmp, inst) = setup();
        inst.remote.publish("c1", &[("a.txt", "A"), ("b.txt", "B")]);
        write(tmp.path(), "a.txt", "local edit");
        write(tmp.path(), "b.txt", "B");

        let verification = inst.verify().unwrap();
        assert!(!verification.initialized);
        assert!(!inst.store().path().exists());
    }

    #[test]
    fn full_lifecycle() {
        let (tmp, inst) = setup();
        let root = tmp.path();

        // First run with one file missing: repair creates it and settles.
        inst.remote.publish("c1", &[("a.txt", "A1"), ("b.txt", "B1")]);
        write(root, "a.txt", "A1");
        match inst.repair(RepairOptions::default()).unwrap() {
            RepairRun::Repaired { outcome, .. } => assert!(outcome.commit_advanced),
            other => panic!("expected repair, got {other:?}"),
        }
        assert_eq!(inst.check().unwrap().report.status(), InstallationStatus::Healthy);
        assert!(matches!(
            inst.update(UpdateOptions::default()).unwrap(),
            UpdateRun::UpToDate { .. }
        ));

        // Remote moves on.
        inst.remote.publish("c2", &[("a.txt", "A1"), ("b.txt", "B2")]);
        assert_eq!(
            inst.check().unwrap().report.status(),
            InstallationStatus::UpdateAvailable
        );
        match inst.update(UpdateOptions::default()).unwrap() {
            UpdateRun::Applied { outcome, .. } => {
                assert!(outcome.is_success());
                assert_eq!(outcome.applied.len(), 1);
            }
            other => panic!("expected update, got {other:?}"),
        }
        assert_eq!(fs::read_to_string(root.join("b.txt")).unwrap(), "B2");
        assert_eq!(inst.check().unwrap().report.status(), InstallationStatus::Healthy);

        // Hand edit after the baseline: corruption, not an update.
        write(root, "a.txt", "hand edit");
        let report = inst.check().unwrap().report;
        assert_eq!(report.status(), InstallationStatus::NeedsRepair);
        assert!(matches!(
            inst.update(UpdateOptions::default()).unwrap(),
            UpdateRun::Applied { .. }
        ));
        assert_eq!(
            fs::read_to_string(root.join("a.txt")).unwrap(),
            "hand edit",
            "update never overwrites corruption"
        );

        assert!(matches!(
            inst.repair(RepairOptions::default()).unwrap(),
            RepairRun::Repaired { .. }
        ));
        assert_eq!(fs::read_to_string(root.join("a.txt")).unwrap(), "A1");
        assert_eq!(inst.check().unwrap().report.status(), InstallationStatus::Healthy);
        assert!(matches!(
            inst.repair(RepairOptions::default()).unwrap(),
            RepairRun::NothingToRepair { .. }
        ));
    }

    #[test]
    fn forced_update_adopts_divergent_first_run() {
        let (tmp, inst) = setup();
        inst.remote.publish("c1", &[("a.txt", "A"), ("b.txt", "B")]);
        write(tmp.path(), "a.txt", "pre-existing");
        write(tmp.path(), "b.txt", "B");

        let options = UpdateOptions {
            force: true,
            ..UpdateOptions::default()
        };
        match inst.update(options).unwrap() {
            UpdateRun::Applied { outcome, .. } => {
                assert_eq!(outcome.applied.len(), 1);
                assert!(outcome.commit_advanced);
            }
            other => panic!("expected update, got {other:?}"),
        }
        assert_eq!(inst.check().unwrap().report.status(), InstallationStatus::Healthy);
    }
}
