//! Config loading and version-record persistence against real install roots.

use assert_fs::prelude::*;
use keeper_core::{
    CommitId, CommitInfo, ConfigError, TrackedFile, UpdaterConfig, VersionRecord, VersionStore,
    CONFIG_FILE_NAME,
};
use predicates::prelude::*;

fn commit(id: &str) -> CommitInfo {
    CommitInfo {
        id: CommitId::from(id),
        message: "Fix finder".into(),
        date: "2024-05-01T10:00:00Z".into(),
        author: "umbra".into(),
    }
}

// ---------------------------------------------------------------------------
// 1. Config
// ---------------------------------------------------------------------------

#[test]
fn root_without_config_uses_defaults() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let config = UpdaterConfig::load_at(root.path()).expect("defaults");
    assert_eq!(config, UpdaterConfig::default());
    assert_eq!(config.tracked_files.len(), 8);
    assert_eq!(config.repository.branch, "rewrite");
}

#[test]
fn partial_config_overrides_only_given_keys() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child(CONFIG_FILE_NAME)
        .write_str("repository:\n  branch: main\ntimeout_secs: 3\ntracked_files:\n  - a.txt\n  - tools/b.py\n")
        .expect("write config");

    let config = UpdaterConfig::load_at(root.path()).expect("load");
    assert_eq!(config.repository.branch, "main");
    assert_eq!(config.repository.owner, "umbraprior");
    assert_eq!(config.timeout_secs, 3);
    assert_eq!(
        config.tracked_files,
        vec![
            TrackedFile::new("a.txt").unwrap(),
            TrackedFile::new("tools/b.py").unwrap()
        ]
    );
}

#[test]
fn corrupt_config_reports_path() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child(CONFIG_FILE_NAME)
        .write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write config");

    let err = UpdaterConfig::load_at(root.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(predicate::str::contains(CONFIG_FILE_NAME).eval(&err.to_string()));
}

#[test]
fn escaping_tracked_file_is_rejected_at_load() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child(CONFIG_FILE_NAME)
        .write_str("tracked_files:\n  - ../../etc/hosts\n")
        .expect("write config");

    let err = UpdaterConfig::load_at(root.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

#[test]
fn duplicate_tracked_file_is_rejected() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child(CONFIG_FILE_NAME)
        .write_str("tracked_files:\n  - a.txt\n  - a.txt\n")
        .expect("write config");

    let err = UpdaterConfig::load_at(root.path()).unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateTrackedFile(ref name) if name == "a.txt"));
}

#[test]
fn explicit_config_must_exist() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let err = UpdaterConfig::load_from(&root.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Version store
// ---------------------------------------------------------------------------

#[test]
fn save_creates_updater_dir_and_pretty_json() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let store = VersionStore::at(root.path(), &UpdaterConfig::default());

    let mut record = VersionRecord::default();
    record.record_hash(&TrackedFile::new("run_mcs.bat").unwrap(), "ab12");
    record.stamp(&commit("c0ffee"));
    store.save(&record).expect("save");

    let file = root.child("updater").child("version_info.json");
    file.assert(predicate::path::exists());
    file.assert(predicate::str::contains("\"last_commit\": \"c0ffee\""));
    file.assert(predicate::str::contains("\"run_mcs.bat\": \"ab12\""));
    root.child("updater")
        .child("version_info.json.tmp")
        .assert(predicate::path::missing());

    assert_eq!(store.load(), record);
}

#[test]
fn missing_record_loads_as_first_run() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let store = VersionStore::at(root.path(), &UpdaterConfig::default());
    let record = store.load();
    assert!(record.is_first_run());
    assert!(record.file_hashes.is_empty());
}

#[test]
fn partially_filled_record_keeps_known_fields() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("updater/version_info.json")
        .write_str(r#"{"file_hashes":{"run_mcs.bat":"ff"}}"#)
        .expect("write record");

    let store = VersionStore::at(root.path(), &UpdaterConfig::default());
    let record = store.load();
    assert!(record.is_first_run());
    assert_eq!(
        record.recorded_hash(&TrackedFile::new("run_mcs.bat").unwrap()),
        Some("ff")
    );
}
