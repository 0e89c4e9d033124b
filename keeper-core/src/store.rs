//! Version record persistence.
//!
//! The record lives at a fixed path inside the installation (by default
//! `<root>/updater/version_info.json`). Saves use an atomic `.tmp` + rename.
//! Loads never fail: a missing or undecodable file yields an empty record.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::UpdaterConfig;
use crate::error::{store_io_err, StoreError};
use crate::types::VersionRecord;

/// Handle on the persisted [`VersionRecord`] of one installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionStore {
    path: PathBuf,
}

impl VersionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store for the installation rooted at `root`, located per `config`.
    pub fn at(root: &Path, config: &UpdaterConfig) -> Self {
        Self::new(config.version_file_at(root))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record, falling back to an empty one.
    pub fn load(&self) -> VersionRecord {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return VersionRecord::default(),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "unreadable version record; starting fresh");
                return VersionRecord::default();
            }
        };
        match serde_json::from_str(&contents) {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "undecodable version record; starting fresh");
                VersionRecord::default()
            }
        }
    }

    /// Persist `record`, writing `<path>.tmp` then renaming over `<path>`.
    pub fn save(&self, record: &VersionRecord) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| store_io_err(dir, e))?;
        }

        let json = serde_json::to_string_pretty(record)?;
        let tmp = self.tmp_path();
        std::fs::write(&tmp, json).map_err(|e| store_io_err(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(store_io_err(&self.path, e));
        }
        tracing::debug!(path = %self.path.display(), "saved version record");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.tmp", self.path.display()))
    }
}
