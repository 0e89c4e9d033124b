//! Domain types for a keeper-managed installation.
//!
//! Tracked file names are always relative, `/`-separated paths under the
//! install root. The persisted [`VersionRecord`] keeps the on-disk key names
//! (`last_commit`, `file_hashes`, `last_check`) so records written by older
//! updaters load unchanged.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Identifier of an immutable remote snapshot (a commit sha).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(pub String);

impl CommitId {
    /// Abbreviated id (first eight characters) for display.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map(|(idx, _)| idx)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for CommitId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CommitId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A relative path the installation manages.
///
/// Construction validates the name: it must be non-empty and made only of
/// normal path components, so joining it onto the install root can never
/// escape that root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackedFile(pub(crate) String);

impl TrackedFile {
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConfigError::InvalidTrackedFile {
                name,
                reason: "name is empty",
            });
        }
        let path = Path::new(&name);
        if path.is_absolute() || name.starts_with('/') || name.starts_with('\\') {
            return Err(ConfigError::InvalidTrackedFile {
                name,
                reason: "must be relative to the install root",
            });
        }
        if !path.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(ConfigError::InvalidTrackedFile {
                name,
                reason: "must not contain '.', '..' or prefix components",
            });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Absolute location of this file under `root`.
    pub fn path_in(&self, root: &Path) -> PathBuf {
        root.join(&self.0)
    }
}

impl fmt::Display for TrackedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for TrackedFile {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for TrackedFile {
    type Error = ConfigError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<TrackedFile> for String {
    fn from(f: TrackedFile) -> Self {
        f.0
    }
}

// ---------------------------------------------------------------------------
// Remote commit metadata
// ---------------------------------------------------------------------------

/// Metadata of the latest commit on the tracked branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    pub id: CommitId,
    /// First line of the commit message.
    pub message: String,
    /// Committer date as reported by the remote (RFC 3339).
    pub date: String,
    pub author: String,
}

impl CommitInfo {
    /// Committer date parsed as UTC, if the remote sent a valid RFC 3339 string.
    pub fn committed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

// ---------------------------------------------------------------------------
// Version record
// ---------------------------------------------------------------------------

/// The persisted state of one installation.
///
/// A name appears in `file_hashes` only after an update, repair or baseline
/// initialization recorded it; absence says nothing about the file on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    #[serde(default, deserialize_with = "deserialize_commit")]
    pub last_commit: Option<CommitId>,
    #[serde(default)]
    pub file_hashes: BTreeMap<String, String>,
    #[serde(default)]
    pub last_check: Option<String>,
}

impl VersionRecord {
    /// No commit has been recorded yet, so there is no trusted baseline.
    pub fn is_first_run(&self) -> bool {
        self.last_commit.is_none()
    }

    pub fn recorded_hash(&self, file: &TrackedFile) -> Option<&str> {
        self.file_hashes.get(file.as_str()).map(String::as_str)
    }

    pub fn record_hash(&mut self, file: &TrackedFile, hash: impl Into<String>) {
        self.file_hashes.insert(file.as_str().to_owned(), hash.into());
    }

    /// Stamp the record as fully synchronized with `commit`.
    pub fn stamp(&mut self, commit: &CommitInfo) {
        self.last_commit = Some(commit.id.clone());
        self.last_check = Some(commit.date.clone());
    }
}

/// Older records stored the literal string `"null"` for an unset commit.
fn deserialize_commit<'de, D>(deserializer: D) -> Result<Option<CommitId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .filter(|s| !s.trim().is_empty() && s != "null")
        .map(CommitId))
}
