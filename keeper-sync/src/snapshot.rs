//! Remote content at the latest commit, fetched once per operation.

use std::collections::BTreeMap;

use keeper_core::{hash::sha256_hex, CommitInfo, TrackedFile};
use keeper_remote::{RemoteError, RemoteSource};

const NOT_FETCHED: &str = "file was not fetched";

/// Remote text of one tracked file and its SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub content: String,
    pub hash: String,
}

impl RemoteFile {
    pub fn new(content: String) -> Self {
        let hash = sha256_hex(content.as_bytes());
        Self { content, hash }
    }
}

/// Per-file fetch results at one commit. A failed fetch keeps its cause.
#[derive(Debug, Clone)]
pub struct RemoteSnapshot {
    pub commit: CommitInfo,
    files: BTreeMap<TrackedFile, Result<RemoteFile, String>>,
}

impl RemoteSnapshot {
    pub fn new(commit: CommitInfo) -> Self {
        Self {
            commit,
            files: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, file: TrackedFile, fetched: Result<RemoteFile, String>) {
        self.files.insert(file, fetched);
    }

    /// Builder form of [`RemoteSnapshot::insert`] for a successful fetch.
    pub fn with_file(mut self, file: TrackedFile, content: impl Into<String>) -> Self {
        self.insert(file, Ok(RemoteFile::new(content.into())));
        self
    }

    /// Builder form of [`RemoteSnapshot::insert`] for a failed fetch.
    pub fn with_error(mut self, file: TrackedFile, cause: impl Into<String>) -> Self {
        self.insert(file, Err(cause.into()));
        self
    }

    /// The fetched file, or the reason it is unavailable.
    pub fn get(&self, file: &TrackedFile) -> Result<&RemoteFile, &str> {
        match self.files.get(file) {
            Some(Ok(remote)) => Ok(remote),
            Some(Err(cause)) => Err(cause.as_str()),
            None => Err(NOT_FETCHED),
        }
    }
}

/// Fetch the latest commit on `branch` and every tracked file at it.
///
/// Only the commit lookup can fail the call. File fetches run sequentially
/// in tracked order and a failure degrades just that file.
pub fn fetch_snapshot<R: RemoteSource>(
    remote: &R,
    branch: &str,
    tracked: &[TrackedFile],
) -> Result<RemoteSnapshot, RemoteError> {
    let commit = remote.latest_commit(branch)?;
    tracing::debug!(commit = %commit.id, "latest commit");

    let mut snapshot = RemoteSnapshot::new(commit);
    for file in tracked {
        let fetched = match remote.fetch_file(file, &snapshot.commit.id) {
            Ok(content) => Ok(RemoteFile::new(content)),
            Err(err) => {
                tracing::warn!(file = %file, error = %err, "remote fetch failed");
                Err(format!("Failed to download {file}: {err}"))
            }
        };
        snapshot.insert(file.clone(), fetched);
    }
    Ok(snapshot)
}
