//! # keeper-remote
//!
//! Read-only access to the tracked repository: latest commit metadata for
//! one branch and raw file content addressed by commit id.
//!
//! [`RemoteSource`] is the seam the sync pipeline depends on;
//! [`GitHubClient`] is the HTTP implementation.

pub mod client;
pub mod error;

pub use client::GitHubClient;
pub use error::RemoteError;

use keeper_core::{CommitId, CommitInfo, TrackedFile};

/// Where tracked-file content comes from.
///
/// Implementations perform one blocking request per call, bounded by a fixed
/// timeout, with no retries.
pub trait RemoteSource {
    /// Metadata of the newest commit on `branch`.
    fn latest_commit(&self, branch: &str) -> Result<CommitInfo, RemoteError>;

    /// Exact text of `file` at `commit`.
    ///
    /// Two calls with the same commit id return identical content.
    fn fetch_file(&self, file: &TrackedFile, commit: &CommitId) -> Result<String, RemoteError>;
}

impl<T: RemoteSource + ?Sized> RemoteSource for &T {
    fn latest_commit(&self, branch: &str) -> Result<CommitInfo, RemoteError> {
        (**self).latest_commit(branch)
    }

    fn fetch_file(&self, file: &TrackedFile, commit: &CommitId) -> Result<String, RemoteError> {
        (**self).fetch_file(file, commit)
    }
}
