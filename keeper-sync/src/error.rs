//! Error types for keeper-sync.

use std::path::PathBuf;

use thiserror::Error;

use keeper_core::{ConfigError, StoreError};
use keeper_remote::RemoteError;

/// Errors that abort a whole operation.
///
/// Per-file failures never surface here; they are collected into
/// [`crate::BatchOutcome::failed`].
#[derive(Debug, Error)]
pub enum SyncError {
    /// The latest commit could not be determined; nothing else can be decided.
    #[error("failed to get commit info: {0}")]
    Remote(#[from] RemoteError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("version record error: {0}")]
    Store(#[from] StoreError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
