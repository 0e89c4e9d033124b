//! Error types for keeper-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating an [`crate::UpdaterConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error, with the offending file path.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid tracked file '{name}': {reason}")]
    InvalidTrackedFile { name: String, reason: &'static str },

    #[error("tracked file '{0}' is listed more than once")]
    DuplicateTrackedFile(String),

    #[error("no tracked files configured")]
    NoTrackedFiles,

    #[error("invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Errors raised when persisting the version record.
///
/// Loading never fails; see [`crate::VersionStore::load`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("version record JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub(crate) fn store_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}
