//! Keeper core library: domain types, configuration, version-record
//! persistence, hashing, errors.
//!
//! - [`types`]: newtypes and the persisted [`VersionRecord`]
//! - [`config`]: [`UpdaterConfig`] with YAML loading and validation
//! - [`store`]: [`VersionStore`] load / save
//! - [`hash`]: SHA-256 helpers shared by the classifier and executors
//! - [`error`]: [`ConfigError`], [`StoreError`]

pub mod config;
pub mod error;
pub mod hash;
pub mod store;
pub mod types;

pub use config::{RepositoryConfig, UpdaterConfig, CONFIG_FILE_NAME};
pub use error::{ConfigError, StoreError};
pub use store::VersionStore;
pub use types::{CommitId, CommitInfo, TrackedFile, VersionRecord};
