//! # keeper-sync
//!
//! Integrity classification and targeted repair of a tracked installation.
//!
//! The flow for every operation is: load the [`keeper_core::VersionRecord`],
//! fetch a [`RemoteSnapshot`] at the latest commit, [`classify`] every
//! tracked file, then hand the [`IntegrityReport`] to the
//! [`UpdateExecutor`] or [`RepairExecutor`]. [`pipeline::Installation`]
//! wires those steps together for the CLI.

pub mod baseline;
pub mod classify;
pub mod error;
pub mod outcome;
pub mod pipeline;
pub mod repair;
mod replace;
pub mod snapshot;
pub mod update;

pub use classify::{classify, FileClassification, FileStatus, InstallationStatus, IntegrityReport};
pub use error::SyncError;
pub use outcome::{AppliedFile, BackupCleanup, BatchOutcome, FailedFile};
pub use pipeline::{Checked, Installation, RepairRun, UpdateRun, Verification};
pub use repair::{RepairExecutor, RepairOptions};
pub use snapshot::{fetch_snapshot, RemoteFile, RemoteSnapshot};
pub use update::{PendingWrite, UpdateBatch, UpdateExecutor, UpdateOptions};
