//! SHA-256 content hashing.
//!
//! Hashes are computed over raw bytes with no line-ending normalization, so a
//! file written from remote content hashes identically to that content.

use std::io::ErrorKind;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Lower-case hex SHA-256 digest of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Digest of the file at `path`, or `None` when it cannot be read.
///
/// A missing file is the expected `None`; any other read failure
/// (permissions, a directory in the way) is logged and also reported as
/// `None`, which callers treat as "not present".
pub fn live_hash(path: &Path) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => Some(sha256_hex(&bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => None,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "unreadable tracked file");
            None
        }
    }
}
