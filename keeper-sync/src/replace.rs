//! On-disk replacement of tracked files.
//!
//! Two protocols share the same sibling paths:
//! `<file>.backup` for the previous content and `<file>.keeper.tmp` for the
//! staged new content.
//!
//! ## `write_with_backup` (updates)
//!
//! 1. Ensure the parent directory exists.
//! 2. Copy the current file to `.backup` (the original stays in place).
//! 3. Write the new content to `.keeper.tmp`.
//! 4. Rename over the target (atomic on POSIX); on failure drop the tmp.
//!
//! ## `replace_with_rollback` (repairs)
//!
//! 1. Ensure the parent directory exists.
//! 2. Write the new content to `.keeper.tmp`.
//! 3. Rename the current file to `.backup`.
//! 4. Rename the tmp over the target; on failure rename `.backup` back.

use std::path::{Path, PathBuf};

use crate::error::{io_err, SyncError};
use crate::outcome::BackupCleanup;

pub(crate) fn backup_path(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.backup", path.display()))
}

pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.keeper.tmp", path.display()))
}

/// Copy-aside then atomic write. Returns the backup path if one was made.
pub(crate) fn write_with_backup(path: &Path, content: &str) -> Result<Option<PathBuf>, SyncError> {
    ensure_parent(path)?;

    let backup = if path.exists() {
        let backup = backup_path(path);
        std::fs::copy(path, &backup).map_err(|e| io_err(path, e))?;
        Some(backup)
    } else {
        None
    };

    atomic_write_with_tmp(path, content, &tmp_path(path))?;
    Ok(backup)
}

/// Stage, move the original aside, swap in. Returns the backup path if the
/// file existed before.
pub(crate) fn replace_with_rollback(
    path: &Path,
    content: &str,
) -> Result<Option<PathBuf>, SyncError> {
    ensure_parent(path)?;

    let tmp = tmp_path(path);
    if let Err(e) = std::fs::write(&tmp, content.as_bytes()) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(&tmp, e));
    }
    swap_in(path, &tmp, &backup_path(path))
}

fn swap_in(path: &Path, tmp: &Path, backup: &Path) -> Result<Option<PathBuf>, SyncError> {
    let moved_aside = if path.exists() {
        if let Err(e) = std::fs::rename(path, backup) {
            let _ = std::fs::remove_file(tmp);
            return Err(io_err(path, e));
        }
        Some(backup.to_path_buf())
    } else {
        None
    };

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        if let Some(backup) = &moved_aside {
            if let Err(restore) = std::fs::rename(backup, path) {
                tracing::error!(
                    path = %path.display(),
                    backup = %backup.display(),
                    error = %restore,
                    "rollback failed; original content is in the backup"
                );
            }
        }
        return Err(io_err(path, e));
    }
    Ok(moved_aside)
}

fn atomic_write_with_tmp(path: &Path, content: &str, tmp: &Path) -> Result<(), SyncError> {
    if let Err(e) = std::fs::write(tmp, content.as_bytes()) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(tmp, e));
    }
    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    Ok(())
}

/// Delete the given backups, collecting (not raising) failures.
pub(crate) fn remove_backups<'a>(backups: impl IntoIterator<Item = &'a Path>) -> BackupCleanup {
    let mut cleanup = BackupCleanup::default();
    for backup in backups {
        if !backup.exists() {
            continue;
        }
        match std::fs::remove_file(backup) {
            Ok(()) => cleanup.removed.push(backup.to_path_buf()),
            Err(err) => {
                tracing::warn!(path = %backup.display(), error = %err, "could not remove backup");
                cleanup.failed.push((backup.to_path_buf(), err.to_string()));
            }
        }
    }
    cleanup
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn write_new_file_creates_parents_without_backup() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("finders").join("steam_finder.py");
        let backup = write_with_backup(&path, "new").unwrap();
        assert_eq!(backup, None);
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn write_existing_file_keeps_copy_of_original() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("run_mcs.bat");
        fs::write(&path, "old").unwrap();

        let backup = write_with_backup(&path, "new").unwrap().expect("backup");
        assert_eq!(backup, tmp.path().join("run_mcs.bat.backup"));
        assert_eq!(fs::read_to_string(&backup).unwrap(), "old");
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert!(!tmp_path(&path).exists(), ".keeper.tmp must be cleaned up");
    }

    #[test]
    fn content_is_written_verbatim() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("check_conflicts.bat");
        write_with_backup(&path, "@echo off\r\nrem ünïcode\r\n").unwrap();
        assert_eq!(fs::read(&path).unwrap(), "@echo off\r\nrem ünïcode\r\n".as_bytes());
    }

    #[test]
    fn write_over_directory_fails() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("occupied");
        fs::create_dir_all(&path).unwrap();
        assert!(write_with_backup(&path, "x").is_err());
        assert!(path.is_dir());
    }

    #[test]
    fn replace_moves_original_to_backup() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.txt");
        fs::write(&path, "tampered").unwrap();

        let backup = replace_with_rollback(&path, "canonical").unwrap().expect("backup");
        assert_eq!(fs::read_to_string(&backup).unwrap(), "tampered");
        assert_eq!(fs::read_to_string(&path).unwrap(), "canonical");
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn replace_missing_file_creates_it() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("updater").join("json_extract.py");
        let backup = replace_with_rollback(&path, "code").unwrap();
        assert_eq!(backup, None);
        assert_eq!(fs::read_to_string(&path).unwrap(), "code");
    }

    #[test]
    fn failed_swap_rolls_back_original() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.txt");
        fs::write(&path, "original").unwrap();

        // The staged file was never written, so the final rename must fail.
        let staged = tmp.path().join("never-staged.tmp");
        let backup = backup_path(&path);
        let err = swap_in(&path, &staged, &backup).expect_err("swap should fail");
        assert!(matches!(err, SyncError::Io { .. }));

        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
        assert!(!backup.exists(), "backup should have been moved back");
    }

    #[test]
    #[cfg(unix)]
    fn rename_failure_leaves_original_and_cleans_tmp() {
        use std::os::unix::fs::PermissionsExt;

        let root = TempDir::new().unwrap();
        let readonly_dir = root.path().join("readonly");
        fs::create_dir_all(&readonly_dir).unwrap();
        let path = readonly_dir.join("file.py");
        fs::write(&path, "original").unwrap();

        let mut perms = fs::metadata(&readonly_dir).unwrap().permissions();
        perms.set_mode(0o555);
        fs::set_permissions(&readonly_dir, perms).unwrap();

        let tmp_dir = TempDir::new().unwrap();
        let staged = tmp_dir.path().join("file.py.keeper.tmp");
        let result = atomic_write_with_tmp(&path, "new content", &staged);

        let mut perms = fs::metadata(&readonly_dir).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&readonly_dir, perms).unwrap();

        // Root bypasses directory permissions; only assert when it was refused.
        if result.is_err() {
            assert_eq!(fs::read_to_string(&path).unwrap(), "original");
            assert!(!staged.exists(), ".keeper.tmp should be cleaned up");
        }
    }

    #[test]
    fn remove_backups_skips_absent_paths() {
        let tmp = TempDir::new().unwrap();
        let present = tmp.path().join("a.txt.backup");
        fs::write(&present, "old").unwrap();
        let absent = tmp.path().join("b.txt.backup");

        let cleanup = remove_backups([present.as_path(), absent.as_path()]);
        assert_eq!(cleanup.removed, vec![present.clone()]);
        assert!(cleanup.failed.is_empty());
        assert!(!present.exists());
    }
}
