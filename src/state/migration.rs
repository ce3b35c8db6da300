//! One-time move of a legacy data directory into the state directory.
//!
//! Runs only when the state directory has no `state.json` yet and the legacy
//! directory does. The legacy tree is copied over and then renamed to
//! `<legacy>.backup` so it is never picked up again.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const STATE_FILE: &str = "state.json";

#[derive(Debug, Clone, PartialEq)]
pub enum MigrationOutcome {
    /// Nothing to migrate
    Skipped,
    /// Data copied; the legacy directory now lives at `backup_dir`
    Migrated { backup_dir: PathBuf },
}

/// Copy `legacy_dir` into `state_dir` (one-time).
///
/// - If `state_dir/state.json` exists, this is a no-op.
/// - If `legacy_dir/state.json` does not exist, this is a no-op.
/// - Directories already present in `state_dir` are replaced by the legacy copy.
pub fn migrate_legacy_dir(legacy_dir: &Path, state_dir: &Path) -> io::Result<MigrationOutcome> {
    if state_dir.join(STATE_FILE).exists() {
        return Ok(MigrationOutcome::Skipped);
    }
    if !legacy_dir.join(STATE_FILE).exists() {
        return Ok(MigrationOutcome::Skipped);
    }
    if paths_are_same(legacy_dir, state_dir) {
        return Ok(MigrationOutcome::Skipped);
    }

    log::info!("Migration: copying {:?} → {:?}", legacy_dir, state_dir);
    fs::create_dir_all(state_dir)?;

    for entry in fs::read_dir(legacy_dir)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = state_dir.join(entry.file_name());

        if entry.file_type()?.is_dir() {
            if dst_path.exists() {
                fs::remove_dir_all(&dst_path)?;
            }
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }

    let backup_dir = backup_path(legacy_dir);
    if backup_dir.exists() {
        fs::remove_dir_all(&backup_dir)?;
    }
    fs::rename(legacy_dir, &backup_dir)?;

    log::info!("Migration: complete, legacy data kept at {:?}", backup_dir);
    Ok(MigrationOutcome::Migrated { backup_dir })
}

/// `<legacy>.backup`, next to the legacy directory
fn backup_path(legacy_dir: &Path) -> PathBuf {
    let name = legacy_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "data".to_string());
    legacy_dir.with_file_name(format!("{}.backup", name))
}

/// Check if two paths refer to the same location (canonicalizing to handle symlinks).
fn paths_are_same(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => a == b,
    }
}

/// Recursively copy a directory tree.
fn copy_dir_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seed_legacy(root: &Path) -> PathBuf {
        let legacy = root.join("data");
        fs::create_dir_all(legacy.join("daily/2026-02-20")).unwrap();
        fs::write(legacy.join("state.json"), r#"{"user": {"xp": 120}}"#).unwrap();
        fs::write(legacy.join("daily/2026-02-20/keypoint.json"), "{}").unwrap();
        legacy
    }

    #[test]
    fn test_migrates_and_renames_legacy() {
        let temp = TempDir::new().unwrap();
        let legacy = seed_legacy(temp.path());
        let state_dir = temp.path().join("state");

        let outcome = migrate_legacy_dir(&legacy, &state_dir).unwrap();

        let backup = temp.path().join("data.backup");
        assert_eq!(outcome, MigrationOutcome::Migrated { backup_dir: backup.clone() });
        assert!(state_dir.join("state.json").exists());
        assert!(state_dir.join("daily/2026-02-20/keypoint.json").exists());
        assert!(!legacy.exists());
        assert!(backup.join("state.json").exists());
    }

    #[test]
    fn test_skips_when_state_exists() {
        let temp = TempDir::new().unwrap();
        let legacy = seed_legacy(temp.path());
        let state_dir = temp.path().join("state");
        fs::create_dir_all(&state_dir).unwrap();
        fs::write(state_dir.join("state.json"), "{}").unwrap();

        let outcome = migrate_legacy_dir(&legacy, &state_dir).unwrap();
        assert_eq!(outcome, MigrationOutcome::Skipped);
        assert!(legacy.exists());
    }

    #[test]
    fn test_skips_without_legacy_state() {
        let temp = TempDir::new().unwrap();
        let legacy = temp.path().join("data");
        fs::create_dir_all(&legacy).unwrap();

        let outcome = migrate_legacy_dir(&legacy, &temp.path().join("state")).unwrap();
        assert_eq!(outcome, MigrationOutcome::Skipped);
    }

    #[test]
    fn test_replaces_existing_backup() {
        let temp = TempDir::new().unwrap();
        let legacy = seed_legacy(temp.path());
        let stale_backup = temp.path().join("data.backup");
        fs::create_dir_all(&stale_backup).unwrap();
        fs::write(stale_backup.join("old.txt"), "old").unwrap();

        migrate_legacy_dir(&legacy, &temp.path().join("state")).unwrap();
        assert!(!stale_backup.join("old.txt").exists());
        assert!(stale_backup.join("state.json").exists());
    }
}
