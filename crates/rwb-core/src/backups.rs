//! Timestamped backups of a scenario's `CurrentSave.bin`.
//!
//! Layout inside a scenario directory:
//!
//! ```text
//! CurrentSave.bin
//! CurrentSave.bin.MD5                          (optional)
//! saves/CurrentSave-2024-06-01-12-00-00.bin
//! saves/CurrentSave-2024-06-01-12-00-00.bin.MD5 (optional)
//! ```
//!
//! A backup is identified by its file name without `.bin`, e.g.
//! `CurrentSave-2024-06-01-12-00-00`. The token has second resolution, so two
//! backups taken within the same second share a name and the later one wins.
//!
//! Callers must not run create/restore/delete concurrently on the same
//! scenario; there is no locking. Different scenarios are independent.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use log::{debug, error, info};

use crate::error::BackupError;

pub const SAVE_FILE: &str = "CurrentSave.bin";
pub const CHECKSUM_SUFFIX: &str = ".MD5";
pub const BACKUP_DIR: &str = "saves";
pub const BACKUP_PREFIX: &str = "CurrentSave-";
pub const BACKUP_EXT: &str = ".bin";
pub const TOKEN_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

pub fn save_path(scenario_dir: &Path) -> PathBuf {
    scenario_dir.join(SAVE_FILE)
}

pub fn checksum_path(scenario_dir: &Path) -> PathBuf {
    scenario_dir.join(format!("{SAVE_FILE}{CHECKSUM_SUFFIX}"))
}

pub fn backup_dir(scenario_dir: &Path) -> PathBuf {
    scenario_dir.join(BACKUP_DIR)
}

pub fn has_save(scenario_dir: &Path) -> bool {
    save_path(scenario_dir).is_file()
}

/// Identifier of the backup taken at `when`.
pub fn backup_id(when: NaiveDateTime) -> String {
    format!("{BACKUP_PREFIX}{}", when.format(TOKEN_FORMAT))
}

/// Timestamp encoded in an identifier.
pub fn backup_time(id: &str) -> Option<NaiveDateTime> {
    let id = normalize_id(id).ok()?;
    NaiveDateTime::parse_from_str(&id[BACKUP_PREFIX.len()..], TOKEN_FORMAT).ok()
}

pub fn backup_file(scenario_dir: &Path, id: &str) -> PathBuf {
    backup_dir(scenario_dir).join(format!("{id}{BACKUP_EXT}"))
}

pub fn backup_checksum_file(scenario_dir: &Path, id: &str) -> PathBuf {
    backup_dir(scenario_dir).join(format!("{id}{BACKUP_EXT}{CHECKSUM_SUFFIX}"))
}

pub fn has_checksum(scenario_dir: &Path, id: &str) -> bool {
    normalize_id(id).is_ok_and(|id| backup_checksum_file(scenario_dir, id).is_file())
}

/// Copy the live save (and its checksum, if any) into `saves/`.
///
/// Returns `false` when there is no save yet or a copy fails.
pub fn create_backup(scenario_dir: &Path) -> bool {
    let res = create_backup_at(scenario_dir, Local::now().naive_local());
    report("create backup", scenario_dir, res).is_some()
}

pub fn create_backup_at(scenario_dir: &Path, when: NaiveDateTime) -> Result<String, BackupError> {
    let save = save_path(scenario_dir);
    if !save.is_file() {
        return Err(BackupError::NoSave);
    }
    let dir = backup_dir(scenario_dir);
    fs::create_dir_all(&dir).map_err(|e| BackupError::io(&dir, e))?;

    let id = backup_id(when);
    let target = backup_file(scenario_dir, &id);
    let target_existed = target.exists();
    if let Err(e) = fs::copy(&save, &target) {
        // Only clean up what this call created; an earlier same-second record stays.
        if !target_existed {
            discard(&target);
        }
        return Err(BackupError::io(&target, e));
    }

    let checksum = checksum_path(scenario_dir);
    let target_sum = backup_checksum_file(scenario_dir, &id);
    if checksum.is_file() {
        let sum_existed = target_sum.exists();
        if let Err(e) = fs::copy(&checksum, &target_sum) {
            if !sum_existed {
                discard(&target_sum);
            }
            if !target_existed {
                discard(&target);
            }
            return Err(BackupError::io(&target_sum, e));
        }
    } else if target_sum.is_file() {
        // Same-second overwrite: a sidecar from the earlier backup no longer matches.
        discard(&target_sum);
    }

    info!("created backup {} in {}", id, dir.display());
    Ok(id)
}

/// Backup identifiers, most recent first. Empty when there is no `saves/`.
pub fn list_backups(scenario_dir: &Path) -> Vec<String> {
    report("list backups", scenario_dir, try_list_backups(scenario_dir)).unwrap_or_default()
}

pub fn try_list_backups(scenario_dir: &Path) -> Result<Vec<String>, BackupError> {
    let dir = backup_dir(scenario_dir);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let rd = fs::read_dir(&dir).map_err(|e| BackupError::io(&dir, e))?;
    let mut ids = BTreeSet::new();
    for entry in rd {
        let entry = entry.map_err(|e| BackupError::io(&dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        let Some(stem) = name.strip_suffix(BACKUP_EXT) else {
            continue;
        };
        if let Ok(id) = normalize_id(stem) {
            ids.insert(id.to_owned());
        }
    }
    Ok(ids.into_iter().rev().collect())
}

/// Overwrite the live save with backup `id`; the backup itself stays.
///
/// Destructive: the current save is replaced without confirmation and
/// without backing it up first. Callers are expected to ask the user.
/// When the backup has no checksum sidecar the live one is left untouched.
pub fn restore_backup(scenario_dir: &Path, id: &str) -> bool {
    report("restore backup", scenario_dir, try_restore_backup(scenario_dir, id)).is_some()
}

pub fn try_restore_backup(scenario_dir: &Path, id: &str) -> Result<(), BackupError> {
    let id = normalize_id(id)?;
    let src = backup_file(scenario_dir, id);
    if !src.is_file() {
        return Err(BackupError::NotFound(id.to_owned()));
    }
    let save = save_path(scenario_dir);
    fs::copy(&src, &save).map_err(|e| BackupError::io(&save, e))?;

    let src_sum = backup_checksum_file(scenario_dir, id);
    if src_sum.is_file() {
        let live_sum = checksum_path(scenario_dir);
        fs::copy(&src_sum, &live_sum).map_err(|e| BackupError::io(&live_sum, e))?;
    }
    info!("restored backup {} in {}", id, scenario_dir.display());
    Ok(())
}

/// Remove backup `id` and its sidecar. Succeeds if either file was removed.
pub fn delete_backup(scenario_dir: &Path, id: &str) -> bool {
    report("delete backup", scenario_dir, try_delete_backup(scenario_dir, id)).is_some()
}

pub fn try_delete_backup(scenario_dir: &Path, id: &str) -> Result<(), BackupError> {
    let id = normalize_id(id)?;
    let mut removed = false;
    let mut failure = None;
    for path in [
        backup_file(scenario_dir, id),
        backup_checksum_file(scenario_dir, id),
    ] {
        if !path.is_file() {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => removed = true,
            Err(e) => failure = Some(BackupError::io(path, e)),
        }
    }
    if let Some(e) = failure {
        return Err(e);
    }
    if !removed {
        return Err(BackupError::NotFound(id.to_owned()));
    }
    info!("deleted backup {} in {}", id, scenario_dir.display());
    Ok(())
}

/// Accepts `CurrentSave-<token>` (optionally with `.bin`) and nothing else,
/// so an identifier can never point outside `saves/`.
fn normalize_id(id: &str) -> Result<&str, BackupError> {
    let id = id.trim();
    let id = id.strip_suffix(BACKUP_EXT).unwrap_or(id);
    match id.strip_prefix(BACKUP_PREFIX) {
        Some(token) if is_token(token) => Ok(id),
        _ => Err(BackupError::InvalidId(id.to_owned())),
    }
}

// YYYY-MM-DD-HH-MM-SS, zero padded.
fn is_token(s: &str) -> bool {
    s.len() == 19
        && s.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 | 10 | 13 | 16 => b == b'-',
            _ => b.is_ascii_digit(),
        })
}

fn discard(path: &Path) {
    if path.exists()
        && let Err(e) = fs::remove_file(path)
    {
        error!("cannot remove partial backup {}: {}", path.display(), e);
    }
}

fn report<T>(op: &str, scenario_dir: &Path, res: Result<T, BackupError>) -> Option<T> {
    match res {
        Ok(v) => Some(v),
        Err(e) if e.is_not_found() => {
            debug!("{} in {}: {}", op, scenario_dir.display(), e);
            None
        }
        Err(e) => {
            error!("{} in {} failed: {}", op, scenario_dir.display(), e);
            None
        }
    }
}
