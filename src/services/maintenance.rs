//! Folder housekeeping around a run: backups, empty-folder pruning, counts.

use crate::error::{OrganizeError, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Prefix of backup folders created inside the organized folder
pub const BACKUP_PREFIX: &str = "backup_";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackupReport {
    pub backup_dir: PathBuf,
    pub copied: usize,
    /// `"<file>: <reason>"` for files that could not be copied
    pub failures: Vec<String>,
}

/// Copy the top-level files of `root` into a fresh `backup_<YYYYmmdd_HHMMSS>` folder.
///
/// Dotfiles and earlier backups are left out. Returns `None` when a backup
/// with the same timestamp already exists.
pub fn create_backup(root: &Path) -> Result<Option<BackupReport>> {
    let name = format!(
        "{}{}",
        BACKUP_PREFIX,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let backup_dir = root.join(&name);

    if backup_dir.exists() {
        tracing::info!(dir = %backup_dir.display(), "Backup for this second already exists");
        return Ok(None);
    }
    fs::create_dir(&backup_dir).map_err(|e| OrganizeError::io(&backup_dir, e))?;

    let mut report = BackupReport {
        backup_dir: backup_dir.clone(),
        copied: 0,
        failures: Vec::new(),
    };

    let entries = fs::read_dir(root).map_err(|e| OrganizeError::io(root, e))?;
    for entry in entries.flatten() {
        let file_name = entry.file_name().to_string_lossy().to_string();
        if file_name.starts_with('.') || file_name.starts_with(BACKUP_PREFIX) {
            continue;
        }
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }

        match fs::copy(entry.path(), backup_dir.join(&file_name)) {
            Ok(_) => report.copied += 1,
            Err(e) => {
                tracing::warn!(file = %file_name, error = %e, "Could not back up file");
                report.failures.push(format!("{}: {}", file_name, e));
            }
        }
    }

    tracing::info!(
        dir = %backup_dir.display(),
        copied = report.copied,
        failed = report.failures.len(),
        "Backup created"
    );

    Ok(Some(report))
}

/// Remove every empty directory below `root` (never `root` itself), deepest first.
///
/// Directories that become empty because their children were removed are
/// removed too. Returns the number of directories removed.
pub fn prune_empty_dirs(root: &Path) -> usize {
    let mut removed = 0;

    for entry in WalkDir::new(root)
        .min_depth(1)
        .contents_first(true)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
    {
        let is_empty = fs::read_dir(entry.path())
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);

        if is_empty {
            match fs::remove_dir(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::debug!(dir = %entry.path().display(), error = %e, "Could not remove empty folder")
                }
            }
        }
    }

    if removed > 0 {
        tracing::info!(root = %root.display(), removed, "Pruned empty folders");
    }
    removed
}

/// Number of directories anywhere below `root`
pub fn count_folders(root: &Path) -> usize {
    WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .count()
}
