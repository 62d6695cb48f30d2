//! Reverting the most recent run of a folder.

use crate::error::{OrganizeError, Result};
use crate::execution::mover::relocate;
use crate::history::entry::MoveRecord;
use crate::history::store::HistoryStore;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// State of the newest run's files, checked without touching anything
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UndoPreflight {
    pub run_id: String,
    pub total_moves: usize,
    pub restorable: usize,
    /// Moved files no longer at their recorded destination
    pub missing: Vec<PathBuf>,
    /// Original locations that are occupied again
    pub blocked: Vec<PathBuf>,
}

impl UndoPreflight {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.blocked.is_empty()
    }
}

/// Result of undoing one run
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UndoOutcome {
    pub run_id: String,
    pub restored: usize,
    /// `"<path>: <reason>"` for every record that could not be restored
    pub failures: Vec<String>,
    pub remaining_runs: usize,
}

enum RecordState {
    Restorable,
    Missing,
    Blocked,
}

fn record_state(record: &MoveRecord) -> RecordState {
    if !record.new_path.exists() {
        RecordState::Missing
    } else if record.old_path.exists() {
        RecordState::Blocked
    } else {
        RecordState::Restorable
    }
}

pub fn preflight_undo(folder: &Path) -> Result<UndoPreflight> {
    let store = HistoryStore::for_folder(folder);
    let run = store
        .latest()?
        .ok_or_else(|| OrganizeError::NothingToUndo(folder.to_path_buf()))?;

    let mut preflight = UndoPreflight {
        run_id: run.run_id.clone(),
        total_moves: run.movements.len(),
        restorable: 0,
        missing: Vec::new(),
        blocked: Vec::new(),
    };

    for record in &run.movements {
        match record_state(record) {
            RecordState::Restorable => preflight.restorable += 1,
            RecordState::Missing => preflight.missing.push(record.new_path.clone()),
            RecordState::Blocked => preflight.blocked.push(record.old_path.clone()),
        }
    }

    Ok(preflight)
}

/// Pop the newest run and move each of its files back.
///
/// Records whose file is gone or whose original location is taken are
/// skipped; a failing record never stops the others.
pub fn undo_last_run(folder: &Path) -> Result<UndoOutcome> {
    let store = HistoryStore::for_folder(folder);
    let run = store
        .pop_latest()?
        .ok_or_else(|| OrganizeError::NothingToUndo(folder.to_path_buf()))?;

    let mut restored = 0;
    let mut failures = Vec::new();

    for record in &run.movements {
        let result = match record_state(record) {
            RecordState::Missing => Err("no longer at its organized location".to_string()),
            RecordState::Blocked => Err(format!(
                "original location is occupied: {}",
                record.old_path.display()
            )),
            RecordState::Restorable => restore(record).map_err(|e| e.to_string()),
        };

        match result {
            Ok(()) => restored += 1,
            Err(reason) => {
                tracing::warn!(file = %record.new_path.display(), reason = %reason, "Could not restore file");
                failures.push(format!("{}: {}", record.new_path.display(), reason));
            }
        }
    }

    let remaining_runs = store.run_count();
    tracing::info!(
        run_id = %run.run_id,
        restored,
        failed = failures.len(),
        remaining_runs,
        "Undo finished"
    );

    Ok(UndoOutcome {
        run_id: run.run_id,
        restored,
        failures,
        remaining_runs,
    })
}

fn restore(record: &MoveRecord) -> Result<()> {
    if let Some(parent) = record.old_path.parent() {
        fs::create_dir_all(parent).map_err(|e| OrganizeError::io(parent, e))?;
    }
    relocate(&record.new_path, &record.old_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::mover::move_into;
    use crate::history::entry::RunRecord;
    use tempfile::TempDir;

    /// Organize `names` into `category` and record the run
    fn organize(root: &Path, names: &[&str], category: &str) -> RunRecord {
        let mut run = RunRecord::new();
        for name in names {
            let source = root.join(name);
            let moved = move_into(&source, &root.join(category), name).unwrap();
            run.movements.push(MoveRecord::new(source, moved, category.to_string(), vec![]));
        }
        run.processed_files = names.len();
        HistoryStore::for_folder(root).append(run.clone()).unwrap();
        run
    }

    #[test]
    fn test_undo_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for name in ["a.txt", "b.txt", "c.jpg"] {
            fs::write(root.join(name), name).unwrap();
        }

        organize(root, &["a.txt", "b.txt", "c.jpg"], "Belgeler");
        assert!(!root.join("a.txt").exists());

        let outcome = undo_last_run(root).unwrap();
        assert_eq!(outcome.restored, 3);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.remaining_runs, 0);

        for name in ["a.txt", "b.txt", "c.jpg"] {
            assert_eq!(fs::read_to_string(root.join(name)).unwrap(), name);
        }
        assert!(!HistoryStore::for_folder(root).path().exists());
    }

    #[test]
    fn test_undo_skips_missing_and_blocked() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for name in ["a.txt", "b.txt", "c.txt"] {
            fs::write(root.join(name), name).unwrap();
        }
        organize(root, &["a.txt", "b.txt", "c.txt"], "Belgeler");

        fs::remove_file(root.join("Belgeler").join("a.txt")).unwrap();
        fs::write(root.join("b.txt"), "new b").unwrap();

        let preflight = preflight_undo(root).unwrap();
        assert_eq!(preflight.restorable, 1);
        assert_eq!(preflight.missing.len(), 1);
        assert_eq!(preflight.blocked, vec![root.join("b.txt")]);

        let outcome = undo_last_run(root).unwrap();
        assert_eq!(outcome.restored, 1);
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(fs::read_to_string(root.join("b.txt")).unwrap(), "new b");
        assert_eq!(fs::read_to_string(root.join("c.txt")).unwrap(), "c.txt");
        assert!(root.join("Belgeler").join("b.txt").exists());
    }

    #[test]
    fn test_undo_only_pops_newest_run() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.txt"), "a").unwrap();
        fs::write(root.join("b.txt"), "b").unwrap();

        organize(root, &["a.txt"], "Belgeler");
        organize(root, &["b.txt"], "Diğerleri");

        let outcome = undo_last_run(root).unwrap();
        assert_eq!(outcome.restored, 1);
        assert_eq!(outcome.remaining_runs, 1);
        assert!(root.join("b.txt").exists());
        assert!(!root.join("a.txt").exists());
    }

    #[test]
    fn test_nothing_to_undo() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            undo_last_run(temp_dir.path()),
            Err(OrganizeError::NothingToUndo(_))
        ));
        assert!(matches!(
            preflight_undo(temp_dir.path()),
            Err(OrganizeError::NothingToUndo(_))
        ));
    }
}
