//! Persistence of a folder's run history.
//!
//! Each organized folder carries its own history file (`HISTORY_FILE_NAME`),
//! a JSON array of runs with the newest last.

use crate::config::HISTORY_FILE_NAME;
use crate::error::{OrganizeError, Result};
use crate::history::entry::{push_bounded, RunRecord, RunSummary};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

pub struct HistoryStore {
    history_path: PathBuf,
}

impl HistoryStore {
    /// Store for the history file inside `folder`
    pub fn for_folder(folder: &Path) -> Self {
        Self {
            history_path: folder.join(HISTORY_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.history_path
    }

    /// All retained runs, oldest first. A missing file is an empty history.
    pub fn history(&self) -> Result<Vec<RunRecord>> {
        let file = match File::open(&self.history_path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(OrganizeError::io(&self.history_path, e)),
        };

        serde_json::from_reader(BufReader::new(file)).map_err(|e| OrganizeError::HistoryFormat {
            path: self.history_path.clone(),
            source: e,
        })
    }

    /// Summaries, most recent first
    pub fn summaries(&self) -> Result<Vec<RunSummary>> {
        Ok(self.history()?.iter().rev().map(|r| r.to_summary()).collect())
    }

    pub fn run_count(&self) -> usize {
        match self.history() {
            Ok(runs) => runs.len(),
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable history file");
                0
            }
        }
    }

    pub fn has_history(&self) -> bool {
        self.run_count() > 0
    }

    /// Append a run, evicting the oldest ones beyond the retention limit
    pub fn append(&self, run: RunRecord) -> Result<()> {
        let mut runs = self.history()?;
        push_bounded(&mut runs, run);
        self.atomic_write(&runs)?;

        tracing::info!(
            path = %self.history_path.display(),
            runs = runs.len(),
            "Saved run history"
        );
        Ok(())
    }

    /// Remove and return the newest run. The file is deleted once empty.
    pub fn pop_latest(&self) -> Result<Option<RunRecord>> {
        let mut runs = self.history()?;
        let Some(latest) = runs.pop() else {
            return Ok(None);
        };

        if runs.is_empty() {
            self.delete()?;
        } else {
            self.atomic_write(&runs)?;
        }
        Ok(Some(latest))
    }

    /// Newest run without removing it
    pub fn latest(&self) -> Result<Option<RunRecord>> {
        Ok(self.history()?.pop())
    }

    pub fn delete(&self) -> Result<()> {
        match fs::remove_file(&self.history_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(OrganizeError::io(&self.history_path, e)),
        }
    }

    /// Atomically write JSON to the history file
    fn atomic_write(&self, runs: &[RunRecord]) -> Result<()> {
        let temp_path = self.history_path.with_extension("tmp");
        let io_err = |e| OrganizeError::io(&temp_path, e);

        let file = File::create(&temp_path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);

        serde_json::to_writer_pretty(&mut writer, runs).map_err(|e| OrganizeError::HistoryFormat {
            path: self.history_path.clone(),
            source: e,
        })?;

        writer.flush().map_err(io_err)?;
        writer.get_ref().sync_all().map_err(io_err)?;

        fs::rename(&temp_path, &self.history_path)
            .map_err(|e| OrganizeError::io(&self.history_path, e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::entry::MAX_RUNS_PER_FOLDER;
    use tempfile::TempDir;

    fn create_test_store() -> (HistoryStore, TempDir) {
        let target_dir = TempDir::new().unwrap();
        let store = HistoryStore::for_folder(target_dir.path());
        (store, target_dir)
    }

    fn create_test_run(id: &str) -> RunRecord {
        RunRecord {
            run_id: id.to_string(),
            processed_files: 5,
            ..RunRecord::new()
        }
    }

    #[test]
    fn test_append_and_load() {
        let (store, _target_dir) = create_test_store();
        store.append(create_test_run("run-1")).unwrap();

        let runs = store.history().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].run_id, "run-1");
        assert!(!store.path().with_extension("tmp").exists());
    }

    #[test]
    fn test_has_history() {
        let (store, _target_dir) = create_test_store();
        assert!(!store.has_history());

        store.append(create_test_run("run-1")).unwrap();
        assert!(store.has_history());
        assert_eq!(store.run_count(), 1);
    }

    #[test]
    fn test_sixth_run_evicts_oldest() {
        let (store, _target_dir) = create_test_store();
        for i in 1..=6 {
            store.append(create_test_run(&format!("run-{}", i))).unwrap();
        }

        let runs = store.history().unwrap();
        assert_eq!(runs.len(), MAX_RUNS_PER_FOLDER);
        let ids: Vec<&str> = runs.iter().map(|r| r.run_id.as_str()).collect();
        assert_eq!(ids, vec!["run-2", "run-3", "run-4", "run-5", "run-6"]);
    }

    #[test]
    fn test_summaries_most_recent_first() {
        let (store, _target_dir) = create_test_store();
        store.append(create_test_run("run-1")).unwrap();
        store.append(create_test_run("run-2")).unwrap();

        let summaries = store.summaries().unwrap();
        assert_eq!(summaries[0].run_id, "run-2");
        assert_eq!(summaries[1].run_id, "run-1");
    }

    #[test]
    fn test_pop_last_run_removes_file() {
        let (store, _target_dir) = create_test_store();
        store.append(create_test_run("run-1")).unwrap();
        store.append(create_test_run("run-2")).unwrap();

        assert_eq!(store.pop_latest().unwrap().unwrap().run_id, "run-2");
        assert!(store.path().exists());
        assert_eq!(store.pop_latest().unwrap().unwrap().run_id, "run-1");
        assert!(!store.path().exists());
        assert!(store.pop_latest().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let (store, _target_dir) = create_test_store();
        fs::write(store.path(), "{ not json").unwrap();

        let err = store.history().unwrap_err();
        assert!(matches!(err, OrganizeError::HistoryFormat { .. }));
        assert!(!store.has_history());
    }
}
