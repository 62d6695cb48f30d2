//! File collection for a run.

use crate::error::{OrganizeError, Result};
use crate::models::FileTask;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

/// Collects the files a run will organize
#[derive(Debug, Clone)]
pub struct FileScanner {
    recursive: bool,
    max_file_size: u64,
    /// File and directory names never collected; matching directories are not entered
    ignore: HashSet<String>,
}

/// Statistics and files from a scan
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutcome {
    pub files: Vec<FileTask>,
    /// Files over the size limit or whose metadata could not be read
    pub skipped: usize,
    pub scan_duration_ms: u64,
}

impl FileScanner {
    pub fn new(ignore: HashSet<String>, max_file_size: u64) -> Self {
        Self {
            recursive: false,
            max_file_size,
            ignore,
        }
    }

    /// Descend into sub-directories
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Also skip `name` (e.g. a backup folder created for this run)
    pub fn with_ignored(mut self, name: impl Into<String>) -> Self {
        self.ignore.insert(name.into());
        self
    }

    fn is_ignored(&self, name: &str) -> bool {
        self.ignore.contains(name)
    }

    /// Regular files under `root`, sorted by path within each directory
    pub fn scan(&self, root: &Path) -> Result<ScanOutcome> {
        let start = Instant::now();

        if !root.exists() {
            return Err(OrganizeError::NotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(OrganizeError::NotADirectory(root.to_path_buf()));
        }

        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(if self.recursive { usize::MAX } else { 1 })
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_ignored(&entry.file_name().to_string_lossy()));

        let mut outcome = ScanOutcome::default();

        for entry_result in walker {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(OrganizeError::Traversal {
                        root: root.to_path_buf(),
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        path = %e.path().map(|p| p.display().to_string()).unwrap_or_default(),
                        error = %e,
                        "Skipping unreadable entry"
                    );
                    outcome.skipped += 1;
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let size = match entry.metadata() {
                Ok(meta) => meta.len(),
                Err(e) => {
                    tracing::warn!(file = %entry.path().display(), error = %e, "Cannot read file metadata");
                    outcome.skipped += 1;
                    continue;
                }
            };

            if size > self.max_file_size {
                tracing::debug!(file = %entry.path().display(), size, "Skipping oversized file");
                outcome.skipped += 1;
                continue;
            }

            outcome.files.push(FileTask::new(PathBuf::from(entry.path()), size));
        }

        outcome.scan_duration_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            root = %root.display(),
            files = outcome.files.len(),
            skipped = outcome.skipped,
            recursive = self.recursive,
            duration_ms = outcome.scan_duration_ms,
            "Scan complete"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrganizerConfig;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.txt"), "bb").unwrap();
        fs::write(dir.path().join("a.jpg"), "a").unwrap();
        fs::write(dir.path().join(".DS_Store"), "junk").unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("c.pdf"), "c").unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git").join("HEAD"), "ref").unwrap();
        dir
    }

    fn scanner() -> FileScanner {
        let config = OrganizerConfig::default();
        FileScanner::new(config.ignore_set(), config.max_file_size)
    }

    fn names(outcome: &ScanOutcome) -> Vec<String> {
        outcome.files.iter().map(|f| f.file_name()).collect()
    }

    #[test]
    fn test_top_level_only() {
        let dir = create_test_dir();
        let outcome = scanner().scan(dir.path()).unwrap();

        assert_eq!(names(&outcome), vec!["a.jpg", "b.txt"]);
        assert_eq!(outcome.files[1].size, 2);
        assert_eq!(outcome.files[1].extension, ".txt");
    }

    #[test]
    fn test_recursive_prunes_ignored_dirs() {
        let dir = create_test_dir();
        let outcome = scanner().with_recursive(true).scan(dir.path()).unwrap();

        assert_eq!(names(&outcome), vec!["a.jpg", "b.txt", "c.pdf"]);
    }

    #[test]
    fn test_history_file_is_never_collected() {
        let dir = create_test_dir();
        fs::write(dir.path().join(crate::config::HISTORY_FILE_NAME), "[]").unwrap();

        let outcome = scanner().scan(dir.path()).unwrap();
        assert_eq!(outcome.files.len(), 2);
    }

    #[test]
    fn test_oversized_files_are_skipped() {
        let dir = create_test_dir();
        let outcome = FileScanner::new(HashSet::new(), 1).scan(dir.path()).unwrap();

        // b.txt (2 bytes) and .DS_Store (4 bytes) are over the limit
        assert_eq!(names(&outcome), vec!["a.jpg"]);
        assert_eq!(outcome.skipped, 2);
    }

    #[test]
    fn test_extra_ignored_name() {
        let dir = create_test_dir();
        let outcome = scanner()
            .with_recursive(true)
            .with_ignored("sub")
            .scan(dir.path())
            .unwrap();
        assert_eq!(names(&outcome), vec!["a.jpg", "b.txt"]);
    }

    #[test]
    fn test_invalid_roots() {
        let dir = create_test_dir();
        assert!(matches!(
            scanner().scan(&dir.path().join("missing")),
            Err(OrganizeError::NotFound(_))
        ));
        assert!(matches!(
            scanner().scan(&dir.path().join("b.txt")),
            Err(OrganizeError::NotADirectory(_))
        ));
    }
}
