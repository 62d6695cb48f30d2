//! Filesystem services used by the organizer.

pub mod maintenance;
pub mod scanner;

pub use maintenance::{count_folders, create_backup, prune_empty_dirs, BackupReport, BACKUP_PREFIX};
pub use scanner::{FileScanner, ScanOutcome};
