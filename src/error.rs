//! Error type shared by the organizer pipeline.
//!
//! Per-file problems (extraction, classification, a single failed move) are
//! recovered inside the workers and only ever show up as strings in
//! `RunStats::errors`. `OrganizeError` is what escapes to the caller: run-level
//! failures, move failures reported by the move engine, and history I/O.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("Path does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move {} to {}: {reason}", source_path.display(), destination.display())]
    Move {
        source_path: PathBuf,
        destination: PathBuf,
        reason: String,
    },

    #[error("Failed to read directory tree under {}: {message}", root.display())]
    Traversal { root: PathBuf, message: String },

    #[error("History file {} is corrupt: {source}", path.display())]
    HistoryFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Nothing to undo in {}", .0.display())]
    NothingToUndo(PathBuf),

    #[error("Invalid configuration in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("Worker failed: {0}")]
    Worker(String),
}

impl OrganizeError {
    /// Wrap an `io::Error` with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OrganizeError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<OrganizeError> for String {
    fn from(err: OrganizeError) -> Self {
        err.to_string()
    }
}

pub type Result<T> = std::result::Result<T, OrganizeError>;
