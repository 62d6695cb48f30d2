use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One file queued for organizing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileTask {
    /// Absolute path at scan time
    pub path: PathBuf,
    /// Lower-cased extension including the leading dot, empty if none
    pub extension: String,
    pub size: u64,
}

impl FileTask {
    pub fn new(path: PathBuf, size: u64) -> Self {
        let extension = extension_of(&path);
        Self {
            path,
            extension,
            size,
        }
    }

    /// File name as a display string
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Lower-cased `.ext` of a path, or an empty string
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}
