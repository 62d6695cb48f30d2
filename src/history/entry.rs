//! Records persisted in a folder's history file.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Runs kept per folder; older ones are evicted first
pub const MAX_RUNS_PER_FOLDER: usize = 5;

/// One file moved by a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoveRecord {
    pub old_path: PathBuf,
    pub new_path: PathBuf,
    /// `category` or `category/subcategory`
    pub category: String,
    /// Detected objects, empty for documents
    #[serde(default)]
    pub objects: Vec<String>,
    pub timestamp: DateTime<Local>,
}

impl MoveRecord {
    pub fn new(old_path: PathBuf, new_path: PathBuf, category: String, objects: Vec<String>) -> Self {
        Self {
            old_path,
            new_path,
            category,
            objects,
            timestamp: Local::now(),
        }
    }
}

/// One completed organizer run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunRecord {
    pub run_id: String,
    pub timestamp: DateTime<Local>,
    pub ai_mode: bool,
    pub document_ai_mode: bool,
    pub requested_threads: usize,
    pub actual_threads: usize,
    pub optimization_enabled: bool,
    pub total_files: usize,
    pub processed_files: usize,
    #[serde(default)]
    pub document_categories: BTreeMap<String, usize>,
    /// Seconds
    pub processing_time: f64,
    pub movements: Vec<MoveRecord>,
}

impl RunRecord {
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Local::now(),
            ai_mode: false,
            document_ai_mode: false,
            requested_threads: 0,
            actual_threads: 0,
            optimization_enabled: false,
            total_files: 0,
            processed_files: 0,
            document_categories: BTreeMap::new(),
            processing_time: 0.0,
            movements: Vec::new(),
        }
    }

    /// Convert to a lightweight summary
    pub fn to_summary(&self) -> RunSummary {
        RunSummary {
            run_id: self.run_id.clone(),
            timestamp: self.timestamp,
            ai_mode: self.ai_mode,
            document_ai_mode: self.document_ai_mode,
            processed_files: self.processed_files,
            move_count: self.movements.len(),
        }
    }
}

impl Default for RunRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Lightweight run summary for listing
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: String,
    pub timestamp: DateTime<Local>,
    pub ai_mode: bool,
    pub document_ai_mode: bool,
    pub processed_files: usize,
    pub move_count: usize,
}

/// Append `run` (newest last) and evict the oldest runs beyond the retention limit
pub fn push_bounded(runs: &mut Vec<RunRecord>, run: RunRecord) {
    runs.push(run);
    if runs.len() > MAX_RUNS_PER_FOLDER {
        let excess = runs.len() - MAX_RUNS_PER_FOLDER;
        runs.drain(..excess);
    }
}
