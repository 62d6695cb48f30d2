use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregated statistics for one run.
///
/// Workers only mutate this while holding the run lock.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunStats {
    pub total_files: usize,
    pub processed_files: usize,
    pub skipped_files: usize,
    /// Sub-directories of the source folder after the run
    pub created_folders: usize,
    /// Bytes moved
    pub total_size: u64,
    pub formatted_size: String,
    /// Files per `category[/subcategory]`
    pub category_distribution: BTreeMap<String, usize>,
    /// Occurrences per detected signal (image objects)
    pub detected_objects: BTreeMap<String, usize>,
    /// Files per content-derived document category
    pub document_categories: BTreeMap<String, usize>,
    /// `"<file>: <reason>"` for every recoverable failure
    pub errors: Vec<String>,
    /// Wall time in seconds
    pub processing_time: f64,
    pub thread_count_used: usize,
    pub cancelled: bool,
}

impl RunStats {
    pub fn new(total_files: usize) -> Self {
        Self {
            total_files,
            ..Default::default()
        }
    }

    /// Account for one successfully moved file
    pub fn record_move(&mut self, size: u64, category_path: &str, signals: &[String]) {
        self.processed_files += 1;
        self.total_size += size;
        *self
            .category_distribution
            .entry(category_path.to_string())
            .or_insert(0) += 1;
        for signal in signals {
            *self.detected_objects.entry(signal.clone()).or_insert(0) += 1;
        }
    }

    pub fn record_document_category(&mut self, category: &str) {
        *self
            .document_categories
            .entry(category.to_string())
            .or_insert(0) += 1;
    }

    /// Account for a file that could not be organized
    pub fn record_failure(&mut self, file_name: &str, reason: &str) {
        self.errors.push(format!("{}: {}", file_name, reason));
        self.skipped_files += 1;
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Fill in the derived fields once the run is over
    pub fn finalize(&mut self, elapsed_secs: f64, workers: usize, folder_count: usize) {
        self.processing_time = elapsed_secs;
        self.thread_count_used = workers;
        self.created_folders = folder_count;
        self.formatted_size = format_size(self.total_size);
    }
}

/// Human readable size with two decimals (`1.50 KB`)
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} TB", size)
}
