//! Per-file body run by every worker of an organize run.

use crate::classifier::{Classification, ClassificationSource, Classifier};
use crate::error::Result;
use crate::execution::mover::move_into;
use crate::history::MoveRecord;
use crate::models::{EventSink, FileTask, OrganizerEvent, RunStats};
use std::any::Any;
use std::ffi::{OsStr, OsString};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Status message cadence, in files
const STATUS_EVERY: usize = 10;

/// Cooperative cancellation for a running organize pass.
///
/// Workers check it before each file; files not yet started are left alone.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(pub Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything workers mutate, behind one lock
#[derive(Debug, Default)]
pub(crate) struct RunState {
    pub stats: RunStats,
    pub records: Vec<MoveRecord>,
    /// Files finished so far, moved or not
    pub attempted: usize,
}

pub(crate) struct WorkerContext {
    pub root: PathBuf,
    pub classifier: Classifier,
    pub events: EventSink,
    pub cancel: CancelFlag,
    pub total: usize,
    pub state: Mutex<RunState>,
}

impl WorkerContext {
    /// A panicking worker must not take the statistics of the others with it
    pub fn lock_state(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Classify, move and account for one file.
    ///
    /// A panic in classification or the move (e.g. inside a model
    /// collaborator) only fails this file; the rest of the chunk goes on.
    pub fn process(&self, task: FileTask) {
        if self.cancel.is_cancelled() {
            return;
        }

        let file_name = task.file_name();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.classify_and_move(&task, &file_name)));

        let (classification, moved) = match outcome {
            Ok(result) => result,
            Err(payload) => {
                let reason = format!("panicked: {}", panic_message(payload.as_ref()));
                tracing::error!(file = %task.path.display(), reason = %reason, "File processing panicked");
                let mut state = self.lock_state();
                state.stats.record_failure(&file_name, &reason);
                self.finish_file(&mut state);
                return;
            }
        };
        let category_path = classification.category_path();

        let mut state = self.lock_state();

        if classification.source == ClassificationSource::Document {
            state.stats.record_document_category(&classification.category);
        }

        let moved_ok = match moved {
            Ok(new_path) => {
                let size = std::fs::metadata(&new_path)
                    .map(|m| m.len())
                    .unwrap_or(task.size);
                state
                    .stats
                    .record_move(size, &category_path, &classification.signals);
                state.records.push(MoveRecord::new(
                    task.path.clone(),
                    new_path,
                    category_path.clone(),
                    classification.signals.clone(),
                ));
                true
            }
            Err(e) => {
                tracing::warn!(file = %task.path.display(), error = %e, "Could not organize file");
                state.stats.record_failure(&file_name, &e.to_string());
                false
            }
        };

        self.finish_file(&mut state);
        drop(state);

        if moved_ok {
            self.events.emit(OrganizerEvent::FileProcessed {
                file_name: file_name.clone(),
                category: category_path.clone(),
            });
            if !classification.signals.is_empty() {
                self.events.emit(OrganizerEvent::SignalsDetected {
                    file_name,
                    category: category_path,
                    signals: classification.signals,
                });
            }
        }
    }

    fn classify_and_move(&self, task: &FileTask, file_name: &str) -> (Classification, Result<PathBuf>) {
        let classification = self.classifier.classify(task);

        if let Some(report) = &classification.report {
            self.events.emit(OrganizerEvent::DocumentAnalyzed {
                file_name: file_name.to_string(),
                category: report.analysis.category.clone(),
                summary: report.analysis.summary.clone(),
                metadata: serde_json::to_string_pretty(&report.metadata).unwrap_or_default(),
            });
        }

        // The lossy display name is for events only; the move keeps the raw name
        let name = task
            .path
            .file_name()
            .map(OsStr::to_os_string)
            .unwrap_or_else(|| OsString::from(file_name));
        let target_dir = classification.target_dir(&self.root);
        let moved = move_into(&task.path, &target_dir, &name);

        (classification, moved)
    }

    /// Count the file as done. Called with the lock held so percentages never go backwards.
    fn finish_file(&self, state: &mut RunState) {
        state.attempted += 1;
        let attempted = state.attempted;
        self.events
            .progress((attempted * 100 / self.total.max(1)).min(100) as u8);
        if attempted % STATUS_EVERY == 0 {
            self.events
                .status(format!("İşleniyor: {}/{} dosya", attempted, self.total));
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
