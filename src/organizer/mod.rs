//! Organizer facade: one entry point per user-visible operation.
//!
//! A run goes validate → backup → scan → size the pool → classify and move in
//! parallel → prune → persist history → report. Progress flows out through the
//! [`EventSink`]; the terminal `Finished` event is sent exactly once per run.

mod worker;

pub use worker::CancelFlag;

use crate::capabilities::{CapabilityReport, Capabilities};
use crate::classifier::{keywords, Classifier, ClassifierModes, DocumentMetadata};
use crate::config::OrganizerConfig;
use crate::error::{OrganizeError, Result};
use crate::execution::{optimal_workers, scheduler, SystemTelemetry, WorkerPlan};
use crate::extract::is_document_extension;
use crate::history::{self, HistoryStore, RunRecord, RunSummary, UndoOutcome, UndoPreflight};
use crate::models::{EventSink, OrganizerEvent, RunStats};
use crate::services::{self, BackupReport, FileScanner};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use worker::{RunState, WorkerContext};

/// Characters of extracted text kept in a `DocumentAnalysis`
const PREVIEW_CHARS: usize = 500;

/// What a single organize run should do
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub source: PathBuf,
    /// Caption images and file them into object subfolders
    pub image_ai: bool,
    /// Classify documents by their content
    pub document_ai: bool,
    pub include_subfolders: bool,
    /// Remove folders left empty after the run
    pub delete_empty: bool,
    /// Copy top-level files into a backup folder first
    pub backup: bool,
    /// Requested workers; `None` uses the configured thread count
    pub threads: Option<usize>,
}

impl RunOptions {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            image_ai: false,
            document_ai: false,
            include_subfolders: false,
            delete_empty: false,
            backup: false,
            threads: None,
        }
    }
}

/// Result of a run that got as far as scanning
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub success: bool,
    pub stats: RunStats,
    /// Id of the persisted history entry, if any file was moved
    pub run_id: Option<String>,
    pub plan: Option<WorkerPlan>,
    pub backup: Option<BackupReport>,
    pub pruned_dirs: usize,
}

/// Content analysis of one document, without moving it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAnalysis {
    pub file_name: String,
    pub path: PathBuf,
    pub category: String,
    pub related_categories: Vec<String>,
    pub summary: String,
    pub metadata: DocumentMetadata,
    pub text_preview: String,
}

pub struct Organizer {
    config: Arc<OrganizerConfig>,
    capabilities: Capabilities,
    events: EventSink,
    cancel: CancelFlag,
}

impl Organizer {
    pub fn new(config: OrganizerConfig, capabilities: Capabilities) -> Self {
        Self {
            config: Arc::new(config),
            capabilities,
            events: EventSink::disabled(),
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Share a cancellation flag with the caller.
    ///
    /// A cancel applies to the run in progress, or to the next one if none is
    /// running. Every run clears the flag when its workers are done.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn config(&self) -> &OrganizerConfig {
        &self.config
    }

    pub fn capabilities(&self) -> CapabilityReport {
        self.capabilities.describe()
    }

    /// Organize `options.source`.
    ///
    /// Returns `Err` only for run-level failures (missing source, traversal
    /// failure, a worker that died). Per-file problems end up in
    /// `RunStats::errors`.
    pub async fn run(&self, options: RunOptions) -> Result<RunReport> {
        let start = Instant::now();
        let source = options.source.clone();

        if let Err(e) = validate_source(&source) {
            return Err(self.abort(e, RunStats::default()));
        }

        tracing::info!(
            source = %source.display(),
            image_ai = options.image_ai,
            document_ai = options.document_ai,
            recursive = options.include_subfolders,
            "Organize run started"
        );

        let backup = if options.backup && self.config.backup_enabled {
            self.events.status("Yedekleme yapılıyor...");
            let root = source.clone();
            match tokio::task::spawn_blocking(move || services::create_backup(&root)).await {
                Ok(Ok(report)) => report,
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "Backup failed, continuing without one");
                    self.events.emit(OrganizerEvent::Error {
                        message: format!("Yedekleme hatası: {}", e),
                    });
                    None
                }
                Err(e) => {
                    tracing::error!(error = %e, "Backup task panicked");
                    None
                }
            }
        } else {
            None
        };

        self.events.status("Dosyalar taranıyor...");
        let mut scanner = FileScanner::new(self.config.ignore_set(), self.config.max_file_size)
            .with_recursive(options.include_subfolders);
        if let Some(name) = backup
            .as_ref()
            .and_then(|b| b.backup_dir.file_name())
            .map(|n| n.to_string_lossy().to_string())
        {
            scanner = scanner.with_ignored(name);
        }

        let root = source.clone();
        let scanned = tokio::task::spawn_blocking(move || scanner.scan(&root))
            .await
            .map_err(|e| OrganizeError::Worker(format!("Scan task failed: {}", e)))
            .and_then(|result| result);
        let scan = match scanned {
            Ok(scan) => scan,
            Err(e) => return Err(self.abort(e, RunStats::default())),
        };

        let mut stats = RunStats::new(scan.files.len());
        stats.skipped_files = scan.skipped;

        if scan.files.is_empty() {
            self.events.status("Düzenlenecek dosya bulunamadı!");
            stats.finalize(start.elapsed().as_secs_f64(), 0, services::count_folders(&source));
            self.events.emit(OrganizerEvent::Finished {
                success: false,
                stats: stats.clone(),
            });
            return Ok(RunReport {
                success: false,
                stats,
                run_id: None,
                plan: None,
                backup,
                pruned_dirs: 0,
            });
        }

        let requested = options.threads.unwrap_or(self.config.thread_count);
        let telemetry = self.sample_telemetry().await;
        if let Some(t) = &telemetry {
            self.events.emit(OrganizerEvent::SystemInfo {
                message: format!(
                    "Sistem: {} çekirdek / {} thread, RAM: {:.1}GB, İstenen thread: {}",
                    t.physical_cores,
                    t.logical_cores,
                    t.total_memory_gib(),
                    requested
                ),
            });
        }

        let plan = optimal_workers(
            scan.files.len(),
            requested,
            telemetry.as_ref(),
            self.config.enable_system_optimization,
            &self.config.thresholds,
        );
        if plan.was_reduced() {
            let cores = telemetry.map(|t| t.logical_cores).unwrap_or(0);
            self.events.status(format!(
                "Sistem optimizasyonu: {} thread → {} thread (CPU: {} thread, %{} azaltma)",
                plan.requested,
                plan.workers,
                cores,
                plan.reduction_percent()
            ));
        }
        tracing::debug!(
            files = scan.files.len(),
            requested = plan.requested,
            workers = plan.workers,
            decisions = ?plan.decisions,
            "Worker pool sized"
        );
        self.events.status(format!(
            "Dosyalar işleniyor ({} thread kullanılıyor)...",
            plan.workers
        ));

        let modes = ClassifierModes {
            image_ai: options.image_ai && self.config.ai_enabled,
            document_ai: options.document_ai && self.config.document_ai_enabled,
        };
        let total = scan.files.len();
        let context = Arc::new(WorkerContext {
            root: source.clone(),
            classifier: Classifier::new(Arc::clone(&self.config), &self.capabilities, modes),
            events: self.events.clone(),
            cancel: self.cancel.clone(),
            total,
            state: Mutex::new(RunState {
                stats,
                ..Default::default()
            }),
        });

        let worker_context = Arc::clone(&context);
        let report = scheduler::run(scan.files, plan.workers, move |_, task| {
            worker_context.process(task)
        })
        .await;

        let (mut stats, mut records) = {
            let mut state = context.lock_state();
            (
                std::mem::take(&mut state.stats),
                std::mem::take(&mut state.records),
            )
        };
        stats.cancelled = self.cancel.is_cancelled();
        self.cancel.reset();
        stats.errors.extend(report.failures.iter().cloned());

        let pruned_dirs = if options.delete_empty {
            services::prune_empty_dirs(&source)
        } else {
            0
        };

        stats.finalize(
            start.elapsed().as_secs_f64(),
            plan.workers,
            services::count_folders(&source),
        );

        // The history file is JSON, which cannot hold non-UTF-8 paths
        records.retain(|record| {
            let storable = record.old_path.to_str().is_some() && record.new_path.to_str().is_some();
            if !storable {
                tracing::warn!(file = %record.new_path.display(), "Name is not UTF-8, move not recorded for undo");
                stats.errors.push(format!(
                    "{}: not recorded in history (name is not valid UTF-8)",
                    record.new_path.display()
                ));
            }
            storable
        });

        let run_id = if records.is_empty() {
            None
        } else {
            let mut run = RunRecord::new();
            run.ai_mode = modes.image_ai;
            run.document_ai_mode = modes.document_ai;
            run.requested_threads = plan.requested;
            run.actual_threads = plan.workers;
            run.optimization_enabled = self.config.enable_system_optimization;
            run.total_files = stats.total_files;
            run.processed_files = stats.processed_files;
            run.document_categories = stats.document_categories.clone();
            run.processing_time = stats.processing_time;
            run.movements = records;
            let run_id = run.run_id.clone();

            match HistoryStore::for_folder(&source).append(run) {
                Ok(()) => Some(run_id),
                Err(e) => {
                    tracing::error!(error = %e, "Could not save run history");
                    self.events.emit(OrganizerEvent::Error {
                        message: format!("Geçmiş kaydedilemedi: {}", e),
                    });
                    None
                }
            }
        };

        if !report.is_clean() {
            let err = OrganizeError::Worker(report.failures.join("; "));
            return Err(self.abort(err, stats));
        }

        let success = !stats.cancelled;
        tracing::info!(
            processed = stats.processed_files,
            skipped = stats.skipped_files,
            errors = stats.error_count(),
            cancelled = stats.cancelled,
            duration_secs = stats.processing_time,
            "Organize run finished"
        );
        if stats.cancelled {
            self.events.status("İşlem iptal edildi");
        } else {
            self.events.progress(100);
        }
        self.events.emit(OrganizerEvent::Finished {
            success,
            stats: stats.clone(),
        });

        Ok(RunReport {
            success,
            stats,
            run_id,
            plan: Some(plan),
            backup,
            pruned_dirs,
        })
    }

    /// Send the error and the terminal event, then hand the error back
    fn abort(&self, err: OrganizeError, stats: RunStats) -> OrganizeError {
        tracing::error!(error = %err, "Organize run failed");
        self.events.emit(OrganizerEvent::Error {
            message: err.to_string(),
        });
        self.events.emit(OrganizerEvent::Finished {
            success: false,
            stats,
        });
        err
    }

    async fn sample_telemetry(&self) -> Option<SystemTelemetry> {
        let probe = self.capabilities.telemetry.clone()?;
        match tokio::task::spawn_blocking(move || probe.sample()).await {
            Ok(sample) => sample,
            Err(e) => {
                tracing::warn!(error = %e, "Telemetry probe panicked");
                None
            }
        }
    }

    /// Reverse the newest run recorded for `folder`
    pub fn undo(&self, folder: &Path) -> Result<UndoOutcome> {
        history::undo_last_run(folder)
    }

    /// What `undo` would do, without touching anything
    pub fn preflight_undo(&self, folder: &Path) -> Result<UndoPreflight> {
        history::preflight_undo(folder)
    }

    /// Whether `folder` has a run that can be undone
    pub fn has_history(&self, folder: &Path) -> bool {
        HistoryStore::for_folder(folder).has_history()
    }

    /// Runs recorded for `folder`, newest first
    pub fn history(&self, folder: &Path) -> Result<Vec<RunSummary>> {
        HistoryStore::for_folder(folder).summaries()
    }

    /// Extract and classify every document under `root` without moving anything.
    ///
    /// Documents without extractable text are left out.
    pub async fn analyze_documents(&self, root: &Path, recursive: bool) -> Result<Vec<DocumentAnalysis>> {
        validate_source(root)?;

        let scanner = FileScanner::new(self.config.ignore_set(), self.config.max_file_size)
            .with_recursive(recursive);
        let config = Arc::clone(&self.config);
        let capabilities = self.capabilities.clone();
        let events = self.events.clone();
        let root = root.to_path_buf();

        tokio::task::spawn_blocking(move || {
            let documents: Vec<_> = scanner
                .scan(&root)?
                .files
                .into_iter()
                .filter(|f| is_document_extension(&f.extension))
                .collect();

            events.status(format!("{} belge analiz edilecek", documents.len()));
            let stop_words: HashSet<String> = config.stop_words.iter().cloned().collect();
            let classifier = Classifier::new(
                Arc::clone(&config),
                &capabilities,
                ClassifierModes {
                    image_ai: false,
                    document_ai: true,
                },
            );

            let mut results = Vec::new();
            for (index, task) in documents.iter().enumerate() {
                let text = capabilities.extractor.extract_text(&task.path);
                if !text.is_empty() {
                    let analysis = classifier.analyze_content(&text);
                    let text_preview = if text.chars().count() > PREVIEW_CHARS {
                        format!("{}...", text.chars().take(PREVIEW_CHARS).collect::<String>())
                    } else {
                        text.clone()
                    };
                    results.push(DocumentAnalysis {
                        file_name: task.file_name(),
                        path: task.path.clone(),
                        category: analysis.category,
                        related_categories: analysis.related,
                        summary: analysis.summary,
                        metadata: keywords::document_metadata(&task.path, &text, &stop_words),
                        text_preview,
                    });
                }

                let done = index + 1;
                if done % 5 == 0 || done == documents.len() {
                    events.status(format!("Analiz: {}/{} belge", done, documents.len()));
                    events.progress((done * 100 / documents.len()) as u8);
                }
            }

            tracing::info!(
                root = %root.display(),
                documents = documents.len(),
                analyzed = results.len(),
                "Document analysis finished"
            );
            Ok(results)
        })
        .await
        .map_err(|e| OrganizeError::Worker(format!("Analysis task failed: {}", e)))?
    }

    /// Write analysis results as pretty JSON
    pub fn export_analysis(results: &[DocumentAnalysis], path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(results)
            .map_err(|e| OrganizeError::Worker(format!("Cannot serialize analysis: {}", e)))?;
        std::fs::write(path, json).map_err(|e| OrganizeError::io(path, e))?;
        tracing::info!(path = %path.display(), documents = results.len(), "Analysis exported");
        Ok(())
    }
}

fn validate_source(source: &Path) -> Result<()> {
    if !source.exists() {
        return Err(OrganizeError::NotFound(source.to_path_buf()));
    }
    if !source.is_dir() {
        return Err(OrganizeError::NotADirectory(source.to_path_buf()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::ImageCaptioner;
    use crate::config::HISTORY_FILE_NAME;
    use crate::execution::TelemetryProbe;
    use crate::extract::{DocumentParser, TextExtractor};
    use std::fs;
    use tempfile::TempDir;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn organizer() -> Organizer {
        Organizer::new(
            OrganizerConfig::default(),
            Capabilities::with_extractor(Arc::new(DocumentParser::new())),
        )
    }

    fn drain(rx: &mut UnboundedReceiver<OrganizerEvent>) -> Vec<OrganizerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn finance_folder() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        for i in 0..6 {
            fs::write(
                temp_dir.path().join(format!("invoice_{}.txt", i)),
                "Bu ay fatura ve ödeme işlemleri: fatura tutarı, ödeme tarihi.",
            )
            .unwrap();
        }
        for i in 0..4 {
            fs::write(temp_dir.path().join(format!("photo_{}.jpg", i)), "jpeg").unwrap();
        }
        temp_dir
    }

    fn finance_options(root: &Path) -> RunOptions {
        RunOptions {
            document_ai: true,
            threads: Some(4),
            ..RunOptions::new(root)
        }
    }

    #[tokio::test]
    async fn test_finance_documents_and_images() {
        let temp_dir = finance_folder();
        let report = organizer().run(finance_options(temp_dir.path())).await.unwrap();

        assert!(report.success);
        assert_eq!(report.stats.total_files, 10);
        assert_eq!(report.stats.processed_files, 10);
        assert_eq!(report.stats.category_distribution.get("Finans"), Some(&6));
        assert_eq!(report.stats.category_distribution.get("Görseller"), Some(&4));
        assert_eq!(report.stats.document_categories.get("Finans"), Some(&6));
        assert_eq!(report.stats.thread_count_used, 4);
        assert!(report.stats.errors.is_empty());

        assert!(temp_dir.path().join("Finans").join("invoice_0.txt").exists());
        assert!(temp_dir.path().join("Görseller").join("photo_3.jpg").exists());
        assert!(temp_dir.path().join(HISTORY_FILE_NAME).exists());
        assert!(report.run_id.is_some());
    }

    #[tokio::test]
    async fn test_undo_restores_run() {
        let temp_dir = finance_folder();
        let organizer = organizer();
        organizer.run(finance_options(temp_dir.path())).await.unwrap();

        assert!(organizer.has_history(temp_dir.path()));
        let preflight = organizer.preflight_undo(temp_dir.path()).unwrap();
        assert_eq!(preflight.restorable, 10);

        let outcome = organizer.undo(temp_dir.path()).unwrap();
        assert_eq!(outcome.restored, 10);
        assert!(outcome.failures.is_empty());
        assert!(temp_dir.path().join("invoice_0.txt").exists());
        assert!(temp_dir.path().join("photo_0.jpg").exists());
        assert!(!temp_dir.path().join(HISTORY_FILE_NAME).exists());
        assert!(organizer.history(temp_dir.path()).unwrap().is_empty());
        assert!(!organizer.has_history(temp_dir.path()));
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_finished_once() {
        let temp_dir = finance_folder();
        let (tx, mut rx) = unbounded_channel();
        let organizer = organizer().with_events(EventSink::new(tx));

        organizer.run(finance_options(temp_dir.path())).await.unwrap();
        let events = drain(&mut rx);

        let progress: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                OrganizerEvent::Progress { percent } => Some(*percent),
                _ => None,
            })
            .collect();
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(progress.last(), Some(&100));

        let finished = events
            .iter()
            .filter(|e| matches!(e, OrganizerEvent::Finished { .. }))
            .count();
        assert_eq!(finished, 1);
        assert!(matches!(events.last(), Some(OrganizerEvent::Finished { success: true, .. })));

        let analyzed = events
            .iter()
            .filter(|e| matches!(e, OrganizerEvent::DocumentAnalyzed { .. }))
            .count();
        assert_eq!(analyzed, 6);
    }

    #[tokio::test]
    async fn test_missing_source_fails_with_finished_event() {
        let temp_dir = TempDir::new().unwrap();
        let (tx, mut rx) = unbounded_channel();
        let organizer = organizer().with_events(EventSink::new(tx));

        let err = organizer
            .run(RunOptions::new(temp_dir.path().join("nope")))
            .await
            .unwrap_err();

        assert!(matches!(err, OrganizeError::NotFound(_)));
        let events = drain(&mut rx);
        assert!(matches!(events[0], OrganizerEvent::Error { .. }));
        assert!(matches!(events[1], OrganizerEvent::Finished { success: false, .. }));
    }

    #[tokio::test]
    async fn test_cancelled_run_moves_nothing() {
        let temp_dir = finance_folder();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let organizer = organizer().with_cancel_flag(cancel);

        let report = organizer.run(finance_options(temp_dir.path())).await.unwrap();

        assert!(!report.success);
        assert!(report.stats.cancelled);
        assert_eq!(report.stats.processed_files, 0);
        assert_eq!(report.stats.skipped_files, 0);
        assert!(report.run_id.is_none());
        assert!(temp_dir.path().join("invoice_0.txt").exists());
        assert!(!temp_dir.path().join(HISTORY_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn test_empty_folder_reports_nothing_to_do() {
        let temp_dir = TempDir::new().unwrap();
        let report = organizer().run(RunOptions::new(temp_dir.path())).await.unwrap();

        assert!(!report.success);
        assert_eq!(report.stats.total_files, 0);
        assert!(report.plan.is_none());
    }

    #[tokio::test]
    async fn test_delete_empty_prunes_subfolders() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("old");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("song.mp3"), "x").unwrap();

        let options = RunOptions {
            include_subfolders: true,
            delete_empty: true,
            threads: Some(1),
            ..RunOptions::new(temp_dir.path())
        };
        let report = organizer().run(options).await.unwrap();

        assert_eq!(report.stats.processed_files, 1);
        assert_eq!(report.pruned_dirs, 1);
        assert!(!nested.exists());
        assert!(temp_dir.path().join("Müzik").join("song.mp3").exists());
        assert_eq!(report.stats.created_folders, 1);
    }

    struct IdleHost;

    impl TelemetryProbe for IdleHost {
        fn sample(&self) -> Option<SystemTelemetry> {
            Some(SystemTelemetry {
                logical_cores: 16,
                physical_cores: 8,
                cpu_percent: 10.0,
                memory_percent: 10.0,
                total_memory_bytes: 16 * 1024 * 1024 * 1024,
            })
        }
    }

    #[tokio::test]
    async fn test_reduction_notice_and_system_info() {
        let temp_dir = finance_folder();
        let (tx, mut rx) = unbounded_channel();
        let capabilities = Capabilities::with_extractor(Arc::new(DocumentParser::new()))
            .telemetry_probe(Some(Arc::new(IdleHost)));
        let organizer = Organizer::new(OrganizerConfig::default(), capabilities)
            .with_events(EventSink::new(tx));

        let options = RunOptions {
            threads: Some(8),
            ..RunOptions::new(temp_dir.path())
        };
        let report = organizer.run(options).await.unwrap();
        let events = drain(&mut rx);

        // 10 files < 8 * 2 workers
        assert_eq!(report.plan.as_ref().map(|p| p.workers), Some(5));
        assert!(events.iter().any(|e| matches!(
            e,
            OrganizerEvent::SystemInfo { message } if message.contains("İstenen thread: 8")
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            OrganizerEvent::Status { message } if message.starts_with("Sistem optimizasyonu: 8 thread → 5 thread")
        )));
    }

    #[tokio::test]
    async fn test_analyze_documents_leaves_files_in_place() {
        let temp_dir = finance_folder();
        fs::write(temp_dir.path().join("empty.txt"), "").unwrap();
        let organizer = organizer();

        let results = organizer.analyze_documents(temp_dir.path(), false).await.unwrap();

        assert_eq!(results.len(), 6);
        assert!(results.iter().all(|r| r.category == "Finans"));
        assert!(temp_dir.path().join("invoice_0.txt").exists());

        let export = temp_dir.path().join("analysis.json");
        Organizer::export_analysis(&results, &export).unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&export).unwrap()).unwrap();
        assert_eq!(parsed.as_array().map(|a| a.len()), Some(6));
        assert!(parsed[0]["textPreview"].is_string());
    }

    struct InvoiceText;

    impl TextExtractor for InvoiceText {
        fn extract_text(&self, _path: &Path) -> String {
            "Ekim ayı fatura özeti. Fatura tutarı için ödeme talimatı verildi, ödeme onaylandı."
                .to_string()
        }
    }

    #[tokio::test]
    async fn test_pdf_invoices_are_read_through_the_extractor() {
        let temp_dir = TempDir::new().unwrap();
        for i in 0..6 {
            fs::write(temp_dir.path().join(format!("invoice_{}.pdf", i)), "%PDF").unwrap();
        }
        for i in 0..4 {
            fs::write(temp_dir.path().join(format!("photo_{}.jpg", i)), "jpeg").unwrap();
        }
        let organizer = Organizer::new(
            OrganizerConfig::default(),
            Capabilities::with_extractor(Arc::new(InvoiceText)),
        );

        let report = organizer.run(finance_options(temp_dir.path())).await.unwrap();

        assert_eq!(report.stats.processed_files, 10);
        assert_eq!(report.stats.category_distribution.get("Finans"), Some(&6));
        assert_eq!(report.stats.category_distribution.get("Görseller"), Some(&4));
        assert_eq!(report.stats.document_categories.get("Finans"), Some(&6));
        assert!(temp_dir.path().join("Finans").join("invoice_5.pdf").exists());
        assert!(temp_dir.path().join("Görseller").join("photo_0.jpg").exists());
    }

    /// Panics on `a.jpg`, sees a tree everywhere else
    struct FragileCaptioner;

    impl ImageCaptioner for FragileCaptioner {
        fn caption(&self, path: &Path) -> std::result::Result<String, String> {
            if path.ends_with("a.jpg") {
                panic!("vision model crashed");
            }
            Ok("a tall tree".to_string())
        }
    }

    #[tokio::test]
    async fn test_panicking_captioner_fails_only_that_file() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["a.jpg", "b.jpg", "c.mp3"] {
            fs::write(temp_dir.path().join(name), "x").unwrap();
        }
        let capabilities = Capabilities::with_extractor(Arc::new(DocumentParser::new()))
            .image_captioner(Arc::new(FragileCaptioner));
        let organizer = Organizer::new(OrganizerConfig::default(), capabilities);

        let options = RunOptions {
            image_ai: true,
            threads: Some(1),
            ..RunOptions::new(temp_dir.path())
        };
        let report = organizer.run(options).await.unwrap();

        assert!(report.success);
        assert_eq!(report.stats.processed_files, 2);
        assert_eq!(report.stats.skipped_files, 1);
        assert_eq!(report.stats.errors.len(), 1);
        assert!(report.stats.errors[0].starts_with("a.jpg: panicked: vision model crashed"));
        assert!(temp_dir.path().join("a.jpg").exists());
        assert!(temp_dir.path().join("Görseller").join("Tree").join("b.jpg").exists());
        assert!(temp_dir.path().join("Müzik").join("c.mp3").exists());
    }

    #[tokio::test]
    async fn test_cancel_only_affects_one_run() {
        let temp_dir = finance_folder();
        let cancel = CancelFlag::new();
        let organizer = organizer().with_cancel_flag(cancel.clone());

        cancel.cancel();
        let first = organizer.run(finance_options(temp_dir.path())).await.unwrap();
        assert!(first.stats.cancelled);
        assert!(!cancel.is_cancelled());

        let second = organizer.run(finance_options(temp_dir.path())).await.unwrap();
        assert!(second.success);
        assert!(!second.stats.cancelled);
        assert_eq!(second.stats.processed_files, 10);
    }
}
