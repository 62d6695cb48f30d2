//! # tidyfolder CLI
//!
//! - `tidyfolder organize <DIR>` - sort a folder into category subfolders
//! - `tidyfolder undo <DIR>` - reverse the last run in a folder
//! - `tidyfolder history <DIR>` - list recorded runs
//! - `tidyfolder analyze <DIR>` - classify documents by content without moving them
//! - `tidyfolder capabilities` - show which optional analyses are available

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tidyfolder::{
    Capabilities, EventSink, Organizer, OrganizerConfig, OrganizerEvent, RunOptions,
};
use tokio::sync::mpsc::unbounded_channel;

#[derive(Parser)]
#[command(name = "tidyfolder")]
#[command(about = "Sort a folder into category subfolders, with undo")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ~/.config/tidyfolder/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Organize a folder
    Organize {
        /// Folder to organize
        dir: PathBuf,

        /// Classify documents by their content
        #[arg(long)]
        content: bool,

        /// Caption images into object subfolders (needs a captioning model)
        #[arg(long)]
        ai: bool,

        /// Include files in subfolders
        #[arg(short, long)]
        recursive: bool,

        /// Requested worker count
        #[arg(short, long)]
        threads: Option<usize>,

        /// Remove folders left empty afterwards
        #[arg(long)]
        prune_empty: bool,

        /// Copy top-level files into a backup folder first
        #[arg(long)]
        backup: bool,

        /// Print the final report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Undo the most recent run in a folder
    Undo {
        dir: PathBuf,
    },

    /// List the runs recorded for a folder
    History {
        dir: PathBuf,
    },

    /// Analyze documents without moving them
    Analyze {
        dir: PathBuf,

        #[arg(short, long)]
        recursive: bool,

        /// Write the results to a JSON file
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// Show available optional capabilities
    Capabilities,
}

fn load_config(path: Option<&Path>) -> Result<OrganizerConfig> {
    let path = path.map(Path::to_path_buf).or_else(OrganizerConfig::default_path);
    OrganizerConfig::load_or_default(path.as_deref()).context("Failed to load config")
}

/// Print events as they arrive; progress is rendered on a single line
fn spawn_printer(quiet: bool) -> (EventSink, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = unbounded_channel();
    let handle = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if quiet {
                continue;
            }
            match event {
                OrganizerEvent::Progress { percent } => eprint!("\r{:>3}%", percent),
                OrganizerEvent::Status { message } | OrganizerEvent::SystemInfo { message } => {
                    eprintln!("\r{}", message)
                }
                OrganizerEvent::SignalsDetected {
                    file_name, signals, ..
                } => eprintln!("\r{}: {}", file_name, signals.join(", ")),
                OrganizerEvent::DocumentAnalyzed {
                    file_name,
                    category,
                    summary,
                    ..
                } => eprintln!("\r{} → {} ({})", file_name, category, summary),
                OrganizerEvent::Error { message } => eprintln!("\rHata: {}", message),
                OrganizerEvent::FileProcessed { .. } | OrganizerEvent::Finished { .. } => {}
            }
        }
        if !quiet {
            eprintln!();
        }
    });
    (EventSink::new(tx), handle)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    tidyfolder::init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Organize {
            dir,
            content,
            ai,
            recursive,
            threads,
            prune_empty,
            backup,
            json,
        } => {
            let (events, printer) = spawn_printer(json);
            let organizer = Organizer::new(config, Capabilities::default()).with_events(events);

            let cancel = organizer.cancel_flag();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            });

            let options = RunOptions {
                image_ai: ai,
                document_ai: content,
                include_subfolders: recursive,
                delete_empty: prune_empty,
                backup,
                threads,
                ..RunOptions::new(&dir)
            };
            let result = organizer.run(options).await;
            drop(organizer);
            let _ = printer.await;

            let report = result.with_context(|| format!("Failed to organize {}", dir.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let stats = &report.stats;
                println!("İşlenen dosya:   {}/{}", stats.processed_files, stats.total_files);
                println!("Atlanan dosya:   {}", stats.skipped_files);
                println!("Toplam boyut:    {}", stats.formatted_size);
                println!("Klasör sayısı:   {}", stats.created_folders);
                println!("Süre:            {:.2} sn", stats.processing_time);
                println!("Thread:          {}", stats.thread_count_used);
                for (category, count) in &stats.category_distribution {
                    println!("  {:<30} {}", category, count);
                }
                for error in &stats.errors {
                    println!("  ! {}", error);
                }
                if stats.cancelled {
                    println!("İşlem iptal edildi.");
                }
            }
        }

        Commands::Undo { dir } => {
            let organizer = Organizer::new(config, Capabilities::default());
            if !organizer.has_history(&dir) {
                println!("Geri alınacak işlem yok: {}", dir.display());
                return Ok(());
            }
            let preflight = organizer
                .preflight_undo(&dir)
                .with_context(|| format!("Cannot undo in {}", dir.display()))?;
            if !preflight.is_clean() {
                println!(
                    "{} kayıttan {} geri alınamayacak ({} eksik, {} dolu hedef)",
                    preflight.total_moves,
                    preflight.missing.len() + preflight.blocked.len(),
                    preflight.missing.len(),
                    preflight.blocked.len()
                );
            }

            let outcome = organizer.undo(&dir)?;
            println!("{} dosya geri alındı.", outcome.restored);
            for failure in &outcome.failures {
                println!("  ! {}", failure);
            }
            println!("Kalan geçmiş: {}", outcome.remaining_runs);
        }

        Commands::History { dir } => {
            let organizer = Organizer::new(config, Capabilities::default());
            if !organizer.has_history(&dir) {
                println!("Geçmiş yok: {}", dir.display());
                return Ok(());
            }
            let runs = organizer.history(&dir)?;
            for run in runs {
                println!(
                    "{}  {}  {} dosya  (AI: {}, belge: {})",
                    run.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    run.run_id,
                    run.move_count,
                    run.ai_mode,
                    run.document_ai_mode
                );
            }
        }

        Commands::Analyze {
            dir,
            recursive,
            export,
        } => {
            let (events, printer) = spawn_printer(false);
            let organizer = Organizer::new(config, Capabilities::default()).with_events(events);
            let result = organizer.analyze_documents(&dir, recursive).await;
            drop(organizer);
            let _ = printer.await;

            let results = result.with_context(|| format!("Failed to analyze {}", dir.display()))?;
            for analysis in &results {
                println!("{} → {}", analysis.file_name, analysis.category);
                if !analysis.related_categories.is_empty() {
                    println!("  İlgili: {}", analysis.related_categories.join(", "));
                }
                println!("  {}", analysis.summary);
            }
            if let Some(path) = export {
                Organizer::export_analysis(&results, &path)?;
                println!("Sonuçlar kaydedildi: {}", path.display());
            }
        }

        Commands::Capabilities => {
            let organizer = Organizer::new(config, Capabilities::default());
            println!("{}", serde_json::to_string_pretty(&organizer.capabilities())?);
        }
    }

    Ok(())
}
