//! tidyfolder: sorts a folder into category subfolders.
//!
//! Files are classified by extension, by the content of documents, or by an
//! image caption when a captioning model is plugged in, then moved by a pool of
//! workers sized from the current system load. Every run is recorded next to
//! the organized files and can be undone.

pub mod capabilities;
pub mod classifier;
pub mod config;
pub mod error;
pub mod execution;
pub mod extract;
pub mod history;
pub mod models;
pub mod organizer;
pub mod services;

pub use capabilities::{Capabilities, CapabilityReport, ImageCaptioner, SemanticScorer};
pub use config::OrganizerConfig;
pub use error::{OrganizeError, Result};
pub use execution::{SystemTelemetry, TelemetryProbe};
pub use extract::TextExtractor;
pub use models::{EventSink, OrganizerEvent, RunStats};
pub use organizer::{CancelFlag, DocumentAnalysis, Organizer, RunOptions, RunReport};

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set. Otherwise only warnings from dependencies and
/// info from this crate are shown, or everything at debug level when `verbose`.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        "debug"
    } else {
        "warn,tidyfolder=info"
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_target(false)
        .try_init();
}
