//! Optional collaborators the organizer can use when they are available.
//!
//! The registry is built once and queried when a `Classifier` or a run is
//! constructed. Missing capabilities simply switch the corresponding
//! feature off.

use crate::execution::telemetry::{SysinfoProbe, TelemetryProbe};
use crate::extract::{DocumentParser, TextExtractor};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Zero-shot text classifier: confidence per candidate label
pub trait SemanticScorer: Send + Sync {
    fn score_labels(&self, text: &str, labels: &[String]) -> Result<Vec<(String, f32)>, String>;
}

/// Produces a short natural-language caption for an image
pub trait ImageCaptioner: Send + Sync {
    fn caption(&self, path: &Path) -> Result<String, String>;
}

/// Which optional capabilities are present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityReport {
    pub text_extraction: bool,
    pub semantic_scoring: bool,
    pub image_captioning: bool,
    pub system_telemetry: bool,
}

#[derive(Clone)]
pub struct Capabilities {
    pub extractor: Arc<dyn TextExtractor>,
    pub semantic: Option<Arc<dyn SemanticScorer>>,
    pub captioner: Option<Arc<dyn ImageCaptioner>>,
    pub telemetry: Option<Arc<dyn TelemetryProbe>>,
}

impl Default for Capabilities {
    /// Bundled document parser and sysinfo telemetry, no models
    fn default() -> Self {
        Self {
            extractor: Arc::new(DocumentParser::new()),
            semantic: None,
            captioner: None,
            telemetry: Some(Arc::new(SysinfoProbe)),
        }
    }
}

impl Capabilities {
    /// Only a text extractor; no models and no telemetry
    pub fn with_extractor(extractor: Arc<dyn TextExtractor>) -> Self {
        Self {
            extractor,
            semantic: None,
            captioner: None,
            telemetry: None,
        }
    }

    pub fn semantic_scorer(mut self, scorer: Arc<dyn SemanticScorer>) -> Self {
        self.semantic = Some(scorer);
        self
    }

    pub fn image_captioner(mut self, captioner: Arc<dyn ImageCaptioner>) -> Self {
        self.captioner = Some(captioner);
        self
    }

    pub fn telemetry_probe(mut self, probe: Option<Arc<dyn TelemetryProbe>>) -> Self {
        self.telemetry = probe;
        self
    }

    pub fn describe(&self) -> CapabilityReport {
        CapabilityReport {
            text_extraction: true,
            semantic_scoring: self.semantic.is_some(),
            image_captioning: self.captioner.is_some(),
            system_telemetry: self.telemetry.is_some(),
        }
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities")
            .field("report", &self.describe())
            .finish()
    }
}
