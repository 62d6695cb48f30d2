//! Category decisions for single files.
//!
//! Three strategies, picked per file:
//! - document content analysis (keywords plus an optional semantic scorer)
//! - extension table lookup, optionally refined by an image caption
//! - fixed fallbacks when nothing matches
//!
//! Nothing in here fails: extraction, scoring and captioning problems are
//! logged and degrade to a fallback category.

pub mod keywords;
pub mod vision;

pub use keywords::DocumentMetadata;

use crate::capabilities::{Capabilities, ImageCaptioner, SemanticScorer};
use crate::config::OrganizerConfig;
use crate::extract::{is_document_extension, TextExtractor};
use crate::models::FileTask;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Document with content but no matching category
pub const OTHER_DOCUMENTS: &str = "Diğer_Belgeler";
/// Document analyzed in content mode whose type is not in the extension table
pub const DOCUMENTS_FALLBACK: &str = "Belgeler";
/// Extension not in the table
pub const UNMATCHED: &str = "Diğerleri";
/// Captioned image whose extension is not in the table
pub const AI_CLASSIFIED: &str = "AI_Sınıflandırma";
pub const INSUFFICIENT_CONTENT: &str = "İçerik yetersiz";

/// Characters of text handed to the semantic scorer
const SEMANTIC_SAMPLE_CHARS: usize = 500;

/// Which optional analyses a run asked for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifierModes {
    pub image_ai: bool,
    pub document_ai: bool,
}

/// How a classification was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ClassificationSource {
    Extension,
    Document,
    Image,
}

/// Outcome of analyzing a document's text
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentAnalysis {
    pub category: String,
    /// Runner-up categories, at most two
    pub related: Vec<String>,
    pub summary: String,
}

/// Content analysis plus file metadata, reported for every analyzed document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReport {
    #[serde(flatten)]
    pub analysis: ContentAnalysis,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub category: String,
    pub subcategory: Option<String>,
    /// Detected objects, at most `max_objects`
    pub signals: Vec<String>,
    pub source: ClassificationSource,
    pub report: Option<DocumentReport>,
}

impl Classification {
    fn plain(category: impl Into<String>, source: ClassificationSource) -> Self {
        Self {
            category: category.into(),
            subcategory: None,
            signals: Vec::new(),
            source,
            report: None,
        }
    }

    /// `category` or `category/subcategory`
    pub fn category_path(&self) -> String {
        match &self.subcategory {
            Some(sub) => format!("{}/{}", self.category, sub),
            None => self.category.clone(),
        }
    }

    /// Destination directory under the organized root
    pub fn target_dir(&self, root: &Path) -> PathBuf {
        let dir = root.join(&self.category);
        match &self.subcategory {
            Some(sub) => dir.join(sub),
            None => dir,
        }
    }
}

pub struct Classifier {
    config: Arc<OrganizerConfig>,
    extractor: Arc<dyn TextExtractor>,
    semantic: Option<Arc<dyn SemanticScorer>>,
    captioner: Option<Arc<dyn ImageCaptioner>>,
    stop_words: HashSet<String>,
    labels: Vec<String>,
    modes: ClassifierModes,
}

impl Classifier {
    pub fn new(config: Arc<OrganizerConfig>, capabilities: &Capabilities, modes: ClassifierModes) -> Self {
        let stop_words = config.stop_words.iter().cloned().collect();
        let labels = config
            .document_categories
            .iter()
            .map(|c| c.name.clone())
            .collect();

        tracing::debug!(
            image_ai = modes.image_ai,
            document_ai = modes.document_ai,
            semantic = capabilities.semantic.is_some(),
            captioner = capabilities.captioner.is_some(),
            "Classifier ready"
        );

        Self {
            config,
            extractor: capabilities.extractor.clone(),
            semantic: capabilities.semantic.clone(),
            captioner: capabilities.captioner.clone(),
            stop_words,
            labels,
            modes,
        }
    }

    /// Decide where `task` belongs. Same inputs and collaborators, same answer.
    pub fn classify(&self, task: &FileTask) -> Classification {
        if self.modes.document_ai && is_document_extension(&task.extension) {
            self.classify_document(&task.path, &task.extension)
        } else {
            self.classify_by_extension(&task.path, &task.extension)
        }
    }

    /// Content mode: the extension category is only used when no text comes out
    pub fn classify_document(&self, path: &Path, extension: &str) -> Classification {
        let baseline = self
            .config
            .category_for_extension(extension)
            .unwrap_or(DOCUMENTS_FALLBACK);

        let text = self.extractor.extract_text(path);
        if text.is_empty() {
            tracing::info!(file = %path.display(), "No text extracted, using extension category");
            return Classification::plain(baseline, ClassificationSource::Document);
        }

        tracing::debug!(
            file = %path.display(),
            chars = text.chars().count(),
            "Analyzing document"
        );

        let analysis = self.analyze_content(&text);
        let metadata = keywords::document_metadata(path, &text, &self.stop_words);
        let subcategory = if analysis.related.is_empty() {
            None
        } else {
            Some(analysis.related.join("_"))
        };

        Classification {
            category: analysis.category.clone(),
            subcategory,
            signals: Vec::new(),
            source: ClassificationSource::Document,
            report: Some(DocumentReport { analysis, metadata }),
        }
    }

    /// Keyword and semantic evidence merged into one category decision
    pub fn analyze_content(&self, text: &str) -> ContentAnalysis {
        let thresholds = &self.config.thresholds;

        if text.trim().chars().count() < thresholds.min_content_chars {
            return ContentAnalysis {
                category: OTHER_DOCUMENTS.to_string(),
                related: Vec::new(),
                summary: INSUFFICIENT_CONTENT.to_string(),
            };
        }

        let mut hits = keywords::keyword_hits(
            text,
            &self.config.document_categories,
            &self.stop_words,
            thresholds.keyword_min_score,
        );

        if let Some(scorer) = &self.semantic {
            if text.chars().count() > thresholds.semantic_min_text_chars {
                let sample: String = text.chars().take(SEMANTIC_SAMPLE_CHARS).collect();
                match scorer.score_labels(&sample, &self.labels) {
                    Ok(scores) => hits.extend(
                        scores
                            .into_iter()
                            .filter(|(_, confidence)| *confidence > thresholds.semantic_min_confidence)
                            .map(|(label, _)| label),
                    ),
                    Err(e) => tracing::warn!(error = %e, "Semantic scoring failed, using keywords only"),
                }
            }
        }

        let (category, related) = keywords::merge_hits(&hits)
            .unwrap_or_else(|| (OTHER_DOCUMENTS.to_string(), Vec::new()));

        ContentAnalysis {
            category,
            related,
            summary: keywords::summarize(text),
        }
    }

    fn classify_by_extension(&self, path: &Path, extension: &str) -> Classification {
        let captioner = self
            .captioner
            .as_ref()
            .filter(|_| self.modes.image_ai && vision::is_captionable(extension));

        match (self.config.category_for_extension(extension), captioner) {
            (Some(category), Some(captioner)) => {
                self.captioned(category, path, captioner.as_ref())
            }
            (Some(category), None) => Classification::plain(category, ClassificationSource::Extension),
            (None, Some(captioner)) => self.captioned(AI_CLASSIFIED, path, captioner.as_ref()),
            (None, None) => Classification::plain(UNMATCHED, ClassificationSource::Extension),
        }
    }

    fn captioned(&self, category: &str, path: &Path, captioner: &dyn ImageCaptioner) -> Classification {
        let (subcategory, signals) = match captioner.caption(path) {
            Ok(caption) => {
                let caption = caption.to_lowercase();
                let objects = vision::detect_objects(
                    &caption,
                    self.config.object_threshold_ratio(),
                    self.config.max_objects,
                );
                (vision::ai_category(&objects, &caption), objects)
            }
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "Image captioning failed");
                (vision::UNKNOWN_CATEGORY.to_string(), Vec::new())
            }
        };

        Classification {
            category: category.to_string(),
            subcategory: Some(subcategory),
            signals,
            source: ClassificationSource::Image,
            report: None,
        }
    }
}
