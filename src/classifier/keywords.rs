//! Keyword-based content analysis of extracted document text.

use crate::config::KeywordCategory;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("Invalid regex"));
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").expect("Invalid regex"));
static LONG_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w{4,}\b").expect("Invalid regex"));

const SUMMARY_MAX_CHARS: usize = 150;
const SUMMARY_MAX_SENTENCES: usize = 3;
const SENTENCE_MIN_CHARS: usize = 10;
const TOP_KEYWORDS: usize = 5;

/// Descriptive facts about an analyzed document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub file_name: String,
    pub path: String,
    pub size: u64,
    /// RFC 3339 modification time, when the filesystem reports one
    pub modified: Option<String>,
    pub char_count: usize,
    pub word_count: usize,
    pub line_count: usize,
    pub keywords: Vec<String>,
}

/// Lower-case, strip punctuation, drop stop-words and tokens of two chars or less
pub fn tokenize(text: &str, stop_words: &HashSet<String>) -> Vec<String> {
    let lowered = text.to_lowercase();
    PUNCTUATION
        .replace_all(&lowered, " ")
        .split_whitespace()
        .filter(|w| w.chars().count() > 2 && !stop_words.contains(*w))
        .map(|w| w.to_string())
        .collect()
}

/// Categories whose keywords occur at least `min_score` times, in table order
pub fn keyword_hits(
    text: &str,
    categories: &[KeywordCategory],
    stop_words: &HashSet<String>,
    min_score: usize,
) -> Vec<String> {
    let mut frequencies: HashMap<String, usize> = HashMap::new();
    for word in tokenize(text, stop_words) {
        *frequencies.entry(word).or_insert(0) += 1;
    }

    categories
        .iter()
        .filter(|category| {
            let score: usize = category
                .keywords
                .iter()
                .map(|k| frequencies.get(k.as_str()).copied().unwrap_or(0))
                .sum();
            score >= min_score
        })
        .map(|category| category.name.clone())
        .collect()
}

/// Count hits and order them by count, ties by first appearance.
pub fn rank_hits(hits: &[String]) -> Vec<(String, usize)> {
    let mut ranked: Vec<(String, usize)> = Vec::new();
    for hit in hits {
        match ranked.iter_mut().find(|(name, _)| name == hit) {
            Some((_, count)) => *count += 1,
            None => ranked.push((hit.clone(), 1)),
        }
    }
    // sort_by is stable, so equal counts keep first-seen order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// Winning category plus up to two runner-ups, or `None` without any hit
pub fn merge_hits(hits: &[String]) -> Option<(String, Vec<String>)> {
    let mut ranked = rank_hits(hits).into_iter().map(|(name, _)| name);
    let main = ranked.next()?;
    Some((main, ranked.take(2).collect()))
}

/// Short summary built from the first sentences of `text`
pub fn summarize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let sentences: Vec<&str> = SENTENCE_END
        .split(text)
        .map(|s| s.trim())
        .filter(|s| s.chars().count() > SENTENCE_MIN_CHARS)
        .collect();

    if sentences.is_empty() {
        return truncate_with_ellipsis(text, SUMMARY_MAX_CHARS);
    }

    let mut summary = String::new();
    for sentence in sentences.iter().take(SUMMARY_MAX_SENTENCES) {
        // An over-long first sentence is kept and cut below
        if summary.is_empty()
            || summary.chars().count() + sentence.chars().count() < SUMMARY_MAX_CHARS
        {
            summary.push_str(sentence);
            summary.push_str(". ");
        } else {
            break;
        }
    }

    truncate_with_ellipsis(summary.trim(), SUMMARY_MAX_CHARS)
}

fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let mut cut: String = text.chars().take(max_chars).collect();
        cut.push_str("...");
        cut
    } else {
        text.to_string()
    }
}

/// Most frequent words of four or more characters, ties by first occurrence
pub fn top_keywords(text: &str, stop_words: &HashSet<String>, limit: usize) -> Vec<String> {
    let lowered = text.to_lowercase();
    let words: Vec<String> = LONG_WORD
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .filter(|w| !stop_words.contains(w))
        .collect();

    rank_hits(&words)
        .into_iter()
        .take(limit)
        .map(|(word, _)| word)
        .collect()
}

pub fn document_metadata(path: &Path, text: &str, stop_words: &HashSet<String>) -> DocumentMetadata {
    let fs_meta = std::fs::metadata(path).ok();
    let modified = fs_meta
        .as_ref()
        .and_then(|m| m.modified().ok())
        .map(|t| chrono::DateTime::<chrono::Local>::from(t).to_rfc3339());

    DocumentMetadata {
        file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        path: path.to_string_lossy().to_string(),
        size: fs_meta.map(|m| m.len()).unwrap_or(0),
        modified,
        char_count: text.chars().count(),
        word_count: text.split_whitespace().count(),
        line_count: text.matches('\n').count() + 1,
        keywords: top_keywords(text, stop_words, TOP_KEYWORDS),
    }
}
