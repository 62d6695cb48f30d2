//! Text extraction.
//!
//! Classification only ever sees a `TextExtractor`, so tests and alternative
//! backends can replace the bundled `DocumentParser`.

mod document_parser;

pub use document_parser::DocumentParser;

use std::path::Path;

/// Extensions whose text content can be analyzed
pub const DOCUMENT_EXTENSIONS: &[&str] = &[".pdf", ".docx", ".pptx", ".xlsx", ".xls", ".txt", ".md"];

/// Upper bound on extracted text, in bytes
pub const MAX_TEXT_LENGTH: usize = 500_000;

/// Pulls plain text out of a file.
///
/// Implementations never fail: unsupported formats and read errors yield an
/// empty string, partially readable files yield partial text.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, path: &Path) -> String;
}

pub fn is_document_extension(ext: &str) -> bool {
    DOCUMENT_EXTENSIONS.contains(&ext)
}

/// Trim every line and drop blank ones
pub(crate) fn clean_text(text: &str) -> String {
    text.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cut `text` to at most `MAX_TEXT_LENGTH` bytes, preferring a paragraph,
/// sentence or word break and never splitting a character.
pub(crate) fn truncate_text(text: &str) -> String {
    if text.len() <= MAX_TEXT_LENGTH {
        return text.to_string();
    }

    let mut end = MAX_TEXT_LENGTH;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let truncated = &text[..end];

    if let Some(pos) = truncated.rfind("\n\n") {
        return truncated[..pos].to_string();
    }
    if let Some(pos) = truncated.rfind(". ") {
        return truncated[..=pos].to_string();
    }
    if let Some(pos) = truncated.rfind(' ') {
        return truncated[..pos].to_string();
    }

    truncated.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        let messy = "  Line 1  \n\n  Line 2  \n  \n  Line 3  ";
        assert_eq!(clean_text(messy), "Line 1\nLine 2\nLine 3");
    }

    #[test]
    fn test_truncate_text_respects_limit() {
        let long_text = "a ".repeat(300_000);
        let truncated = truncate_text(&long_text);
        assert!(truncated.len() <= MAX_TEXT_LENGTH);
    }

    #[test]
    fn test_truncate_text_multibyte_boundary() {
        // 'ş' is two bytes, so the limit falls inside a character
        let long_text = format!("a{}", "ş".repeat(MAX_TEXT_LENGTH));
        let truncated = truncate_text(&long_text);
        assert!(truncated.len() <= MAX_TEXT_LENGTH);
        assert!(truncated.ends_with('ş'));
    }

    #[test]
    fn test_document_extensions() {
        assert!(is_document_extension(".pdf"));
        assert!(is_document_extension(".md"));
        assert!(!is_document_extension(".jpg"));
        assert!(!is_document_extension("pdf"));
    }
}
