//! Pure Rust text extraction for office documents, PDFs and plain text.
//!
//! - PDF: pdf-extract (guarded against panics on malformed fonts)
//! - Word: .docx via docx-rs
//! - PowerPoint: .pptx via the slide XML inside the zip container
//! - Excel: .xlsx, .xls via calamine
//! - Text: .txt, .md (UTF-8, lossy on invalid bytes)

use super::{clean_text, truncate_text, TextExtractor};
use calamine::{open_workbook, Reader, Xls, Xlsx};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{Read, Seek};
use std::path::Path;

static SLIDE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").expect("valid slide regex"));

static TEXT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<a:t(?:\s[^>]*)?>([^<]*)</a:t>").expect("valid text run regex"));

/// Document parser using pure Rust crates
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentParser;

impl DocumentParser {
    pub fn new() -> Self {
        Self
    }

    /// Extract cleaned, length-capped text, or the reason it failed
    pub fn parse(&self, path: &Path) -> Result<String, String> {
        if !path.exists() {
            return Err(format!("File not found: {}", path.display()));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase());

        let raw = match ext.as_deref() {
            Some("txt") | Some("md") => Self::read_plain_text(path)?,
            Some("pdf") => Self::extract_pdf(path)?,
            Some("docx") => Self::extract_docx(path)?,
            Some("pptx") => Self::extract_pptx(path)?,
            Some("xlsx") => {
                let mut workbook: Xlsx<_> =
                    open_workbook(path).map_err(|e| format!("Failed to open XLSX: {}", e))?;
                Self::workbook_text(&mut workbook)
            }
            Some("xls") => {
                let mut workbook: Xls<_> =
                    open_workbook(path).map_err(|e| format!("Failed to open XLS: {}", e))?;
                Self::workbook_text(&mut workbook)
            }
            _ => return Err(format!("Unsupported file type for text extraction: {:?}", ext)),
        };

        let text = truncate_text(&clean_text(&raw));

        tracing::debug!(
            file = %path.display(),
            chars = text.chars().count(),
            words = text.split_whitespace().count(),
            "Extracted document text"
        );

        Ok(text)
    }

    fn read_plain_text(path: &Path) -> Result<String, String> {
        let bytes = std::fs::read(path).map_err(|e| format!("Failed to read text file: {}", e))?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }

    /// pdf-extract (and its cff-parser dependency) can panic on certain
    /// fonts/glyphs, so extraction runs under `catch_unwind`.
    fn extract_pdf(path: &Path) -> Result<String, String> {
        let bytes = std::fs::read(path).map_err(|e| format!("Failed to read PDF file: {}", e))?;

        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(&bytes)
        })) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(format!("PDF extraction failed: {}", e)),
            Err(_panic) => {
                tracing::error!(
                    file = %path.display(),
                    "PDF extraction panicked, likely malformed font/glyph"
                );
                Err("PDF extraction panicked".to_string())
            }
        }
    }

    fn extract_docx(path: &Path) -> Result<String, String> {
        let bytes = std::fs::read(path).map_err(|e| format!("Failed to read DOCX file: {}", e))?;
        let doc =
            docx_rs::read_docx(&bytes).map_err(|e| format!("Failed to parse DOCX: {}", e))?;

        let mut output = String::new();
        for child in &doc.document.children {
            Self::docx_child_text(child, &mut output);
        }
        Ok(output)
    }

    fn docx_paragraph_text(para: &docx_rs::Paragraph, output: &mut String) {
        for child in &para.children {
            match child {
                docx_rs::ParagraphChild::Run(run) => Self::docx_run_text(run, output),
                docx_rs::ParagraphChild::Hyperlink(link) => {
                    for link_child in &link.children {
                        if let docx_rs::ParagraphChild::Run(run) = link_child {
                            Self::docx_run_text(run, output);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn docx_run_text(run: &docx_rs::Run, output: &mut String) {
        for run_child in &run.children {
            if let docx_rs::RunChild::Text(text) = run_child {
                output.push_str(&text.text);
            }
        }
    }

    /// Paragraphs become lines, table rows become ` | `-joined cell lines
    fn docx_child_text(element: &docx_rs::DocumentChild, output: &mut String) {
        match element {
            docx_rs::DocumentChild::Paragraph(para) => {
                Self::docx_paragraph_text(para, output);
                output.push('\n');
            }
            docx_rs::DocumentChild::Table(table) => {
                for row in &table.rows {
                    let docx_rs::TableChild::TableRow(tr) = row;
                    let mut cells = Vec::new();
                    for cell in &tr.cells {
                        let docx_rs::TableRowChild::TableCell(tc) = cell;
                        let mut cell_text = String::new();
                        for content in &tc.children {
                            if let docx_rs::TableCellContent::Paragraph(para) = content {
                                Self::docx_paragraph_text(para, &mut cell_text);
                            }
                        }
                        let cell_text = cell_text.trim();
                        if !cell_text.is_empty() {
                            cells.push(cell_text.to_string());
                        }
                    }
                    if !cells.is_empty() {
                        output.push_str(&cells.join(" | "));
                        output.push('\n');
                    }
                }
            }
            _ => {}
        }
    }

    /// Slides are read in slide-number order; an unreadable slide is skipped
    fn extract_pptx(path: &Path) -> Result<String, String> {
        let file =
            std::fs::File::open(path).map_err(|e| format!("Failed to open PPTX file: {}", e))?;
        let mut archive =
            zip::ZipArchive::new(file).map_err(|e| format!("Failed to read PPTX archive: {}", e))?;

        let mut slides: Vec<(u32, String)> = archive
            .file_names()
            .filter_map(|name| {
                let number = SLIDE_NAME.captures(name)?.get(1)?.as_str().parse().ok()?;
                Some((number, name.to_string()))
            })
            .collect();
        slides.sort();

        let mut sections = Vec::new();
        for (_, name) in &slides {
            let mut xml = String::new();
            let read = archive
                .by_name(name)
                .map_err(|e| e.to_string())
                .and_then(|mut entry| entry.read_to_string(&mut xml).map_err(|e| e.to_string()));
            if let Err(e) = read {
                tracing::warn!(file = %path.display(), slide = %name, error = %e, "Skipping unreadable slide");
                continue;
            }

            let runs: Vec<String> = TEXT_RUN
                .captures_iter(&xml)
                .filter_map(|c| c.get(1))
                .map(|m| unescape_xml(m.as_str()))
                .filter(|t| !t.trim().is_empty())
                .collect();
            if !runs.is_empty() {
                sections.push(runs.join(" "));
            }
        }

        Ok(sections.join("\n---\n"))
    }

    /// One `### sheet ###` header per non-empty sheet, cells joined with ` | `
    fn workbook_text<RS, R>(workbook: &mut R) -> String
    where
        RS: Read + Seek,
        R: Reader<RS>,
    {
        let mut all_text = String::new();
        let sheet_names: Vec<String> = workbook.sheet_names().to_vec();

        for sheet_name in &sheet_names {
            let Ok(range) = workbook.worksheet_range(sheet_name) else {
                tracing::debug!(sheet = %sheet_name, "Skipping unreadable sheet");
                continue;
            };

            let rows: Vec<String> = range
                .rows()
                .map(|row| {
                    row.iter()
                        .map(|cell| cell.to_string().trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect::<Vec<_>>()
                        .join(" | ")
                })
                .filter(|line| !line.is_empty())
                .collect();

            if !rows.is_empty() {
                all_text.push_str(&format!("### {} ###\n", sheet_name));
                all_text.push_str(&rows.join("\n"));
                all_text.push_str("\n\n");
            }
        }

        all_text
    }
}

impl TextExtractor for DocumentParser {
    fn extract_text(&self, path: &Path) -> String {
        match self.parse(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "Text extraction failed");
                String::new()
            }
        }
    }
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
