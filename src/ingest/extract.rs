//! Extraction: format-specific decoding of file bytes into text.
//!
//! Plain text is decoded directly. PDF goes through a [`PdfTextBackend`]
//! that reports the text items of every page; [`join_pages`] then turns
//! those into the normalised document text.
//!
//! ## Why spawn_blocking?
//!
//! pdfium is a C++ library with global state and no async story. Page
//! iteration runs on tokio's blocking pool so the controller stays
//! responsive to a superseding `clear()` while a large PDF is being read.

use crate::error::TriageError;
use crate::ingest::source::MediaType;
use crate::pdfium::bind_pdfium;
use crate::progress::ProgressCallback;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Separator placed between the texts of consecutive PDF pages.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Text items read from one PDF page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// 1-indexed page number.
    pub number: usize,
    pub items: Vec<String>,
}

impl PageText {
    pub fn new(number: usize, items: Vec<String>) -> Self {
        Self { number, items }
    }
}

/// A source of per-page PDF text.
///
/// Implementations must read pages in order from page 1 to the page count
/// and call `on_page(page_num, total_pages)` after each one. Any failure
/// aborts the whole extraction; partial page lists are never returned.
pub trait PdfTextBackend: Send + Sync {
    fn extract_pages(
        &self,
        bytes: &[u8],
        on_page: &mut dyn FnMut(usize, usize),
    ) -> Result<Vec<PageText>, TriageError>;
}

/// [`PdfTextBackend`] built on pdfium-render.
#[derive(Debug, Clone, Default)]
pub struct PdfiumTextBackend {
    library_path: Option<PathBuf>,
}

impl PdfiumTextBackend {
    pub fn new(library_path: Option<PathBuf>) -> Self {
        Self { library_path }
    }
}

impl PdfTextBackend for PdfiumTextBackend {
    fn extract_pages(
        &self,
        bytes: &[u8],
        on_page: &mut dyn FnMut(usize, usize),
    ) -> Result<Vec<PageText>, TriageError> {
        let pdfium = bind_pdfium(self.library_path.as_deref())?;

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| TriageError::ExtractionFailed {
                detail: format!("cannot open PDF: {e:?}"),
            })?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        info!("PDF loaded: {} pages", total_pages);

        let mut results = Vec::with_capacity(total_pages);
        for (idx, page) in pages.iter().enumerate() {
            let page_num = idx + 1;
            let text = page.text().map_err(|e| TriageError::ExtractionFailed {
                detail: format!("page {page_num}: {e:?}"),
            })?;

            let items: Vec<String> = text
                .segments()
                .iter()
                .map(|segment| segment.text())
                .collect();
            debug!("Page {}: {} text items", page_num, items.len());

            results.push(PageText::new(page_num, items));
            on_page(page_num, total_pages);
        }

        Ok(results)
    }
}

/// Decode plain-text bytes the way a browser's `File.text()` does: UTF-8
/// with replacement characters, leading byte-order mark dropped.
pub fn decode_plain_text(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.strip_prefix('\u{FEFF}').unwrap_or(&text).to_string()
}

/// Assemble page texts into the normalised document.
///
/// Pages are ordered by page number, items within a page are joined with a
/// single space, pages with a blank line, and the result is trimmed.
pub fn join_pages(mut pages: Vec<PageText>) -> String {
    pages.sort_by_key(|p| p.number);

    let mut full = String::new();
    for page in &pages {
        full.push_str(&page.items.join(" "));
        full.push_str(PAGE_SEPARATOR);
    }
    full.trim().to_string()
}

/// Extract the normalised text of a file.
///
/// Plain text never leaves the calling task; PDF extraction runs on the
/// blocking pool and reports pages through `progress`.
pub async fn extract_text(
    media: MediaType,
    bytes: Vec<u8>,
    backend: Arc<dyn PdfTextBackend>,
    progress: Option<ProgressCallback>,
) -> Result<String, TriageError> {
    match media {
        MediaType::PlainText => Ok(decode_plain_text(&bytes)),
        MediaType::Pdf => {
            let pages = tokio::task::spawn_blocking(move || {
                let mut on_page = |page_num: usize, total_pages: usize| {
                    if let Some(ref cb) = progress {
                        cb.on_page_extracted(page_num, total_pages);
                    }
                };
                backend.extract_pages(&bytes, &mut on_page)
            })
            .await
            .map_err(|e| TriageError::ExtractionFailed {
                detail: format!("extraction task failed: {e}"),
            })??;

            Ok(join_pages(pages))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: usize, items: &[&str]) -> PageText {
        PageText::new(n, items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn pages_joined_with_blank_line_and_trimmed() {
        let text = join_pages(vec![page(1, &["A"]), page(2, &["B"]), page(3, &["C"])]);
        assert_eq!(text, "A\n\nB\n\nC");
    }

    #[test]
    fn items_joined_with_single_space() {
        let text = join_pages(vec![page(1, &["Hello", "world"]), page(2, &["Bye"])]);
        assert_eq!(text, "Hello world\n\nBye");
    }

    #[test]
    fn pages_sorted_by_number() {
        let text = join_pages(vec![page(2, &["second"]), page(1, &["first"])]);
        assert_eq!(text, "first\n\nsecond");
    }

    #[test]
    fn empty_document_is_empty_string() {
        assert_eq!(join_pages(vec![]), "");
        assert_eq!(join_pages(vec![page(1, &[]), page(2, &[])]), "");
    }

    #[test]
    fn plain_text_is_verbatim() {
        let raw = "  From: ana@example.com\r\n\r\nHi team,\n  ";
        assert_eq!(decode_plain_text(raw.as_bytes()), raw);
    }

    #[test]
    fn plain_text_drops_bom_and_replaces_invalid_utf8() {
        let mut bytes = "\u{FEFF}olá".as_bytes().to_vec();
        bytes.push(0xFF);
        assert_eq!(decode_plain_text(&bytes), "olá\u{FFFD}");
    }
}
