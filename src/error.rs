//! Error types for the mail-triage library.
//!
//! Every failure the ingestion and report pipelines can produce is a
//! [`TriageError`]. None of them is fatal to the session: each one is
//! surfaced through a single user-visible message slot (its `Display`
//! output) and the system stays ready for another attempt.
//!
//! The type is `Clone` because the ingestion controller keeps the current
//! error inside its state ([`crate::ingest::IngestionState::Failed`]) while
//! also returning it to the caller. Variants therefore carry string details
//! rather than foreign error values.

use std::path::PathBuf;
use thiserror::Error;

/// Message shown when the analysis backend fails without saying why.
pub const GENERIC_BACKEND_ERROR: &str = "Unknown server error";

/// All errors returned by the mail-triage library.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TriageError {
    // ── Ingestion errors ──────────────────────────────────────────────────
    /// The declared media type is neither `text/plain` nor `application/pdf`.
    ///
    /// Reported before any byte of the file is read.
    #[error("Invalid file format. Please upload only .txt or .pdf files.")]
    UnsupportedFormat { media_type: String },

    /// Reading or decoding the file failed. Partial text is never committed.
    #[error("Could not read the file.")]
    ExtractionFailed { detail: String },

    /// The environment refused the clipboard read.
    #[error("Could not paste from the clipboard. Check your permissions.")]
    ClipboardDenied { detail: String },

    // ── Analysis errors ───────────────────────────────────────────────────
    /// Analysis was requested while the document buffer is blank.
    #[error("The email field cannot be empty.")]
    EmptyInput,

    /// The analysis backend answered with a failure; the message is passed
    /// through verbatim (or [`GENERIC_BACKEND_ERROR`] when absent).
    #[error("{message}")]
    BackendError { message: String },

    // ── Export errors ─────────────────────────────────────────────────────
    /// Rendering or writing the report failed. The in-memory artifact is
    /// untouched and the export can be retried as-is.
    #[error("Failed to export report to '{}': {detail}", .path.display())]
    ExportFailed { path: PathBuf, detail: String },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Text extraction from PDF and report export need the pdfium shared library.\n\
  • Install libpdfium system-wide, or\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (file or containing directory).\n"
    )]
    PdfiumBindingFailed(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TriageError {
    /// Build a [`TriageError::BackendError`], falling back to the generic
    /// message when the backend gave none or an empty one. Anything else,
    /// whitespace included, is kept verbatim.
    pub fn backend(message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| GENERIC_BACKEND_ERROR.to_string());
        TriageError::BackendError { message }
    }

    /// The text shown in the single user-visible error slot.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_hides_media_type() {
        let e = TriageError::UnsupportedFormat {
            media_type: "image/png".into(),
        };
        assert_eq!(
            e.user_message(),
            "Invalid file format. Please upload only .txt or .pdf files."
        );
    }

    #[test]
    fn backend_message_passes_through_verbatim() {
        let e = TriageError::backend(Some("Quota exceeded, try later".into()));
        assert_eq!(e.to_string(), "Quota exceeded, try later");
    }

    #[test]
    fn backend_without_message_uses_fallback() {
        assert_eq!(TriageError::backend(None).to_string(), GENERIC_BACKEND_ERROR);
        assert_eq!(
            TriageError::backend(Some(String::new())).to_string(),
            GENERIC_BACKEND_ERROR
        );
    }

    #[test]
    fn whitespace_backend_message_is_kept() {
        assert_eq!(TriageError::backend(Some("   ".into())).to_string(), "   ");
    }

    #[test]
    fn export_failed_display() {
        let e = TriageError::ExportFailed {
            path: PathBuf::from("/tmp/out/email-analysis.pdf"),
            detail: "disk full".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("email-analysis.pdf"), "got: {msg}");
        assert!(msg.contains("disk full"), "got: {msg}");
    }

    #[test]
    fn binding_failure_mentions_env_var() {
        let e = TriageError::PdfiumBindingFailed("not found".into());
        assert!(e.to_string().contains("PDFIUM_LIB_PATH"));
    }
}
