//! Input sources and the files they deliver.

use crate::error::TriageError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Declared type used when a file's extension maps to nothing we accept.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// The two media types the ingestion pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    /// `text/plain`: decoded verbatim.
    PlainText,
    /// `application/pdf`: text collected page by page.
    Pdf,
}

impl MediaType {
    /// Parse a declared media type.
    ///
    /// Matching is case-insensitive and ignores parameters, so
    /// `text/plain; charset=utf-8` is plain text.
    pub fn from_declared(declared: &str) -> Option<Self> {
        let essence = declared
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "text/plain" => Some(MediaType::PlainText),
            "application/pdf" => Some(MediaType::Pdf),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::PlainText => "text/plain",
            MediaType::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an ingestion request came from.
///
/// File pickers and drag-and-drop are equivalent entry points; the tag only
/// feeds logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IngestionSource {
    Typed,
    Pasted,
    FileSelected,
    Dropped,
}

impl fmt::Display for IngestionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IngestionSource::Typed => "typed",
            IngestionSource::Pasted => "pasted",
            IngestionSource::FileSelected => "file picker",
            IngestionSource::Dropped => "drag-and-drop",
        };
        f.write_str(s)
    }
}

/// A file handed to the controller: name, declared type and raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl IncomingFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Read a local file, declaring its type from the extension.
    ///
    /// Unknown extensions are declared as `application/octet-stream` so the
    /// controller rejects them through the normal validation path.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, TriageError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| TriageError::ExtractionFailed {
                detail: format!("{}: {e}", path.display()),
            })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let media_type = media_type_for_path(path);
        debug!("Read {} ({} bytes, {})", name, bytes.len(), media_type);
        Ok(Self::new(name, media_type, bytes))
    }
}

/// Map a file extension to the media type a browser would declare.
pub fn media_type_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("txt") | Some("text") => MediaType::PlainText.as_str(),
        Some("pdf") => MediaType::Pdf.as_str(),
        _ => OCTET_STREAM,
    }
}
