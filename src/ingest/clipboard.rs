//! The clipboard boundary: read-only access to clipboard text.

use crate::error::TriageError;
use async_trait::async_trait;
use tokio::io::AsyncReadExt;

/// A read-only clipboard.
///
/// A refused read (missing permission, no clipboard in the environment)
/// must be reported as [`TriageError::ClipboardDenied`].
#[async_trait]
pub trait ClipboardSource: Send + Sync {
    async fn read_text(&self) -> Result<String, TriageError>;
}

/// Treats standard input as the clipboard, for terminal use
/// (`pbpaste | mail-triage analyze --paste`).
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinClipboard;

#[async_trait]
impl ClipboardSource for StdinClipboard {
    async fn read_text(&self) -> Result<String, TriageError> {
        let mut raw = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut raw)
            .await
            .map_err(|e| TriageError::ClipboardDenied {
                detail: format!("stdin: {e}"),
            })?;
        String::from_utf8(raw).map_err(|e| TriageError::ClipboardDenied {
            detail: format!("stdin is not UTF-8 text: {e}"),
        })
    }
}
