//! Progress-callback trait for ingestion events.
//!
//! Inject an [`Arc<dyn IngestionProgressCallback>`] via
//! [`crate::config::TriageConfigBuilder::progress_callback`] to observe the
//! ingestion controller as it validates, extracts and commits documents.
//!
//! # Why callbacks instead of channels?
//!
//! A callback is the least-invasive integration point: a terminal spinner,
//! a GUI event loop or a test recorder can all hang off the same hooks
//! without the library knowing how the host application communicates.
//!
//! # Example
//!
//! ```rust
//! use mail_triage::{IngestionProgressCallback, TriageConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter {
//!     pages: AtomicUsize,
//! }
//!
//! impl IngestionProgressCallback for PageCounter {
//!     fn on_page_extracted(&self, page_num: usize, total_pages: usize) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page_num}/{total_pages}");
//!     }
//! }
//!
//! let config = TriageConfig::builder()
//!     .progress_callback(Arc::new(PageCounter { pages: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::ingest::{AttemptId, IngestionState};
use std::sync::Arc;

/// Called by the ingestion controller at each observable step.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. PDF pages are reported from the blocking extraction
/// thread and commits from a timer task, so implementations must be
/// `Send + Sync`.
pub trait IngestionProgressCallback: Send + Sync {
    /// Called after every state transition.
    fn on_state_change(&self, state: &IngestionState) {
        let _ = state;
    }

    /// Called after each PDF page's text has been read.
    ///
    /// # Arguments
    /// * `page_num`: 1-indexed page number
    /// * `total_pages`: page count of the document
    fn on_page_extracted(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when an attempt's text lands in the document buffer.
    ///
    /// # Arguments
    /// * `attempt`: the committed attempt
    /// * `text_len`: byte length of the committed text
    fn on_committed(&self, attempt: AttemptId, text_len: usize) {
        let _ = (attempt, text_len);
    }

    /// Called when an attempt is discarded because a newer one (or a
    /// `clear()`) replaced it before it could commit.
    fn on_superseded(&self, attempt: AttemptId) {
        let _ = attempt;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl IngestionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::TriageConfig`].
pub type ProgressCallback = Arc<dyn IngestionProgressCallback>;
