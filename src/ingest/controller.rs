//! The ingestion controller: one document buffer, three input channels.
//!
//! Typing, pasting and file submission (picker or drag-and-drop) all end in
//! the same buffer. Every new attempt supersedes the previous one: the
//! generation counter moves forward and any pending delayed commit is
//! aborted, so effects of an older attempt can never land after a newer
//! one.
//!
//! The controller is a cheap handle (`Clone` shares state) so a UI can keep
//! calling [`IngestionController::clear`] while a
//! [`IngestionController::submit_file`] future is still awaiting extraction.

use crate::analysis::{AnalysisBackend, ClassificationResult};
use crate::config::TriageConfig;
use crate::error::TriageError;
use crate::ingest::clipboard::ClipboardSource;
use crate::ingest::extract::{extract_text, PdfTextBackend, PdfiumTextBackend};
use crate::ingest::source::{IncomingFile, IngestionSource, MediaType};
use crate::ingest::state::{AttemptId, IngestionSnapshot, IngestionState, SubmitOutcome};
use crate::progress::ProgressCallback;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Owns the document buffer and its state machine.
#[derive(Clone)]
pub struct IngestionController {
    shared: Arc<Shared>,
}

struct Shared {
    inner: Mutex<Inner>,
    pdf_backend: Arc<dyn PdfTextBackend>,
    commit_delay: Duration,
    progress: Option<ProgressCallback>,
}

#[derive(Default)]
struct Inner {
    text: String,
    state: IngestionState,
    result: Option<ClassificationResult>,
    drag_active: bool,
    generation: u64,
    pending_commit: Option<JoinHandle<()>>,
}

impl Inner {
    /// The attempt currently extracting, committing or analysing.
    fn in_flight(&self) -> Option<AttemptId> {
        match self.state {
            IngestionState::Extracting { attempt, .. }
            | IngestionState::Committing { attempt }
            | IngestionState::Analyzing { attempt } => Some(attempt),
            _ => None,
        }
    }

    /// Start a new attempt, cancelling whatever the previous one left
    /// pending. Returns the new id and the superseded one, if any.
    fn begin_attempt(&mut self) -> (AttemptId, Option<AttemptId>) {
        let superseded = self.in_flight();
        if let Some(handle) = self.pending_commit.take() {
            handle.abort();
        }
        self.generation += 1;
        (AttemptId::new(self.generation), superseded)
    }

    fn is_current(&self, attempt: AttemptId) -> bool {
        self.generation == attempt.generation()
    }

    fn snapshot(&self) -> IngestionSnapshot {
        IngestionSnapshot {
            text: self.text.clone(),
            state: self.state.clone(),
            result: self.result.clone(),
            drag_active: self.drag_active,
        }
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fire callbacks after the lock is released so observers may call
    /// back into the controller.
    fn emit(&self, superseded: Option<AttemptId>, states: &[IngestionState]) {
        if let Some(attempt) = superseded {
            debug!("Attempt {} superseded", attempt);
        }
        for state in states {
            debug!("Ingestion state → {:?}", state);
        }
        if let Some(ref cb) = self.progress {
            if let Some(attempt) = superseded {
                cb.on_superseded(attempt);
            }
            for state in states {
                cb.on_state_change(state);
            }
        }
    }

    /// Land an attempt's text in the buffer if it is still current.
    fn commit(&self, attempt: AttemptId, text: String) {
        let len = text.len();
        let state = {
            let mut inner = self.lock();
            if !inner.is_current(attempt) {
                debug!("Dropping stale commit for attempt {}", attempt);
                return;
            }
            inner.text = text;
            inner.state = IngestionState::Idle;
            inner.pending_commit = None;
            inner.state.clone()
        };

        info!("Committed attempt {} ({} bytes)", attempt, len);
        if let Some(ref cb) = self.progress {
            cb.on_committed(attempt, len);
        }
        self.emit(None, &[state]);
    }
}

impl IngestionController {
    /// Create a controller extracting PDFs through pdfium.
    pub fn new(config: &TriageConfig) -> Self {
        let backend = PdfiumTextBackend::new(config.resolved_pdfium_path());
        Self::with_pdf_backend(config, Arc::new(backend))
    }

    /// Create a controller with a custom PDF text backend.
    pub fn with_pdf_backend(config: &TriageConfig, pdf_backend: Arc<dyn PdfTextBackend>) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner::default()),
                pdf_backend,
                commit_delay: config.commit_delay(),
                progress: config.progress_callback.clone(),
            }),
        }
    }

    // ── File channel ─────────────────────────────────────────────────────

    /// Validate, extract and (after the smoothing delay) commit a file.
    ///
    /// Unsupported media types fail with [`TriageError::UnsupportedFormat`]
    /// before any extraction and leave the buffer untouched. Accepted files
    /// first clear the buffer, result and error. Extraction failures clear
    /// the busy state immediately and leave the buffer empty.
    ///
    /// Returns once extraction has finished; the commit itself happens
    /// later on a timer task unless [`clear`](Self::clear) or a newer
    /// submission cancels it.
    pub async fn submit_file(
        &self,
        file: IncomingFile,
        source: IngestionSource,
    ) -> Result<SubmitOutcome, TriageError> {
        info!(
            "Ingesting '{}' ({}, {} bytes) via {}",
            file.name,
            file.media_type,
            file.bytes.len(),
            source
        );

        let (attempt, media) = {
            let mut inner = self.shared.lock();
            let (attempt, superseded) = inner.begin_attempt();
            let mut states = vec![IngestionState::Validating];

            let Some(media) = MediaType::from_declared(&file.media_type) else {
                let err = TriageError::UnsupportedFormat {
                    media_type: file.media_type.clone(),
                };
                warn!("Rejected '{}': unsupported type '{}'", file.name, file.media_type);
                inner.state = IngestionState::Failed(err.clone());
                states.push(inner.state.clone());
                drop(inner);
                self.shared.emit(superseded, &states);
                return Err(err);
            };

            inner.text.clear();
            inner.result = None;
            inner.state = IngestionState::Extracting { attempt, media };
            states.push(inner.state.clone());
            drop(inner);
            self.shared.emit(superseded, &states);
            (attempt, media)
        };

        let outcome = extract_text(
            media,
            file.bytes,
            Arc::clone(&self.shared.pdf_backend),
            self.shared.progress.clone(),
        )
        .await;

        let mut inner = self.shared.lock();
        if !inner.is_current(attempt) {
            debug!("Attempt {} finished extraction after being superseded", attempt);
            return Ok(SubmitOutcome::Superseded(attempt));
        }

        match outcome {
            Err(err) => {
                warn!("Extraction of '{}' failed: {:?}", file.name, err);
                inner.state = IngestionState::Failed(err.clone());
                let state = inner.state.clone();
                drop(inner);
                self.shared.emit(None, &[state]);
                Err(err)
            }
            Ok(text) => {
                debug!(
                    "Attempt {} extracted {} bytes, committing in {:?}",
                    attempt,
                    text.len(),
                    self.shared.commit_delay
                );
                inner.state = IngestionState::Committing { attempt };

                let shared = Arc::clone(&self.shared);
                let delay = self.shared.commit_delay;
                inner.pending_commit = Some(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    shared.commit(attempt, text);
                }));

                let state = inner.state.clone();
                drop(inner);
                self.shared.emit(None, &[state]);
                Ok(SubmitOutcome::Scheduled(attempt))
            }
        }
    }

    // ── Text channels ────────────────────────────────────────────────────

    /// Replace the buffer with pasted or dropped text and clear any error.
    ///
    /// Empty text is ignored.
    pub fn submit_pasted_text(&self, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            debug!("Ignoring empty paste");
            return;
        }

        let (superseded, state) = {
            let mut inner = self.shared.lock();
            let (_, superseded) = inner.begin_attempt();
            inner.text = text;
            inner.state = IngestionState::Idle;
            (superseded, inner.state.clone())
        };
        self.shared.emit(superseded, &[state]);
    }

    /// Replace the buffer with typed text. No validation, no busy state;
    /// an error already on display stays there.
    pub fn submit_typed_text(&self, text: impl Into<String>) {
        let text = text.into();
        let (superseded, state) = {
            let mut inner = self.shared.lock();
            let (_, superseded) = inner.begin_attempt();
            inner.text = text;
            if inner.state.is_busy() {
                inner.state = IngestionState::Idle;
                (superseded, Some(inner.state.clone()))
            } else {
                (superseded, None)
            }
        };
        self.shared.emit(superseded, state.as_slice());
    }

    /// Read the clipboard and commit its text.
    ///
    /// A refused read surfaces [`TriageError::ClipboardDenied`] and leaves
    /// the buffer as it was.
    pub async fn paste_from(&self, clipboard: &dyn ClipboardSource) -> Result<(), TriageError> {
        match clipboard.read_text().await {
            Ok(text) => {
                self.submit_pasted_text(text);
                Ok(())
            }
            Err(err) => {
                let err = match err {
                    denied @ TriageError::ClipboardDenied { .. } => denied,
                    other => TriageError::ClipboardDenied {
                        detail: other.to_string(),
                    },
                };
                warn!("Clipboard read refused: {:?}", err);

                let (superseded, state) = {
                    let mut inner = self.shared.lock();
                    let (_, superseded) = inner.begin_attempt();
                    inner.state = IngestionState::Failed(err.clone());
                    (superseded, inner.state.clone())
                };
                self.shared.emit(superseded, &[state]);
                Err(err)
            }
        }
    }

    // ── Reset and presentation ───────────────────────────────────────────

    /// Reset buffer, error and result; cancel any pending work.
    pub fn clear(&self) {
        let (superseded, state) = {
            let mut inner = self.shared.lock();
            let (_, superseded) = inner.begin_attempt();
            inner.text.clear();
            inner.result = None;
            inner.state = IngestionState::Idle;
            (superseded, inner.state.clone())
        };
        self.shared.emit(superseded, &[state]);
    }

    /// Toggle the "drag is hovering" flag. Has no effect on ingestion.
    pub fn set_drag_active(&self, active: bool) {
        self.shared.lock().drag_active = active;
    }

    // ── Analysis ─────────────────────────────────────────────────────────

    /// Send the buffer to the analysis backend and keep the result.
    ///
    /// Fails with [`TriageError::EmptyInput`] when the buffer is blank. If a
    /// file is still being loaded the state is left untouched. A
    /// response arriving after the buffer was superseded is returned to the
    /// caller but not stored.
    pub async fn analyze(
        &self,
        backend: &dyn AnalysisBackend,
    ) -> Result<ClassificationResult, TriageError> {
        let (text, attempt) = {
            let mut inner = self.shared.lock();
            if inner.text.trim().is_empty() {
                // A pending file owns the state until it commits or fails.
                if inner.state.is_busy() {
                    drop(inner);
                    warn!("Analysis requested while a document is still loading");
                    return Err(TriageError::EmptyInput);
                }
                inner.state = IngestionState::Failed(TriageError::EmptyInput);
                let state = inner.state.clone();
                drop(inner);
                warn!("Analysis requested with an empty buffer");
                self.shared.emit(None, &[state]);
                return Err(TriageError::EmptyInput);
            }

            let (attempt, superseded) = inner.begin_attempt();
            inner.result = None;
            inner.state = IngestionState::Analyzing { attempt };
            let snapshot = (inner.text.clone(), attempt);
            let state = inner.state.clone();
            drop(inner);
            self.shared.emit(superseded, &[state]);
            snapshot
        };

        let outcome = backend.analyze(&text).await;

        let state = {
            let mut inner = self.shared.lock();
            if !inner.is_current(attempt) {
                debug!("Discarding analysis for superseded attempt {}", attempt);
                return outcome;
            }
            match &outcome {
                Ok(result) => {
                    info!("Analysis complete: {}", result.category);
                    inner.result = Some(result.clone());
                    inner.state = IngestionState::Idle;
                }
                Err(err) => {
                    warn!("Analysis failed: {}", err);
                    inner.state = IngestionState::Failed(err.clone());
                }
            }
            inner.state.clone()
        };
        self.shared.emit(None, &[state]);
        outcome
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> IngestionSnapshot {
        self.shared.lock().snapshot()
    }

    pub fn text(&self) -> String {
        self.shared.lock().text.clone()
    }

    pub fn state(&self) -> IngestionState {
        self.shared.lock().state.clone()
    }

    /// The error currently in the user-visible message slot.
    pub fn error(&self) -> Option<TriageError> {
        self.shared.lock().state.error().cloned()
    }

    pub fn result(&self) -> Option<ClassificationResult> {
        self.shared.lock().result.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.shared.lock().state.is_busy()
    }
}
