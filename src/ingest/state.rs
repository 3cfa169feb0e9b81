//! The explicit ingestion state machine.
//!
//! ```text
//!            submit_file                extraction ok         delay elapsed
//!   Idle ──▶ Validating ──▶ Extracting ─────────────▶ Committing ─────────▶ Idle
//!              │                 │ failure
//!              ▼                 ▼
//!           Failed ◀─────────── Failed            analyze: Idle ─▶ Analyzing ─▶ Idle | Failed
//! ```
//!
//! The current error lives only inside [`IngestionState::Failed`], so
//! "busy and errored at once" cannot be represented.

use crate::analysis::ClassificationResult;
use crate::error::TriageError;
use crate::ingest::source::MediaType;
use std::fmt;

/// Identity of one ingestion attempt.
///
/// Attempts are numbered from a monotonic generation counter; an attempt is
/// current only while no newer attempt (or `clear()`) has started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttemptId(u64);

impl AttemptId {
    pub fn new(generation: u64) -> Self {
        Self(generation)
    }

    pub fn generation(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where the controller currently is.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum IngestionState {
    #[default]
    Idle,
    /// A file's declared type is being checked.
    Validating,
    /// File bytes are being decoded.
    Extracting { attempt: AttemptId, media: MediaType },
    /// Text is ready and waits for the smoothing delay before landing in
    /// the buffer.
    Committing { attempt: AttemptId },
    /// The buffer is with the analysis backend.
    Analyzing { attempt: AttemptId },
    /// The last action failed; the error is the user-visible message.
    Failed(TriageError),
}

impl IngestionState {
    /// Whether a file is being processed or analysed.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            IngestionState::Validating
                | IngestionState::Extracting { .. }
                | IngestionState::Committing { .. }
                | IngestionState::Analyzing { .. }
        )
    }

    pub fn error(&self) -> Option<&TriageError> {
        match self {
            IngestionState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// A consistent copy of everything the controller owns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IngestionSnapshot {
    pub text: String,
    pub state: IngestionState,
    pub result: Option<ClassificationResult>,
    /// Presentation-only "a drag is hovering" flag.
    pub drag_active: bool,
}

/// How a file submission ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Extraction succeeded; the text commits after the configured delay
    /// unless superseded first.
    Scheduled(AttemptId),
    /// A newer attempt or a `clear()` replaced this one during extraction.
    /// Nothing was committed and no error was surfaced.
    Superseded(AttemptId),
}

impl SubmitOutcome {
    pub fn attempt(&self) -> AttemptId {
        match self {
            SubmitOutcome::Scheduled(a) | SubmitOutcome::Superseded(a) => *a,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_states() {
        let a = AttemptId::new(3);
        assert!(!IngestionState::Idle.is_busy());
        assert!(IngestionState::Validating.is_busy());
        assert!(IngestionState::Extracting {
            attempt: a,
            media: MediaType::Pdf
        }
        .is_busy());
        assert!(IngestionState::Committing { attempt: a }.is_busy());
        assert!(IngestionState::Analyzing { attempt: a }.is_busy());
        assert!(!IngestionState::Failed(TriageError::EmptyInput).is_busy());
    }

    #[test]
    fn error_only_in_failed() {
        assert!(IngestionState::Idle.error().is_none());
        assert_eq!(
            IngestionState::Failed(TriageError::EmptyInput).error(),
            Some(&TriageError::EmptyInput)
        );
    }

    #[test]
    fn attempt_ids_order_by_generation() {
        assert!(AttemptId::new(1) < AttemptId::new(2));
        assert_eq!(AttemptId::new(7).to_string(), "#7");
    }
}
