//! Document ingestion: typed, pasted, picked or dropped input to one text buffer.
//!
//! ## Data Flow
//!
//! ```text
//! keyboard ─────────────────────────────────────────┐
//! clipboard ──▶ clipboard ──────────────────────────┤
//! picker / drop ──▶ source ──▶ extract ──▶ (delay) ─┴─▶ controller buffer
//!                   (type)     (text | pdfium)
//! ```
//!
//! 1. [`source`]: media types, input channels and incoming files
//! 2. [`extract`]: plain-text decode and per-page PDF text collection
//! 3. [`clipboard`]: the read-only clipboard boundary
//! 4. [`state`]: the explicit state machine and attempt identities
//! 5. [`controller`]: the single owner of buffer, state and result

pub mod clipboard;
pub mod controller;
pub mod extract;
pub mod source;
pub mod state;

pub use clipboard::{ClipboardSource, StdinClipboard};
pub use controller::IngestionController;
pub use extract::{PageText, PdfTextBackend, PdfiumTextBackend};
pub use source::{IncomingFile, IngestionSource, MediaType};
pub use state::{AttemptId, IngestionSnapshot, IngestionState, SubmitOutcome};
