//! # mail-triage
//!
//! Ingest an email from whatever the user has at hand (typed text, the
//! clipboard, a picked or dropped `.txt`/`.pdf` file), send it to a
//! classification backend, and export the verdict together with the
//! original text as a paginated report.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input
//!  │
//!  ├─ 1. Ingest   validate type, decode text or walk PDF pages (pdfium)
//!  ├─ 2. Commit   delayed write into the document buffer, cancellable
//!  ├─ 3. Analyze  POST { "email": text } to the backend
//!  ├─ 4. Compose  lay the result and the original out onto A4 pages
//!  └─ 5. Export   render (pdfium or plain text) and write atomically
//! ```
//!
//! Only one ingestion attempt is ever current. Starting a new one (or
//! calling [`IngestionController::clear`]) cancels the pending commit of
//! the previous attempt, so stale text never overwrites newer input.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mail_triage::{
//!     compose_now, export_report, HttpAnalysisBackend, IncomingFile, IngestionController,
//!     IngestionSource, PdfiumReportRenderer, TriageConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TriageConfig::builder().commit_delay_ms(0).build()?;
//!     let controller = IngestionController::new(&config);
//!
//!     let file = IncomingFile::from_path("message.pdf").await?;
//!     controller.submit_file(file, IngestionSource::FileSelected).await?;
//!     tokio::time::sleep(config.commit_delay()).await;
//!
//!     let backend = HttpAnalysisBackend::from_config(&config)?;
//!     let result = controller.analyze(&backend).await?;
//!
//!     let report = compose_now(&result, &controller.text(), &config.layout);
//!     let path = export_report(&report, &PdfiumReportRenderer::from_config(&config), std::path::Path::new("."))?;
//!     eprintln!("report written to {}", path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `mail-triage` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! mail-triage = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analysis;
pub mod config;
pub mod error;
pub mod ingest;
pub mod pdfium;
pub mod progress;
pub mod report;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analysis::{interpret_response, AnalysisBackend, Category, ClassificationResult, HttpAnalysisBackend};
pub use config::{TriageConfig, TriageConfigBuilder, PDFIUM_LIB_PATH_ENV};
pub use error::{TriageError, GENERIC_BACKEND_ERROR};
pub use ingest::{
    AttemptId, ClipboardSource, IncomingFile, IngestionController, IngestionSnapshot, IngestionSource,
    IngestionState, MediaType, PageText, PdfTextBackend, PdfiumTextBackend, StdinClipboard,
    SubmitOutcome,
};
pub use progress::{IngestionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use report::{
    compose, compose_now, compose_with, export_report, productivity_percent, PdfiumReportRenderer,
    PlainTextRenderer, ReportArtifact, ReportLayout, ReportRenderer, REPORT_FILE_NAME,
};
