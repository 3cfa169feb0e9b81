//! The report compositor.
//!
//! [`compose`] turns a [`ClassificationResult`](crate::analysis::ClassificationResult)
//! and the original document text into a [`ReportArtifact`]: a sequence of
//! fixed-size pages holding positioned text runs and rules. The artifact is
//! independent of any output format; [`export_report`] hands it to a
//! [`ReportRenderer`] and writes the result under [`REPORT_FILE_NAME`].
//!
//! ```text
//! result + original ──▶ compose ──▶ ReportArtifact ──▶ renderer ──▶ email-analysis.pdf
//!                        (layout)     (pages)           (pdfium | text)
//! ```

pub mod compose;
pub mod export;
pub mod layout;

pub use compose::{
    compose, compose_now, compose_with, productivity_percent, ReportArtifact,
    ORIGINAL_DOCUMENT_TITLE, REPORT_FILE_NAME, REPORT_HEADING, SUGGESTED_RESPONSE_TITLE,
    SUMMARY_TITLE, TIMESTAMP_FORMAT,
};
pub use export::{export_report, report_path, PdfiumReportRenderer, PlainTextRenderer, ReportRenderer};
pub use layout::{
    wrap_text, ApproximateMetrics, Element, FontTreatment, FontWeight, Page, ReportLayout,
    ReportWriter, RuleLine, Section, SectionPlacement, TextMetrics, TextRun,
};
