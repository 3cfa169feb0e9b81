//! Rendering a composed report to bytes and writing it to disk.
//!
//! Rendering never mutates the [`ReportArtifact`]; a failed export can be
//! retried with the same artifact. Files are written to a temporary file
//! in the target directory and renamed into place, so a failed write never
//! leaves a truncated report behind.

use crate::config::TriageConfig;
use crate::error::TriageError;
use crate::pdfium::bind_pdfium;
use crate::report::compose::ReportArtifact;
use crate::report::layout::{Element, FontTreatment, FontWeight, MM_PER_PT};
use pdfium_render::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Turns a laid-out report into a file format.
pub trait ReportRenderer: Send + Sync {
    fn render(&self, artifact: &ReportArtifact) -> Result<Vec<u8>, TriageError>;

    /// Extension of the exported file.
    fn file_extension(&self) -> &'static str {
        "pdf"
    }
}

// ── Pdfium ───────────────────────────────────────────────────────────────

/// Writes a PDF with pdfium using the standard Helvetica and Courier fonts.
#[derive(Debug, Clone, Default)]
pub struct PdfiumReportRenderer {
    library_path: Option<PathBuf>,
}

impl PdfiumReportRenderer {
    pub fn new(library_path: Option<PathBuf>) -> Self {
        Self { library_path }
    }

    pub fn from_config(config: &TriageConfig) -> Self {
        Self::new(config.resolved_pdfium_path())
    }
}

fn gray(level: u8) -> PdfColor {
    PdfColor::new(level, level, level, 255)
}

fn pdfium_error(e: PdfiumError) -> TriageError {
    TriageError::Internal(format!("pdfium: {e:?}"))
}

impl ReportRenderer for PdfiumReportRenderer {
    fn render(&self, artifact: &ReportArtifact) -> Result<Vec<u8>, TriageError> {
        let pdfium = bind_pdfium(self.library_path.as_deref())?;
        let mut document = pdfium.create_new_pdf().map_err(pdfium_error)?;

        let helvetica = document.fonts_mut().helvetica();
        let helvetica_bold = document.fonts_mut().helvetica_bold();
        let courier = document.fonts_mut().courier();
        let courier_bold = document.fonts_mut().courier_bold();

        // Layout coordinates are millimetres from the top; PDF user space
        // is points from the bottom.
        let page_width_mm = artifact.layout.page_width;
        let page_height_mm = artifact.layout.page_height;
        let flip = |y_mm: f32| PdfPoints::from_mm(page_height_mm - y_mm);

        for layout_page in &artifact.pages {
            let mut page = document
                .pages_mut()
                .create_page_at_end(PdfPagePaperSize::Custom(
                    PdfPoints::from_mm(page_width_mm),
                    PdfPoints::from_mm(page_height_mm),
                ))
                .map_err(pdfium_error)?;

            for element in &layout_page.elements {
                match element {
                    Element::Text(run) => {
                        let font = match (run.font, run.weight) {
                            (FontTreatment::Proportional, FontWeight::Normal) => helvetica,
                            (FontTreatment::Proportional, FontWeight::Bold) => helvetica_bold,
                            (FontTreatment::FixedWidth, FontWeight::Normal) => courier,
                            (FontTreatment::FixedWidth, FontWeight::Bold) => courier_bold,
                        };
                        let mut object = page
                            .objects_mut()
                            .create_text_object(
                                PdfPoints::from_mm(run.x),
                                flip(run.y),
                                &run.text,
                                font,
                                PdfPoints::new(run.size),
                            )
                            .map_err(pdfium_error)?;
                        object.set_fill_color(gray(run.gray)).map_err(pdfium_error)?;
                    }
                    Element::Rule(rule) => {
                        page.objects_mut()
                            .create_path_object_line(
                                PdfPoints::from_mm(rule.x1),
                                flip(rule.y),
                                PdfPoints::from_mm(rule.x2),
                                flip(rule.y),
                                gray(rule.gray),
                                PdfPoints::new(0.2 / MM_PER_PT),
                            )
                            .map_err(pdfium_error)?;
                    }
                }
            }
            debug!(
                "Rendered page {} ({} elements)",
                layout_page.number,
                layout_page.elements.len()
            );
        }

        document.save_to_bytes().map_err(pdfium_error)
    }
}

// ── Plain text ───────────────────────────────────────────────────────────

/// Page-separated plain text. Needs no native library.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextRenderer;

impl ReportRenderer for PlainTextRenderer {
    fn render(&self, artifact: &ReportArtifact) -> Result<Vec<u8>, TriageError> {
        let mut out = String::new();
        for page in &artifact.pages {
            if page.number > 1 {
                out.push('\n');
            }
            out.push_str(&format!("── Page {} ──\n", page.number));
            for element in &page.elements {
                match element {
                    Element::Text(run) => out.push_str(&run.text),
                    Element::Rule(_) => out.push_str(&"-".repeat(40)),
                }
                out.push('\n');
            }
        }
        Ok(out.into_bytes())
    }

    fn file_extension(&self) -> &'static str {
        "txt"
    }
}

// ── Export ───────────────────────────────────────────────────────────────

/// Path the report will be written to inside `dir`.
pub fn report_path(artifact: &ReportArtifact, renderer: &dyn ReportRenderer, dir: &Path) -> PathBuf {
    dir.join(Path::new(&artifact.file_name).with_extension(renderer.file_extension()))
}

/// Render `artifact` and write it into `dir` under the fixed report name.
///
/// Returns the written path. Any failure is an [`TriageError::ExportFailed`]
/// naming the target path; the directory is left as it was.
pub fn export_report(
    artifact: &ReportArtifact,
    renderer: &dyn ReportRenderer,
    dir: &Path,
) -> Result<PathBuf, TriageError> {
    let path = report_path(artifact, renderer, dir);
    let failed = |detail: String| {
        warn!("Report export to {} failed: {}", path.display(), detail);
        TriageError::ExportFailed {
            path: path.clone(),
            detail,
        }
    };

    let bytes = renderer.render(artifact).map_err(|e| failed(e.to_string()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| failed(format!("tempfile: {e}")))?;
    tmp.write_all(&bytes)
        .map_err(|e| failed(format!("write: {e}")))?;
    tmp.persist(&path)
        .map_err(|e| failed(format!("persist: {}", e.error)))?;

    info!(
        "Exported report ({} pages, {} bytes) → {}",
        artifact.page_count(),
        bytes.len(),
        path.display()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Category, ClassificationResult};
    use crate::report::compose::compose;
    use crate::report::layout::ReportLayout;
    use chrono::NaiveDate;

    fn artifact() -> ReportArtifact {
        let result = ClassificationResult {
            category: Category::Unproductive,
            suggested_response: "No reply needed.".into(),
            purpose: "Greeting".into(),
            probability: 0.1,
            justification: "Holiday wishes.".into(),
        };
        let at = NaiveDate::from_ymd_opt(2024, 12, 24)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .unwrap();
        compose(&result, "Happy holidays!", at, &ReportLayout::default())
    }

    #[test]
    fn plain_text_contains_sections() {
        let bytes = PlainTextRenderer.render(&artifact()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("── Page 1 ──\n"));
        assert!(text.contains("Email Analysis Report"));
        assert!(text.contains("Category: Unproductive"));
        assert!(text.contains("Productivity Level: 10%"));
        assert!(text.contains("Happy holidays!"));
        assert!(text.contains(&"-".repeat(40)));
    }

    #[test]
    fn report_path_uses_renderer_extension() {
        let a = artifact();
        let dir = Path::new("/tmp/x");
        assert_eq!(
            report_path(&a, &PlainTextRenderer, dir),
            dir.join("email-analysis.txt")
        );
        assert_eq!(
            report_path(&a, &PdfiumReportRenderer::default(), dir),
            dir.join("email-analysis.pdf")
        );
    }

    #[test]
    fn export_into_missing_directory_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("does-not-exist");
        let err = export_report(&artifact(), &PlainTextRenderer, &missing).unwrap_err();
        assert!(matches!(err, TriageError::ExportFailed { .. }));
    }
}
