//! Composition of an analysis result and its source document into a report.

use crate::analysis::ClassificationResult;
use crate::report::layout::{
    ApproximateMetrics, FontTreatment, Page, ReportLayout, ReportWriter, Section, SectionPlacement,
    TextMetrics,
};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const REPORT_HEADING: &str = "Email Analysis Report";
pub const SUMMARY_TITLE: &str = "Summary";
pub const SUGGESTED_RESPONSE_TITLE: &str = "Suggested Response";
pub const ORIGINAL_DOCUMENT_TITLE: &str = "Original Document";

/// Fixed export file name.
pub const REPORT_FILE_NAME: &str = "email-analysis.pdf";

/// How the generation timestamp is printed under the heading.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

const SECTION_TITLE_SIZE: f32 = 16.0;
const SUMMARY_BODY_SIZE: f32 = 11.0;
const RESPONSE_BODY_SIZE: f32 = 11.0;
const ORIGINAL_BODY_SIZE: f32 = 10.0;

/// A fully laid-out report, independent of any rendering backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportArtifact {
    pub heading: String,
    pub generated_at: NaiveDateTime,
    /// Sections in document order.
    pub sections: Vec<Section>,
    pub placements: Vec<SectionPlacement>,
    pub pages: Vec<Page>,
    pub file_name: String,
    /// Geometry the pages were laid out with.
    pub layout: ReportLayout,
}

impl ReportArtifact {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn placement(&self, title: &str) -> Option<&SectionPlacement> {
        self.placements.iter().find(|p| p.title == title)
    }

    /// The timestamp line as printed under the heading.
    pub fn timestamp_line(&self) -> String {
        self.generated_at.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Probability in `[0, 1]` as a whole percentage, rounding halves up.
///
/// Out-of-range input passes through: `1.5` gives `150`, `-0.2` gives `-20`.
pub fn productivity_percent(probability: f64) -> i64 {
    (probability * 100.0 + 0.5).floor() as i64
}

fn summary_body(result: &ClassificationResult) -> String {
    format!(
        "Category: {}\nPurpose: {}\nProductivity Level: {}%\nJustification: {}",
        result.category.label(),
        result.purpose,
        productivity_percent(result.probability),
        result.justification,
    )
}

/// The three sections of a report, in order.
pub fn sections_for(result: &ClassificationResult, original: &str) -> Vec<Section> {
    vec![
        Section {
            title: SUMMARY_TITLE.into(),
            body: summary_body(result),
            font: FontTreatment::Proportional,
            title_size: SECTION_TITLE_SIZE,
            body_size: SUMMARY_BODY_SIZE,
        },
        Section {
            title: SUGGESTED_RESPONSE_TITLE.into(),
            body: result.suggested_response.clone(),
            font: FontTreatment::FixedWidth,
            title_size: SECTION_TITLE_SIZE,
            body_size: RESPONSE_BODY_SIZE,
        },
        Section {
            title: ORIGINAL_DOCUMENT_TITLE.into(),
            body: original.to_string(),
            font: FontTreatment::FixedWidth,
            title_size: SECTION_TITLE_SIZE,
            body_size: ORIGINAL_BODY_SIZE,
        },
    ]
}

/// Compose with the built-in approximate font metrics.
pub fn compose(
    result: &ClassificationResult,
    original: &str,
    generated_at: NaiveDateTime,
    layout: &ReportLayout,
) -> ReportArtifact {
    let metrics = ApproximateMetrics::new(layout.line_height_ratio);
    compose_with(result, original, generated_at, layout, &metrics)
}

/// Compose using the given text metrics.
///
/// Order is fixed: title block, Summary, Suggested Response, divider,
/// Original Document. Same inputs give the same artifact.
pub fn compose_with(
    result: &ClassificationResult,
    original: &str,
    generated_at: NaiveDateTime,
    layout: &ReportLayout,
    metrics: &dyn TextMetrics,
) -> ReportArtifact {
    let sections = sections_for(result, original);
    let timestamp = generated_at.format(TIMESTAMP_FORMAT).to_string();

    let mut writer = ReportWriter::new(layout.clone(), metrics);
    writer.add_title_block(REPORT_HEADING, &timestamp);
    for (i, section) in sections.iter().enumerate() {
        // The divider sits between the analysis and the original document.
        if i + 1 == sections.len() {
            writer.add_divider();
        }
        writer.add_section(section);
    }
    let (pages, placements) = writer.finish();

    debug!(
        "Composed report: {} pages, {} chars of original text",
        pages.len(),
        original.len()
    );

    ReportArtifact {
        heading: REPORT_HEADING.into(),
        generated_at,
        sections,
        placements,
        pages,
        file_name: REPORT_FILE_NAME.into(),
        layout: layout.clone(),
    }
}

/// Compose stamped with the current local time.
pub fn compose_now(result: &ClassificationResult, original: &str, layout: &ReportLayout) -> ReportArtifact {
    compose(result, original, Local::now().naive_local(), layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Category;
    use chrono::NaiveDate;

    fn result() -> ClassificationResult {
        ClassificationResult {
            category: Category::Productive,
            suggested_response: "Thanks, I will look into it.".into(),
            purpose: "Support request".into(),
            probability: 0.873,
            justification: "Asks for a status update.".into(),
        }
    }

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .and_then(|d| d.and_hms_opt(14, 7, 9))
            .unwrap()
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(productivity_percent(0.873), 87);
        assert_eq!(productivity_percent(0.005), 1);
        assert_eq!(productivity_percent(0.5), 50);
        assert_eq!(productivity_percent(0.0), 0);
        assert_eq!(productivity_percent(1.0), 100);
    }

    #[test]
    fn percent_passes_out_of_range_through() {
        assert_eq!(productivity_percent(1.5), 150);
        assert_eq!(productivity_percent(-0.2), -20);
    }

    #[test]
    fn summary_lists_fields() {
        let body = summary_body(&result());
        assert_eq!(
            body,
            "Category: Productive\nPurpose: Support request\nProductivity Level: 87%\nJustification: Asks for a status update."
        );
    }

    #[test]
    fn sections_in_order() {
        let titles: Vec<_> = sections_for(&result(), "x").into_iter().map(|s| s.title).collect();
        assert_eq!(titles, [SUMMARY_TITLE, SUGGESTED_RESPONSE_TITLE, ORIGINAL_DOCUMENT_TITLE]);
    }

    #[test]
    fn timestamp_format() {
        let artifact = compose(&result(), "hello", at(), &ReportLayout::default());
        assert_eq!(artifact.timestamp_line(), "05/03/2024, 14:07:09");
        let first = artifact.pages[0].text_runs().nth(1).map(|r| r.text.clone());
        assert_eq!(first.as_deref(), Some("05/03/2024, 14:07:09"));
    }

    #[test]
    fn short_report_is_one_page() {
        let artifact = compose(&result(), "hello", at(), &ReportLayout::default());
        assert_eq!(artifact.page_count(), 1);
        assert_eq!(artifact.file_name, REPORT_FILE_NAME);
        assert_eq!(artifact.heading, REPORT_HEADING);
        assert_eq!(artifact.placements.len(), 3);
    }

    #[test]
    fn summary_starts_below_title_block() {
        let layout = ReportLayout::default();
        let artifact = compose(&result(), "hello", at(), &layout);
        let summary = artifact.placement(SUMMARY_TITLE).unwrap();
        let expected = layout.top_margin + layout.heading_advance + layout.title_block_gap;
        assert!((summary.start_y - expected).abs() < 1e-3);
    }
}
