//! Page geometry, text measurement and the running-cursor layout engine.
//!
//! Coordinates are millimetres from the top-left corner of a page; font
//! sizes are points. The vertical advance of a wrapped block is estimated
//! from its line count and font size (`size / line_height_ratio` per line).
//! That estimate is a heuristic, not exact typography, and it lives behind
//! [`TextMetrics::block_height`] so a backend with real font metrics can
//! replace it.

use crate::error::TriageError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Millimetres per typographic point.
pub const MM_PER_PT: f32 = 25.4 / 72.0;

/// Geometry and typography of the report. A4, millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLayout {
    pub page_width: f32,
    pub page_height: f32,
    /// Left and right margin.
    pub margin: f32,
    /// Cursor position at the top of a fresh page.
    pub top_margin: f32,
    /// A section title is never started below this line; the page breaks
    /// first.
    pub section_break_threshold: f32,
    /// Body lines never go below this line; they continue on a new page.
    pub content_bottom: f32,
    /// Cursor advance after a section title.
    pub title_advance: f32,
    /// Cursor advance after a section body.
    pub section_gap: f32,
    /// Cursor advance after the divider.
    pub divider_gap: f32,
    pub heading_size: f32,
    pub heading_advance: f32,
    pub timestamp_size: f32,
    pub title_block_gap: f32,
    /// Body line height is `font_size / line_height_ratio` millimetres.
    pub line_height_ratio: f32,
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self {
            page_width: 210.0,
            page_height: 297.0,
            margin: 15.0,
            top_margin: 20.0,
            section_break_threshold: 260.0,
            content_bottom: 282.0,
            title_advance: 8.0,
            section_gap: 10.0,
            divider_gap: 10.0,
            heading_size: 22.0,
            heading_advance: 8.0,
            timestamp_size: 10.0,
            title_block_gap: 15.0,
            line_height_ratio: 2.5,
        }
    }
}

impl ReportLayout {
    /// Width available to wrapped text.
    pub fn text_width(&self) -> f32 {
        self.page_width - self.margin * 2.0
    }

    pub fn validate(&self) -> Result<(), TriageError> {
        if self.text_width() <= 0.0 {
            return Err(TriageError::InvalidConfig(
                "report margins leave no room for text".into(),
            ));
        }
        if !(self.top_margin < self.section_break_threshold
            && self.section_break_threshold <= self.content_bottom
            && self.content_bottom <= self.page_height)
        {
            return Err(TriageError::InvalidConfig(format!(
                "report layout needs top margin < break threshold ≤ content bottom ≤ page height \
                 (got {} / {} / {} / {})",
                self.top_margin, self.section_break_threshold, self.content_bottom, self.page_height
            )));
        }
        if self.line_height_ratio <= 0.0 {
            return Err(TriageError::InvalidConfig(
                "line height ratio must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Font family of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontTreatment {
    /// Helvetica.
    Proportional,
    /// Courier.
    FixedWidth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontWeight {
    Normal,
    Bold,
}

/// Text measurement used by the layout engine.
pub trait TextMetrics: Send + Sync {
    /// Width of `text` in millimetres.
    fn text_width(&self, text: &str, font: FontTreatment, size: f32) -> f32;

    /// Vertical space taken by `lines` lines at `size` points, in millimetres.
    fn block_height(&self, lines: usize, size: f32) -> f32;
}

/// Metrics from the standard Helvetica/Courier widths plus the
/// line-height ratio heuristic.
#[derive(Debug, Clone, Copy)]
pub struct ApproximateMetrics {
    pub line_height_ratio: f32,
}

impl ApproximateMetrics {
    pub fn new(line_height_ratio: f32) -> Self {
        Self { line_height_ratio }
    }
}

impl Default for ApproximateMetrics {
    fn default() -> Self {
        Self::new(ReportLayout::default().line_height_ratio)
    }
}

/// Helvetica advance widths (1/1000 em) for ASCII 0x20..=0x7E.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Width used for characters outside the table (accented letters etc.).
const HELVETICA_DEFAULT_WIDTH: u16 = 556;

/// Every Courier glyph is 600/1000 em wide.
const COURIER_WIDTH: u16 = 600;

fn glyph_width(c: char, font: FontTreatment) -> u16 {
    match font {
        FontTreatment::FixedWidth => COURIER_WIDTH,
        FontTreatment::Proportional => match c as u32 {
            cp @ 0x20..=0x7E => HELVETICA_WIDTHS[(cp - 0x20) as usize],
            _ => HELVETICA_DEFAULT_WIDTH,
        },
    }
}

impl TextMetrics for ApproximateMetrics {
    fn text_width(&self, text: &str, font: FontTreatment, size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| glyph_width(c, font) as u32).sum();
        units as f32 / 1000.0 * size * MM_PER_PT
    }

    fn block_height(&self, lines: usize, size: f32) -> f32 {
        lines as f32 * (size / self.line_height_ratio)
    }
}

/// Split text into lines no wider than `max_width` millimetres.
///
/// Hard line breaks and leading indentation are kept, and words are filled
/// greedily. A word wider than the whole line is cut by character. Empty input yields a single empty
/// line so an empty section still occupies one line.
pub fn wrap_text(
    text: &str,
    metrics: &dyn TextMetrics,
    font: FontTreatment,
    size: f32,
    max_width: f32,
) -> Vec<String> {
    let normalised = text.replace("\r\n", "\n").replace('\r', "\n").replace('\t', "    ");
    let fits = |s: &str| metrics.text_width(s, font, size) <= max_width;

    let mut lines = Vec::new();
    for paragraph in normalised.split('\n') {
        let body = paragraph.trim_start_matches(' ');
        let indent = &paragraph[..paragraph.len() - body.len()];
        let mut current = String::new();
        for (i, word) in body.split(' ').enumerate() {
            // The first word carries the paragraph's indentation.
            let word = if i == 0 {
                format!("{indent}{word}")
            } else {
                word.to_string()
            };
            let word = word.as_str();
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if fits(&candidate) {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if fits(word) {
                current = word.to_string();
                continue;
            }

            // Cut an over-long word into line-sized pieces.
            for c in word.chars() {
                current.push(c);
                if !fits(&current) && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(c);
                }
            }
        }
        lines.push(current);
    }
    lines
}

/// Horizontal alignment of a text run relative to its `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Align {
    Left,
    Center,
}

/// One line of text placed on a page; `y` is the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    /// Left edge of the run, already adjusted for alignment.
    pub x: f32,
    pub y: f32,
    pub font: FontTreatment,
    pub weight: FontWeight,
    pub size: f32,
    /// Grey level 0 (black) ..= 255 (white).
    pub gray: u8,
    pub align: Align,
}

/// A horizontal divider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleLine {
    pub x1: f32,
    pub x2: f32,
    pub y: f32,
    pub gray: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Element {
    Text(TextRun),
    Rule(RuleLine),
}

/// A fixed-size page of positioned elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-indexed.
    pub number: usize,
    pub elements: Vec<Element>,
}

impl Page {
    fn new(number: usize) -> Self {
        Self {
            number,
            elements: Vec::new(),
        }
    }

    /// The text runs of this page, in drawing order.
    pub fn text_runs(&self) -> impl Iterator<Item = &TextRun> {
        self.elements.iter().filter_map(|e| match e {
            Element::Text(run) => Some(run),
            Element::Rule(_) => None,
        })
    }
}

/// A titled block of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub body: String,
    pub font: FontTreatment,
    pub title_size: f32,
    pub body_size: f32,
}

/// Where a section landed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionPlacement {
    pub title: String,
    pub start_page: usize,
    /// Baseline of the section title on `start_page`.
    pub start_y: f32,
    pub end_page: usize,
    pub line_count: usize,
}

const TITLE_GRAY: u8 = 40;
const BODY_GRAY: u8 = 80;
const HEADING_GRAY: u8 = 0;
const TIMESTAMP_GRAY: u8 = 150;
const DIVIDER_GRAY: u8 = 220;

/// The running-cursor layout engine.
///
/// Pages are created lazily: the first on construction, the others when
/// content overflows.
pub struct ReportWriter<'m> {
    layout: ReportLayout,
    metrics: &'m dyn TextMetrics,
    pages: Vec<Page>,
    cursor: f32,
    placements: Vec<SectionPlacement>,
}

impl<'m> ReportWriter<'m> {
    pub fn new(layout: ReportLayout, metrics: &'m dyn TextMetrics) -> Self {
        let cursor = layout.top_margin;
        Self {
            layout,
            metrics,
            pages: vec![Page::new(1)],
            cursor,
            placements: Vec::new(),
        }
    }

    pub fn layout(&self) -> &ReportLayout {
        &self.layout
    }

    /// Current vertical position on the current page.
    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Move the cursor down by `dy` millimetres.
    pub fn advance(&mut self, dy: f32) {
        self.cursor += dy;
    }

    fn new_page(&mut self) {
        let number = self.pages.len() + 1;
        debug!("Page break at y={:.1} → page {}", self.cursor, number);
        self.pages.push(Page::new(number));
        self.cursor = self.layout.top_margin;
    }

    fn push(&mut self, element: Element) {
        if let Some(page) = self.pages.last_mut() {
            page.elements.push(element);
        }
    }

    fn run(&self, text: String, x: f32, font: FontTreatment, weight: FontWeight, size: f32, gray: u8) -> TextRun {
        TextRun {
            text,
            x,
            y: self.cursor,
            font,
            weight,
            size,
            gray,
            align: Align::Left,
        }
    }

    /// Centered line at the cursor, followed by an advance of `advance`.
    pub fn add_centered(&mut self, text: &str, weight: FontWeight, size: f32, gray: u8, advance: f32) {
        let width = self.metrics.text_width(text, FontTreatment::Proportional, size);
        let x = (self.layout.page_width - width) / 2.0;
        let mut run = self.run(text.to_string(), x, FontTreatment::Proportional, weight, size, gray);
        run.align = Align::Center;
        self.push(Element::Text(run));
        self.cursor += advance;
    }

    /// Report heading: large bold title and a small timestamp line.
    pub fn add_title_block(&mut self, heading: &str, timestamp: &str) {
        let l = self.layout.clone();
        self.add_centered(heading, FontWeight::Bold, l.heading_size, HEADING_GRAY, l.heading_advance);
        self.add_centered(timestamp, FontWeight::Normal, l.timestamp_size, TIMESTAMP_GRAY, l.title_block_gap);
    }

    /// Lay out a titled section.
    ///
    /// The page breaks before the title when the cursor is already past the
    /// section threshold. Body lines that would fall below the content
    /// bottom continue at the top of a new page.
    pub fn add_section(&mut self, section: &Section) -> SectionPlacement {
        if self.cursor > self.layout.section_break_threshold {
            self.new_page();
        }

        let margin = self.layout.margin;
        let start_page = self.pages.len();
        let start_y = self.cursor;
        let title = self.run(
            section.title.clone(),
            margin,
            FontTreatment::Proportional,
            FontWeight::Bold,
            section.title_size,
            TITLE_GRAY,
        );
        self.push(Element::Text(title));
        self.cursor += self.layout.title_advance;

        let lines = wrap_text(
            &section.body,
            self.metrics,
            section.font,
            section.body_size,
            self.layout.text_width(),
        );
        let line_height = self.metrics.block_height(1, section.body_size);
        debug!(
            "Section '{}': {} lines, estimated {:.1}mm",
            section.title,
            lines.len(),
            self.metrics.block_height(lines.len(), section.body_size)
        );

        let line_count = lines.len();
        for line in lines {
            if self.cursor > self.layout.content_bottom {
                self.new_page();
            }
            let run = self.run(line, margin, section.font, FontWeight::Normal, section.body_size, BODY_GRAY);
            self.push(Element::Text(run));
            self.cursor += line_height;
        }
        self.cursor += self.layout.section_gap;

        let placement = SectionPlacement {
            title: section.title.clone(),
            start_page,
            start_y,
            end_page: self.pages.len(),
            line_count,
        };
        self.placements.push(placement.clone());
        placement
    }

    /// Full-width divider at the cursor.
    pub fn add_divider(&mut self) {
        let rule = RuleLine {
            x1: self.layout.margin,
            x2: self.layout.page_width - self.layout.margin,
            y: self.cursor,
            gray: DIVIDER_GRAY,
        };
        self.push(Element::Rule(rule));
        self.cursor += self.layout.divider_gap;
    }

    pub fn finish(self) -> (Vec<Page>, Vec<SectionPlacement>) {
        (self.pages, self.placements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> ApproximateMetrics {
        ApproximateMetrics::default()
    }

    #[test]
    fn courier_width_is_fixed() {
        let m = metrics();
        let w1 = m.text_width("iiii", FontTreatment::FixedWidth, 10.0);
        let w2 = m.text_width("MMMM", FontTreatment::FixedWidth, 10.0);
        assert!((w1 - w2).abs() < f32::EPSILON);
        // 4 × 0.6em × 10pt
        assert!((w1 - 24.0 * MM_PER_PT).abs() < 1e-4);
    }

    #[test]
    fn helvetica_width_varies() {
        let m = metrics();
        let narrow = m.text_width("iiii", FontTreatment::Proportional, 10.0);
        let wide = m.text_width("MMMM", FontTreatment::Proportional, 10.0);
        assert!(narrow < wide);
    }

    #[test]
    fn block_height_uses_ratio() {
        let m = metrics();
        assert!((m.block_height(3, 10.0) - 12.0).abs() < 1e-4);
        assert_eq!(m.block_height(0, 10.0), 0.0);
    }

    #[test]
    fn wrap_keeps_short_text_on_one_line() {
        let lines = wrap_text("hello world", &metrics(), FontTreatment::FixedWidth, 10.0, 180.0);
        assert_eq!(lines, vec!["hello world"]);
    }

    #[test]
    fn wrap_respects_hard_breaks() {
        let lines = wrap_text("a\n\nb\r\nc", &metrics(), FontTreatment::FixedWidth, 10.0, 180.0);
        assert_eq!(lines, vec!["a", "", "b", "c"]);
    }

    #[test]
    fn wrap_keeps_leading_indentation() {
        let lines = wrap_text(
            "Hi,\n    > quoted  line\n\tTabbed\n  ",
            &metrics(),
            FontTreatment::FixedWidth,
            10.0,
            180.0,
        );
        assert_eq!(lines, vec!["Hi,", "    > quoted  line", "    Tabbed", "  "]);
    }

    #[test]
    fn wrap_empty_is_one_empty_line() {
        let lines = wrap_text("", &metrics(), FontTreatment::Proportional, 11.0, 180.0);
        assert_eq!(lines, vec![String::new()]);
    }

    #[test]
    fn wrap_breaks_on_width() {
        // 10 courier chars at 10pt ≈ 21.2mm
        let width = metrics().text_width("0123456789", FontTreatment::FixedWidth, 10.0);
        let lines = wrap_text("aaaa bbbb cccc dddd", &metrics(), FontTreatment::FixedWidth, 10.0, width);
        assert_eq!(lines, vec!["aaaa bbbb", "cccc dddd"]);
    }

    #[test]
    fn wrap_cuts_long_words() {
        let width = metrics().text_width("01234", FontTreatment::FixedWidth, 10.0);
        let lines = wrap_text("abcdefghijkl", &metrics(), FontTreatment::FixedWidth, 10.0, width);
        assert_eq!(lines, vec!["abcde", "fghij", "kl"]);
    }

    #[test]
    fn section_breaks_page_past_threshold() {
        let m = metrics();
        let layout = ReportLayout::default();
        let mut writer = ReportWriter::new(layout.clone(), &m);
        writer.advance(layout.section_break_threshold + 1.0 - layout.top_margin);
        let section = Section {
            title: "Late".into(),
            body: "body".into(),
            font: FontTreatment::FixedWidth,
            title_size: 16.0,
            body_size: 10.0,
        };
        let placement = writer.add_section(&section);
        assert_eq!(placement.start_page, 2);
        assert_eq!(placement.start_y, layout.top_margin);
    }

    #[test]
    fn section_at_threshold_stays_on_page() {
        let m = metrics();
        let layout = ReportLayout::default();
        let mut writer = ReportWriter::new(layout.clone(), &m);
        writer.advance(layout.section_break_threshold - layout.top_margin);
        let section = Section {
            title: "Edge".into(),
            body: String::new(),
            font: FontTreatment::Proportional,
            title_size: 16.0,
            body_size: 11.0,
        };
        assert_eq!(writer.add_section(&section).start_page, 1);
    }

    #[test]
    fn layout_validation() {
        assert!(ReportLayout::default().validate().is_ok());
        let bad = ReportLayout {
            margin: 120.0,
            ..ReportLayout::default()
        };
        assert!(bad.validate().is_err());
    }
}
