// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Paginator — places wrapped lines onto fixed-size pages.
//
// All lengths are PostScript points. `y` is the top of a line measured down
// from the top edge of the page; the PDF writer flips it.

use penmark_core::AppConfig;
use penmark_core::error::{PenmarkError, Result};
use penmark_core::types::{PaperSize, mm_to_pt};
use tracing::debug;

use super::metrics::TextMeasure;
use super::wrap::wrap_text;

/// Page size, margins, and line metrics for a layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    page_width: f32,
    page_height: f32,
    margin: f32,
    line_height: f32,
    font_size: f32,
}

impl PageGeometry {
    /// Validate and build a geometry. Every value must be finite. The margin
    /// may be zero, everything else must be positive, and the margins must
    /// leave room on both axes.
    pub fn new(
        page_width: f32,
        page_height: f32,
        margin: f32,
        line_height: f32,
        font_size: f32,
    ) -> Result<Self> {
        let values = [
            ("page width", page_width),
            ("page height", page_height),
            ("line height", line_height),
            ("font size", font_size),
        ];
        for (label, value) in values {
            if !value.is_finite() || value <= 0.0 {
                return Err(PenmarkError::Validation(format!(
                    "{label} must be a positive number, got {value}"
                )));
            }
        }
        if !margin.is_finite() || margin < 0.0 {
            return Err(PenmarkError::Validation(format!(
                "margin must be zero or a positive number, got {margin}"
            )));
        }
        if page_width - 2.0 * margin <= 0.0 {
            return Err(PenmarkError::Validation(format!(
                "margin {margin}pt leaves no usable width on a {page_width}pt page"
            )));
        }
        if page_height - 2.0 * margin <= 0.0 {
            return Err(PenmarkError::Validation(format!(
                "margin {margin}pt leaves no usable height on a {page_height}pt page"
            )));
        }
        Ok(Self {
            page_width,
            page_height,
            margin,
            line_height,
            font_size,
        })
    }

    /// Geometry for a paper size, with the margin given in millimetres.
    pub fn from_paper(
        paper: PaperSize,
        margin_mm: f32,
        line_height: f32,
        font_size: f32,
    ) -> Result<Self> {
        let (width, height) = paper.dimensions_pt();
        Self::new(width, height, mm_to_pt(margin_mm), line_height, font_size)
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::from_paper(
            config.paper_size,
            config.margin_mm,
            config.line_height_pt,
            config.font_size_pt,
        )
    }

    pub fn page_width(&self) -> f32 {
        self.page_width
    }

    pub fn page_height(&self) -> f32 {
        self.page_height
    }

    pub fn margin(&self) -> f32 {
        self.margin
    }

    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn usable_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    /// Lowest `y` a line may end at.
    fn bottom_limit(&self) -> f32 {
        self.page_height - self.margin
    }
}

/// A line of text placed at a position on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawInstruction {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub lines: Vec<DrawInstruction>,
}

impl Page {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Pages of draw instructions ready for rendering. Always has at least one
/// page.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPlan {
    pub pages: Vec<Page>,
}

impl DocumentPlan {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every placed line in reading order.
    pub fn lines(&self) -> impl Iterator<Item = &DrawInstruction> {
        self.pages.iter().flat_map(|page| page.lines.iter())
    }
}

/// Lays text out over pages of a fixed geometry.
pub struct Paginator<'m, M: TextMeasure + ?Sized> {
    geometry: PageGeometry,
    measure: &'m M,
}

impl<'m, M: TextMeasure + ?Sized> Paginator<'m, M> {
    pub fn new(geometry: PageGeometry, measure: &'m M) -> Self {
        Self { geometry, measure }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Wrap and paginate a single block of text.
    pub fn paginate(&self, text: &str) -> DocumentPlan {
        let mut cursor = self.cursor();
        cursor.place_wrapped(text);
        cursor.finish()
    }

    /// Start an empty layout. Blocks placed through one cursor share page
    /// and position state.
    pub fn cursor(&self) -> PageCursor<'_, 'm, M> {
        PageCursor {
            paginator: self,
            pages: Vec::new(),
            current: Page::default(),
        }
    }
}

/// Position within a layout in progress.
pub struct PageCursor<'p, 'm, M: TextMeasure + ?Sized> {
    paginator: &'p Paginator<'m, M>,
    pages: Vec<Page>,
    current: Page,
}

impl<M: TextMeasure + ?Sized> PageCursor<'_, '_, M> {
    /// Place one line as-is, without measuring or wrapping it.
    pub fn place_line(&mut self, text: &str) {
        let geometry = self.paginator.geometry;
        if !self.current.is_empty()
            && self.next_y() + geometry.line_height > geometry.bottom_limit()
        {
            self.pages.push(std::mem::take(&mut self.current));
        }
        let y = self.next_y();
        self.current.lines.push(DrawInstruction {
            text: text.to_string(),
            x: geometry.margin,
            y,
        });
    }

    /// Wrap `text` to the usable width and place each resulting line.
    pub fn place_wrapped(&mut self, text: &str) {
        let geometry = self.paginator.geometry;
        let lines = wrap_text(
            text,
            geometry.usable_width(),
            geometry.font_size,
            self.paginator.measure,
        );
        for line in &lines {
            self.place_line(line);
        }
    }

    /// Close the layout.
    pub fn finish(mut self) -> DocumentPlan {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        debug!(
            pages = self.pages.len(),
            lines = self.pages.iter().map(|p| p.lines.len()).sum::<usize>(),
            "layout complete"
        );
        DocumentPlan { pages: self.pages }
    }

    /// `y` of the next line on the current page. Derived from the line
    /// count so positions do not drift over long pages.
    fn next_y(&self) -> f32 {
        let geometry = &self.paginator.geometry;
        geometry.margin + self.current.lines.len() as f32 * geometry.line_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::metrics::{AverageGlyphWidth, HelveticaMetrics};

    fn small_geometry() -> PageGeometry {
        PageGeometry::new(200.0, 300.0, 20.0, 10.0, 10.0).unwrap()
    }

    #[test]
    fn thirty_lines_split_twenty_six_and_four() {
        let text = (1..=30).map(|i| format!("line{i}")).collect::<Vec<_>>().join("\n");
        let measure = AverageGlyphWidth::default();
        let plan = Paginator::new(small_geometry(), &measure).paginate(&text);

        assert_eq!(plan.page_count(), 2);
        assert_eq!(plan.pages[0].lines.len(), 26);
        assert_eq!(plan.pages[1].lines.len(), 4);
        assert_eq!(plan.pages[0].lines[25].y, 270.0);
        assert_eq!(plan.pages[1].lines[0].text, "line27");
        assert_eq!(plan.pages[1].lines[0].y, 20.0);
        assert!(plan.lines().all(|l| l.x == 20.0));
    }

    #[test]
    fn paginating_twice_is_identical() {
        let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(80);
        let geometry = PageGeometry::from_paper(PaperSize::A5, 15.0, 14.0, 11.0).unwrap();
        let paginator = Paginator::new(geometry, &HelveticaMetrics);
        assert_eq!(paginator.paginate(&text), paginator.paginate(&text));
    }

    #[test]
    fn empty_text_is_one_empty_line_on_one_page() {
        let measure = AverageGlyphWidth::default();
        let plan = Paginator::new(small_geometry(), &measure).paginate("");
        assert_eq!(plan.page_count(), 1);
        assert_eq!(plan.pages[0].lines.len(), 1);
        assert_eq!(plan.pages[0].lines[0].text, "");
    }

    #[test]
    fn finishing_untouched_cursor_gives_one_blank_page() {
        let measure = AverageGlyphWidth::default();
        let paginator = Paginator::new(small_geometry(), &measure);
        let plan = paginator.cursor().finish();
        assert_eq!(plan.page_count(), 1);
        assert!(plan.pages[0].is_empty());
    }

    #[test]
    fn oversized_token_occupies_its_own_line() {
        // Usable width 160pt at 5pt per char fits 32 chars.
        let token = "x".repeat(100);
        let text = format!("before {token} after");
        let measure = AverageGlyphWidth::default();
        let plan = Paginator::new(small_geometry(), &measure).paginate(&text);

        let texts: Vec<&str> = plan.lines().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["before", token.as_str(), "after"]);
    }

    #[test]
    fn line_taller_than_page_still_progresses() {
        let geometry = PageGeometry::new(200.0, 100.0, 20.0, 80.0, 10.0).unwrap();
        let measure = AverageGlyphWidth::default();
        let plan = Paginator::new(geometry, &measure).paginate("a\nb\nc");
        assert_eq!(plan.page_count(), 3);
        assert!(plan.pages.iter().all(|p| p.lines.len() == 1));
    }

    #[test]
    fn cursor_state_carries_across_blocks() {
        let measure = AverageGlyphWidth::default();
        let paginator = Paginator::new(small_geometry(), &measure);
        let mut cursor = paginator.cursor();
        for i in 0..25 {
            cursor.place_line(&format!("l{i}"));
        }
        cursor.place_line("heading");
        cursor.place_wrapped("body");
        let plan = cursor.finish();

        assert_eq!(plan.pages[0].lines.last().unwrap().text, "heading");
        assert_eq!(plan.pages[1].lines[0].text, "body");
    }

    #[test]
    fn rejects_unusable_geometry() {
        for (w, h, m, lh, fs) in [
            (0.0, 300.0, 20.0, 10.0, 10.0),
            (200.0, 300.0, 100.0, 10.0, 10.0),
            (200.0, 40.0, 20.0, 10.0, 10.0),
            (200.0, 300.0, -5.0, 10.0, 10.0),
            (200.0, 300.0, f32::NAN, 10.0, 10.0),
            (200.0, 300.0, 20.0, -1.0, 10.0),
            (200.0, 300.0, 20.0, 10.0, f32::NAN),
            (f32::INFINITY, 300.0, 20.0, 10.0, 10.0),
        ] {
            assert!(
                matches!(
                    PageGeometry::new(w, h, m, lh, fs),
                    Err(PenmarkError::Validation(_))
                ),
                "({w}, {h}, {m}, {lh}, {fs}) should be rejected"
            );
        }
    }

    #[test]
    fn zero_margin_uses_the_whole_page() {
        let geometry = PageGeometry::new(200.0, 300.0, 0.0, 10.0, 10.0).unwrap();
        assert_eq!(geometry.usable_width(), 200.0);

        let text = (1..=31).map(|i| format!("line{i}")).collect::<Vec<_>>().join("\n");
        let measure = AverageGlyphWidth::default();
        let plan = Paginator::new(geometry, &measure).paginate(&text);

        assert_eq!(plan.page_count(), 2);
        assert_eq!(plan.pages[0].lines.len(), 30);
        assert_eq!((plan.pages[0].lines[0].x, plan.pages[0].lines[0].y), (0.0, 0.0));
        assert_eq!(plan.pages[0].lines[29].y, 290.0);
        assert_eq!(plan.pages[1].lines[0].text, "line31");
    }

    #[test]
    fn default_config_geometry_is_valid() {
        let geometry = PageGeometry::from_config(&AppConfig::default()).unwrap();
        assert!((geometry.page_width() - 595.28).abs() < 0.01);
        assert!(geometry.usable_width() > 0.0);
    }
}
