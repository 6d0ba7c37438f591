// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — render a document plan using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: each page is a `PdfPage` holding a
// `Vec<Op>`, and the whole document is serialised via `PdfDocument::save()`.
// Plans measure `y` down from the top edge; PDF user space measures up from
// the bottom, so every line is flipped here.

use std::path::Path;

use penmark_core::error::{PenmarkError, Result};
use penmark_core::types::pt_to_mm;
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, TextItem,
};
use tracing::{debug, info, instrument, warn};

use crate::layout::{DocumentPlan, DrawInstruction, PageGeometry};

const DEFAULT_TITLE: &str = "Penmark Document";

/// Renders document plans with the built-in Helvetica font.
pub struct PdfWriter {
    geometry: PageGeometry,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: Option<String>,
}

impl PdfWriter {
    /// Create a writer for plans laid out with `geometry`.
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            title: None,
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.set_title(title);
        self
    }

    /// Paper dimensions in printpdf's Mm units.
    fn page_dimensions(&self) -> (Mm, Mm) {
        (
            Mm(pt_to_mm(self.geometry.page_width())),
            Mm(pt_to_mm(self.geometry.page_height())),
        )
    }

    /// PDF baseline for a line whose top sits `y` below the top edge.
    fn baseline(&self, y: f32) -> f32 {
        self.geometry.page_height() - y - self.geometry.font_size()
    }

    fn line_ops(&self, line: &DrawInstruction, ops: &mut Vec<Op>) {
        if line.text.is_empty() {
            return;
        }
        ops.push(Op::StartTextSection);
        ops.push(Op::SetTextCursor {
            pos: Point {
                x: Pt(line.x),
                y: Pt(self.baseline(line.y)),
            },
        });
        ops.push(Op::SetFontSizeBuiltinFont {
            size: Pt(self.geometry.font_size()),
            font: BuiltinFont::Helvetica,
        });
        ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(line.text.clone())],
            font: BuiltinFont::Helvetica,
        });
        ops.push(Op::EndTextSection);
    }

    /// Reject plans that cannot be drawn on this writer's pages.
    fn check_plan(&self, plan: &DocumentPlan) -> Result<()> {
        if plan.pages.is_empty() {
            return Err(PenmarkError::PdfError("document plan has no pages".into()));
        }
        let width = self.geometry.page_width();
        let height = self.geometry.page_height();
        let font_size = self.geometry.font_size();
        for (index, page) in plan.pages.iter().enumerate() {
            for line in &page.lines {
                let fits = line.x.is_finite()
                    && line.y.is_finite()
                    && line.x >= 0.0
                    && line.x < width
                    && line.y >= 0.0
                    && line.y + font_size <= height;
                if !fits {
                    return Err(PenmarkError::PdfError(format!(
                        "line at ({}, {}) on page {} lies outside the {width}x{height}pt page",
                        line.x,
                        line.y,
                        index + 1
                    )));
                }
            }
        }
        Ok(())
    }

    /// Render every page of `plan` and return the PDF bytes.
    ///
    /// Fails with `PdfError` when the plan has no pages or places a line off
    /// the page, or when serialisation produces no output.
    #[instrument(skip_all, fields(pages = plan.page_count()))]
    pub fn render(&self, plan: &DocumentPlan) -> Result<Vec<u8>> {
        self.check_plan(plan)?;
        let (page_w, page_h) = self.page_dimensions();
        let title = self.title.as_deref().unwrap_or(DEFAULT_TITLE);

        let mut doc = PdfDocument::new(title);
        let pages: Vec<PdfPage> = plan
            .pages
            .iter()
            .map(|page| {
                let mut ops = Vec::with_capacity(page.lines.len() * 5);
                for line in &page.lines {
                    self.line_ops(line, &mut ops);
                }
                PdfPage::new(page_w, page_h, ops)
            })
            .collect();
        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);

        if !warnings.is_empty() {
            warn!(count = warnings.len(), "printpdf reported warnings while saving");
        }
        if output.is_empty() {
            return Err(PenmarkError::PdfError("serialiser produced no output".into()));
        }
        debug!(
            bytes = output.len(),
            warnings = warnings.len(),
            title,
            "PDF rendered"
        );
        Ok(output)
    }

    /// Render `plan` and write it to `path`.
    pub fn write_to_file(&self, plan: &DocumentPlan, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.render(plan)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote PDF to {}", path.as_ref().display());
        Ok(())
    }
}
