// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// penmark-document — Paginated document export for Penmark.
//
// Wraps text against measured glyph widths, lays the lines out over
// fixed-size pages, composes titled and sectioned documents from those
// layouts, and renders the result to PDF.

pub mod export;
pub mod layout;
pub mod pdf;

pub use export::{
    build_labeled_document, build_labeled_document_with, build_simple_document,
    build_simple_document_with, build_solution_document,
};
pub use layout::{DocumentPlan, DrawInstruction, Page, PageGeometry, Paginator};
pub use pdf::PdfWriter;
