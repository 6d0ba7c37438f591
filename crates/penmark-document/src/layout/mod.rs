// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout module — text measurement, word wrap, and pagination.

pub mod metrics;
pub mod paginator;
pub mod wrap;

pub use metrics::{AverageGlyphWidth, HelveticaMetrics, TextMeasure};
pub use paginator::{DocumentPlan, DrawInstruction, Page, PageCursor, PageGeometry, Paginator};
pub use wrap::wrap_text;
