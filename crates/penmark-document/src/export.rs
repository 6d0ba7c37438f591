// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export orchestration — compose titled and sectioned documents into page
// plans.
//
// Titles and section labels are placed as single lines without wrapping.
// Bodies go through the wrapping paginator. Every block shares one cursor, so
// a label can end a page while its body starts the next one.

use tracing::instrument;

use crate::layout::{DocumentPlan, HelveticaMetrics, PageGeometry, Paginator, TextMeasure};

/// Title used for exported problem solutions.
pub const SOLUTION_TITLE: &str = "Solution";
pub const PROBLEM_LABEL: &str = "Problem:";
pub const SOLUTION_LABEL: &str = "Solution:";

/// Optional title line followed by the wrapped body.
pub fn build_simple_document(
    title: Option<&str>,
    body: &str,
    geometry: &PageGeometry,
) -> DocumentPlan {
    build_simple_document_with(title, body, geometry, &HelveticaMetrics)
}

/// [`build_simple_document`] with a caller-supplied text measure.
#[instrument(skip_all, fields(body_len = body.len(), titled = title.is_some()))]
pub fn build_simple_document_with<M: TextMeasure + ?Sized>(
    title: Option<&str>,
    body: &str,
    geometry: &PageGeometry,
    measure: &M,
) -> DocumentPlan {
    let paginator = Paginator::new(*geometry, measure);
    let mut cursor = paginator.cursor();
    if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
        cursor.place_line(title);
    }
    cursor.place_wrapped(body);
    cursor.finish()
}

/// Title once at the top, then each section's label line and wrapped body,
/// in the order given.
pub fn build_labeled_document(
    title: &str,
    sections: &[(&str, &str)],
    geometry: &PageGeometry,
) -> DocumentPlan {
    build_labeled_document_with(title, sections, geometry, &HelveticaMetrics)
}

/// [`build_labeled_document`] with a caller-supplied text measure.
#[instrument(skip_all, fields(sections = sections.len()))]
pub fn build_labeled_document_with<M: TextMeasure + ?Sized>(
    title: &str,
    sections: &[(&str, &str)],
    geometry: &PageGeometry,
    measure: &M,
) -> DocumentPlan {
    let paginator = Paginator::new(*geometry, measure);
    let mut cursor = paginator.cursor();
    cursor.place_line(title);
    for (label, body) in sections {
        cursor.place_line(label);
        cursor.place_wrapped(body);
    }
    cursor.finish()
}

/// A solved problem: "Problem:" with the statement, then "Solution:" with
/// the worked answer.
pub fn build_solution_document(
    problem: &str,
    solution: &str,
    geometry: &PageGeometry,
) -> DocumentPlan {
    build_labeled_document(
        SOLUTION_TITLE,
        &[(PROBLEM_LABEL, problem), (SOLUTION_LABEL, solution)],
        geometry,
    )
}
