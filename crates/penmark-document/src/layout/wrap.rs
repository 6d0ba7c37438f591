// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Greedy word wrap against measured widths.

use super::metrics::TextMeasure;

/// Wrap `text` so no line measures wider than `max_width`.
///
/// Each `\n` starts a new paragraph and an empty paragraph produces an empty
/// line. Words are separated by single spaces in the output. A word that is
/// wider than `max_width` on its own gets a line to itself and is never
/// split.
pub fn wrap_text<M: TextMeasure + ?Sized>(
    text: &str,
    max_width: f32,
    font_size: f32,
    measure: &M,
) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut words = paragraph.split_whitespace();
        let Some(first) = words.next() else {
            lines.push(String::new());
            continue;
        };

        let mut current = first.to_string();
        for word in words {
            let candidate_width = measure.width(&current, font_size)
                + measure.width(" ", font_size)
                + measure.width(word, font_size);
            if candidate_width <= max_width {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        lines.push(current);
    }

    lines
}
