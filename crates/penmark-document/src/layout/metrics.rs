// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text measurement for line wrapping.

/// Measures the rendered width of a run of text.
pub trait TextMeasure {
    /// Width of `text` at `font_size`, in the same unit as `font_size`.
    fn width(&self, text: &str, font_size: f32) -> f32;
}

/// Advance widths of the built-in Helvetica font (1/1000 em), indexed from
/// U+0020 through U+007E.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Width used for characters outside the table.
const HELVETICA_FALLBACK: u16 = 556;

/// Helvetica advance widths, matching what the PDF writer draws with.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelveticaMetrics;

impl HelveticaMetrics {
    fn glyph_units(c: char) -> u16 {
        let code = c as u32;
        if (0x20..=0x7E).contains(&code) {
            HELVETICA_WIDTHS[(code - 0x20) as usize]
        } else {
            HELVETICA_FALLBACK
        }
    }
}

impl TextMeasure for HelveticaMetrics {
    fn width(&self, text: &str, font_size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| Self::glyph_units(c) as u32).sum();
        units as f32 * font_size / 1000.0
    }
}

/// Every character is `ratio` em wide.
#[derive(Debug, Clone, Copy)]
pub struct AverageGlyphWidth {
    pub ratio: f32,
}

impl Default for AverageGlyphWidth {
    fn default() -> Self {
        Self { ratio: 0.5 }
    }
}

impl TextMeasure for AverageGlyphWidth {
    fn width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * self.ratio * font_size
    }
}
