// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Offline text transform used when no inference service is configured.

use penmark_core::error::{PenmarkError, Result};
use penmark_core::transform::{TextTransform, TransformMode};
use tracing::debug;

/// Passes handwriting text through unchanged and answers problems with a
/// fixed step outline.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTransform;

impl TextTransform for LocalTransform {
    fn transform(&self, input: &str, mode: TransformMode) -> Result<String> {
        if input.trim().is_empty() {
            let message = match mode {
                TransformMode::Handwriting => "Please enter some text to convert",
                TransformMode::Solve => "Please enter a mathematical problem",
            };
            return Err(PenmarkError::Service(message.into()));
        }

        debug!(?mode, input_len = input.len(), "local transform");
        Ok(match mode {
            TransformMode::Handwriting => input.to_string(),
            TransformMode::Solve => format!(
                "Solution for: {input}\n\n\
                 Step 1: Identify the problem type\n\
                 Step 2: Apply relevant formulas\n\
                 Step 3: Solve systematically\n\n\
                 [Detailed solution would appear here with proper mathematical notation]"
            ),
        })
    }
}
