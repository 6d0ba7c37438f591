// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text transform contract — the conversion / problem-solving service that
// produces the text handed to the export engine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PenmarkError, Result};

/// What the transform service is asked to do with its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformMode {
    /// Convert typed text for handwriting-style output.
    Handwriting,
    /// Produce a worked solution for a problem statement.
    Solve,
}

impl FromStr for TransformMode {
    type Err = PenmarkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "handwriting" => Ok(Self::Handwriting),
            "solve" => Ok(Self::Solve),
            other => Err(PenmarkError::Validation(format!(
                "unknown transform mode '{other}'"
            ))),
        }
    }
}

/// An external text transform service.
///
/// Implementations report failures as `PenmarkError::Service` with a message
/// that can be shown to the user as-is.
pub trait TextTransform {
    fn transform(&self, input: &str, mode: TransformMode) -> Result<String>;
}
