// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use serde::{Deserialize, Serialize};

/// Default upper bound on a handwriting sample image (5 MiB).
pub const DEFAULT_MAX_SAMPLE_BYTES: usize = 5 * 1024 * 1024;

/// Default blob bucket for handwriting samples.
pub const DEFAULT_BUCKET: &str = "handwriting-samples";

/// How the file name of an uploaded sample is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobNaming {
    /// Wall-clock milliseconds. Two uploads by one owner in the same
    /// millisecond map to the same path.
    #[default]
    Timestamp,
    /// Random UUID v4.
    Random,
}

/// Persistent application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Paper size for exported documents.
    pub paper_size: crate::PaperSize,
    /// Page margin on every side, in millimetres.
    pub margin_mm: f32,
    /// Font size used both for measuring and drawing text, in points.
    pub font_size_pt: f32,
    /// Vertical advance between lines, in points.
    pub line_height_pt: f32,
    /// Blob bucket that holds sample images. Also the marker segment used
    /// to turn a public URL back into a storage path.
    pub storage_bucket: String,
    /// Base URL prepended to `{bucket}/{path}` for public references.
    /// When unset the filesystem store issues `file://` URLs.
    pub public_base_url: Option<String>,
    /// Largest accepted sample image, in bytes.
    pub max_sample_bytes: usize,
    /// Naming policy for uploaded sample blobs.
    pub blob_naming: BlobNaming,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paper_size: crate::PaperSize::A4,
            margin_mm: 20.0,
            font_size_pt: 12.0,
            line_height_pt: 16.0,
            storage_bucket: DEFAULT_BUCKET.to_string(),
            public_base_url: None,
            max_sample_bytes: DEFAULT_MAX_SAMPLE_BYTES,
            blob_naming: BlobNaming::Timestamp,
        }
    }
}
