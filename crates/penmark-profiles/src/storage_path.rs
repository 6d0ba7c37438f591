// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mapping between sample object paths and their public references.
//
// Upload stores a sample at `{owner}/{token}.{ext}` and keeps the public URL
// the blob store hands back. Delete has only that URL, so it locates the last
// `/{bucket}/` segment and takes everything after it as the object path.
// Object paths never contain a segment named after the bucket (upload rejects
// such owner ids), so the last marker is the one the store appended even when
// the store's own root or base URL also contains the bucket name.

use penmark_core::error::{PenmarkError, Result};
use penmark_core::types::{OwnerId, extension_for_content_type};

/// Object path for a new sample image.
pub fn sample_object_path(owner: &OwnerId, token: &str, content_type: &str) -> String {
    format!("{}/{}.{}", owner, token, extension_for_content_type(content_type))
}

/// Recover the object path from a public reference.
///
/// The last `/{bucket}/` segment before any query string or fragment marks
/// the storage root. Fails with `InvalidReference` when the marker is missing
/// or nothing follows it.
pub fn storage_path_from_ref(reference: &str, bucket: &str) -> Result<String> {
    if bucket.is_empty() {
        return Err(PenmarkError::InvalidReference("bucket name is empty".into()));
    }
    let marker = format!("/{bucket}/");
    let location = reference.split(['?', '#']).next().unwrap_or_default();
    let start = location.rfind(&marker).ok_or_else(|| {
        PenmarkError::InvalidReference(format!("'{reference}' has no '{marker}' segment"))
    })?;

    let path = &location[start + marker.len()..];

    if path.is_empty() {
        return Err(PenmarkError::InvalidReference(format!(
            "'{reference}' names no object after '{marker}'"
        )));
    }
    Ok(path.to_string())
}
