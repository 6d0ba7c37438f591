// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory resolution.

use std::path::{Path, PathBuf};

use penmark_core::error::Result;

/// Resolve the application data directory and create it if needed.
///
/// An explicit override wins; otherwise `$XDG_DATA_HOME/penmark`, then
/// `$HOME/.local/share/penmark`.
pub fn data_dir(override_dir: Option<&Path>) -> Result<PathBuf> {
    let dir = match override_dir {
        Some(dir) => dir.to_path_buf(),
        None => default_base().join("penmark"),
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Return a subdirectory inside the data dir (e.g. "blobs"), creating it.
pub fn data_subdir(data_dir: &Path, name: &str) -> Result<PathBuf> {
    let dir = data_dir.join(name);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn default_base() -> PathBuf {
    // Try XDG data dir, then fallback to home
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg);
    }
    if let Some(home) = std::env::var_os("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    // Last resort
    std::env::temp_dir()
}
