// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Blob store — object upload, delete, and public URL issuance.
//
// Objects live under `{root}/{bucket}/{path}`. Public references have the
// form `{base}/{bucket}/{path}`, so the bucket segment doubles as the marker
// used to turn a reference back into a storage path.

use std::path::{Path, PathBuf};

use penmark_core::error::{PenmarkError, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

/// Object storage used for handwriting sample images.
pub trait BlobStore {
    /// Store `bytes` at a new object `path` and return the object's public
    /// reference. Fails if an object already exists at `path`.
    fn put(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<String>;

    /// Remove the object at `path`. Removing a missing object succeeds.
    fn delete(&self, path: &str) -> Result<()>;

    /// Public reference for an object path.
    fn public_url(&self, path: &str) -> String;
}

/// SHA-256 of `data` as a lowercase hex string.
pub fn content_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Reject paths that could escape the bucket directory.
fn validate_object_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(PenmarkError::Store("empty object path".into()));
    }
    if path.starts_with('/') || path.contains('\\') {
        return Err(PenmarkError::Store(format!("object path must be relative: {path}")));
    }
    if path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(PenmarkError::Store(format!("malformed object path: {path}")));
    }
    Ok(())
}

fn io_err(context: &str, e: std::io::Error) -> PenmarkError {
    PenmarkError::Store(format!("{context}: {e}"))
}

/// Blob store backed by a directory tree on the local filesystem.
pub struct FsBlobStore {
    /// Canonical directory holding one subdirectory per bucket.
    root: PathBuf,
    bucket: String,
    /// Overrides the `file://` URLs issued by default.
    public_base_url: Option<String>,
}

impl FsBlobStore {
    /// Open (or create) the bucket directory under `root`.
    #[instrument(skip_all, fields(root = %root.as_ref().display(), bucket = %bucket))]
    pub fn open(root: impl AsRef<Path>, bucket: &str) -> Result<Self> {
        if bucket.is_empty() || bucket.contains('/') {
            return Err(PenmarkError::Store(format!("invalid bucket name: '{bucket}'")));
        }
        let bucket_dir = root.as_ref().join(bucket);
        std::fs::create_dir_all(&bucket_dir).map_err(|e| io_err("create bucket", e))?;
        let root = std::fs::canonicalize(root.as_ref()).map_err(|e| io_err("resolve root", e))?;

        info!("blob store opened");
        Ok(Self {
            root,
            bucket: bucket.to_string(),
            public_base_url: None,
        })
    }

    /// Issue `{base}/{bucket}/{path}` references instead of `file://` URLs.
    pub fn with_public_base_url(mut self, base: impl Into<String>) -> Self {
        self.public_base_url = Some(base.into());
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Filesystem location of an object.
    pub fn object_path(&self, path: &str) -> Result<PathBuf> {
        validate_object_path(path)?;
        Ok(self.root.join(&self.bucket).join(path))
    }

    /// Whether an object exists at `path`.
    pub fn exists(&self, path: &str) -> bool {
        self.object_path(path).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Read an object back.
    pub fn get(&self, path: &str) -> Result<Vec<u8>> {
        let file = self.object_path(path)?;
        std::fs::read(&file).map_err(|e| io_err("read object", e))
    }
}

impl BlobStore for FsBlobStore {
    #[instrument(skip(self, bytes), fields(bytes_len = bytes.len()))]
    fn put(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<String> {
        let target = self.object_path(path)?;
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err("create object dir", e))?;
        }

        if target.exists() {
            return Err(PenmarkError::Store(format!("object already exists: {path}")));
        }

        // Write beside the target and rename so readers never see a torn file.
        let staging = target.with_extension("partial");
        std::fs::write(&staging, bytes).map_err(|e| io_err("write object", e))?;
        std::fs::rename(&staging, &target).map_err(|e| io_err("commit object", e))?;

        let digest = content_digest(bytes);
        debug!(%digest, content_type, "object stored");
        Ok(self.public_url(path))
    }

    #[instrument(skip(self))]
    fn delete(&self, path: &str) -> Result<()> {
        let target = self.object_path(path)?;
        match std::fs::remove_file(&target) {
            Ok(()) => {
                debug!("object removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("object already absent");
                Ok(())
            }
            Err(e) => Err(io_err("remove object", e)),
        }
    }

    fn public_url(&self, path: &str) -> String {
        match self.public_base_url {
            Some(ref base) => format!("{}/{}/{}", base.trim_end_matches('/'), self.bucket, path),
            None => format!("file://{}/{}/{}", self.root.display(), self.bucket, path),
        }
    }
}
