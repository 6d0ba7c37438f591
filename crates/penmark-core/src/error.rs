// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Penmark.

use std::fmt;

use thiserror::Error;

/// Top-level error type for all Penmark operations.
#[derive(Debug, Error)]
pub enum PenmarkError {
    // -- Input --
    /// Bad input. Raised before any side effect takes place.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    // -- Storage --
    /// Blob or record backend failure (transient and permanent alike).
    #[error("store error: {0}")]
    Store(String),

    /// A multi-step operation finished some steps but not all of them.
    #[error("{0}")]
    PartialFailure(Box<PartialFailure>),

    #[error("invalid storage reference: {0}")]
    InvalidReference(String),

    // -- Collaborators --
    #[error("text transform failed: {0}")]
    Service(String),

    // -- Documents --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PenmarkError {
    /// The partial-failure report, if this error carries one.
    pub fn partial(&self) -> Option<&PartialFailure> {
        match self {
            Self::PartialFailure(report) => Some(report),
            _ => None,
        }
    }
}

impl From<PartialFailure> for PenmarkError {
    fn from(report: PartialFailure) -> Self {
        Self::PartialFailure(Box::new(report))
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PenmarkError>;

// ---------------------------------------------------------------------------
// Partial failure reporting
// ---------------------------------------------------------------------------

/// Registry operations that span more than one remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upload,
    Activate,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Upload => "upload",
            Self::Activate => "activate",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Individual remote calls made by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    BlobWrite,
    RecordInsert,
    DeactivateAll,
    ActivateTarget,
    BlobDelete,
    RecordDelete,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BlobWrite => "blob write",
            Self::RecordInsert => "record insert",
            Self::DeactivateAll => "deactivate all",
            Self::ActivateTarget => "activate target",
            Self::BlobDelete => "blob delete",
            Self::RecordDelete => "record delete",
        };
        f.write_str(name)
    }
}

/// What a multi-step operation managed to do before one of its steps failed.
///
/// Completed steps are never rolled back. The report names the failed step
/// so a caller can retry just the remainder, and the orphaned blob path (if
/// any) so an operator can reclaim it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialFailure {
    pub operation: Operation,
    pub failed_step: Step,
    pub completed: Vec<Step>,
    /// Blob path left without a matching record, or left behind by a delete.
    pub orphaned_blob: Option<String>,
    /// Message of the underlying failure.
    pub cause: String,
}

impl PartialFailure {
    pub fn new(operation: Operation, failed_step: Step, cause: impl Into<String>) -> Self {
        Self {
            operation,
            failed_step,
            completed: Vec::new(),
            orphaned_blob: None,
            cause: cause.into(),
        }
    }

    pub fn completed(mut self, step: Step) -> Self {
        self.completed.push(step);
        self
    }

    pub fn orphaned_blob(mut self, path: impl Into<String>) -> Self {
        self.orphaned_blob = Some(path.into());
        self
    }
}

impl fmt::Display for PartialFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} incomplete: {} failed", self.operation, self.failed_step)?;
        if !self.completed.is_empty() {
            let done: Vec<String> = self.completed.iter().map(Step::to_string).collect();
            write!(f, " after {}", done.join(", "))?;
        }
        if let Some(ref path) = self.orphaned_blob {
            write!(f, " (orphaned blob: {path})")?;
        }
        write!(f, ": {}", self.cause)
    }
}
