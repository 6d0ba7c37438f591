// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to a short message with an actionable
// suggestion. Partial failures stay failures: they get their own severity so
// the caller never mistakes them for success.

use crate::error::{Operation, PartialFailure, PenmarkError, Step};

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Backend blip. Trying again is likely to work.
    Transient,
    /// The user must change their input.
    ActionRequired,
    /// Retrying will not help.
    Permanent,
    /// Some steps completed; the remainder needs a retry or operator cleanup.
    Incomplete,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    /// Whether retrying the same call makes sense.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `PenmarkError` into a `HumanError`.
pub fn humanize_error(err: &PenmarkError) -> HumanError {
    match err {
        PenmarkError::Validation(detail) => HumanError {
            message: "Some of the details you entered aren't valid.".into(),
            suggestion: format!("Fix the following and try again: {detail}"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PenmarkError::NotFound(_) => HumanError {
            message: "That handwriting profile doesn't exist.".into(),
            suggestion: "It may already have been deleted. Refresh your profile list.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PenmarkError::Store(_) => HumanError {
            message: "Storage is unavailable right now.".into(),
            suggestion: "Nothing was changed. Try again in a moment.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        PenmarkError::PartialFailure(report) => humanize_partial(report),

        PenmarkError::InvalidReference(_) => HumanError {
            message: "The stored image link for this profile is malformed.".into(),
            suggestion: "The image file has to be removed by an operator.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        PenmarkError::Service(detail) => HumanError {
            message: detail.clone(),
            suggestion: "Check your input and try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        PenmarkError::PdfError(_) => HumanError {
            message: "The PDF couldn't be created.".into(),
            suggestion: "Try exporting again. If it keeps failing, shorten the document.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        PenmarkError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "Check the path and try again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "Penmark doesn't have permission to use that file.".into(),
                    suggestion: "Check the file permissions or choose another location.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. Your disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        PenmarkError::Serialization(_) => HumanError {
            message: "Penmark had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}

fn humanize_partial(report: &PartialFailure) -> HumanError {
    let (message, suggestion) = match (report.operation, report.failed_step) {
        (Operation::Upload, _) => (
            "The image was stored but the profile wasn't saved.",
            "Upload the sample again. The stray image will be cleaned up separately.",
        ),
        (Operation::Activate, _) => (
            "No handwriting profile is active right now.",
            "Choose \"set as active\" again to finish switching profiles.",
        ),
        (Operation::Delete, Step::RecordDelete) => (
            "The image was removed but the profile is still listed.",
            "Delete the profile again to finish removing it.",
        ),
        (Operation::Delete, _) => (
            "The profile was deleted but its image couldn't be removed.",
            "No action is needed from you; the image will be cleaned up separately.",
        ),
    };
    HumanError {
        message: message.into(),
        suggestion: suggestion.into(),
        retriable: report.failed_step != Step::BlobDelete,
        severity: Severity::Incomplete,
    }
}
