// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// User-facing error messages.
//
// Every error that can reach the HTTP boundary is mapped to the message shown
// in the JSON `error` field and to the class of HTTP status it produces.

use crate::error::PdfpressError;

/// How the boundary should report an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The request itself was wrong (400).
    BadRequest,
    /// The thing asked for does not exist (404).
    NotFound,
    /// The service could not do its job (500).
    Internal,
}

impl Severity {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::Internal => 500,
        }
    }
}

/// A user-facing error message and its severity.
#[derive(Debug, Clone)]
pub struct HumanError {
    pub message: String,
    pub severity: Severity,
}

/// Convert a `PdfpressError` into the message and status class clients see.
pub fn humanize_error(err: &PdfpressError) -> HumanError {
    match err {
        PdfpressError::Validation(detail) => HumanError {
            message: detail.clone(),
            severity: Severity::BadRequest,
        },

        PdfpressError::NotFound(_) => HumanError {
            message: "File not found".into(),
            severity: Severity::NotFound,
        },

        PdfpressError::Parse(detail) => HumanError {
            message: format!("Error compressing PDF: the file could not be read as a PDF ({detail})"),
            severity: Severity::Internal,
        },

        PdfpressError::Compression(detail) => HumanError {
            message: format!("Error compressing PDF: {detail}"),
            severity: Severity::Internal,
        },

        // Strategy-local failures are normally swallowed by the orchestrator;
        // reaching here means one escaped on its own.
        PdfpressError::Render(detail)
        | PdfpressError::Recompress(detail)
        | PdfpressError::Image(detail) => HumanError {
            message: format!("Error compressing PDF: {detail}"),
            severity: Severity::Internal,
        },

        PdfpressError::Cancelled => HumanError {
            message: "Compression was cancelled".into(),
            severity: Severity::Internal,
        },

        PdfpressError::Config(detail) => HumanError {
            message: format!("Server misconfigured: {detail}"),
            severity: Severity::Internal,
        },

        PdfpressError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "File not found".into(),
                    severity: Severity::NotFound,
                }
            } else {
                HumanError {
                    message: format!("Storage error: {io_err}"),
                    severity: Severity::Internal,
                }
            }
        }

        PdfpressError::Serialization(e) => HumanError {
            message: format!("Internal data error: {e}"),
            severity: Severity::Internal,
        },
    }
}
