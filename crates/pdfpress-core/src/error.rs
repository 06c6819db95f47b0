// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for pdfpress.

use thiserror::Error;

/// Top-level error type for all pdfpress operations.
#[derive(Debug, Error)]
pub enum PdfpressError {
    // -- Request validation --
    #[error("{0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    // -- Document errors --
    #[error("input is not a readable PDF: {0}")]
    Parse(String),

    #[error("page rasterisation failed: {0}")]
    Render(String),

    #[error("stream recompression failed: {0}")]
    Recompress(String),

    #[error("image processing failed: {0}")]
    Image(String),

    /// Every available strategy failed; carries the per-strategy summary.
    #[error("all compression strategies failed: {0}")]
    Compression(String),

    #[error("compression cancelled")]
    Cancelled,

    // -- Process setup --
    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PdfpressError {
    /// Whether this error is local to one compression strategy and therefore
    /// recoverable by falling back to the next one.
    pub fn is_strategy_local(&self) -> bool {
        matches!(
            self,
            Self::Render(_) | Self::Recompress(_) | Self::Image(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PdfpressError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_local_errors_are_recoverable() {
        assert!(PdfpressError::Render("page 3".into()).is_strategy_local());
        assert!(PdfpressError::Recompress("bad xref".into()).is_strategy_local());
        assert!(!PdfpressError::Parse("not a pdf".into()).is_strategy_local());
        assert!(!PdfpressError::Cancelled.is_strategy_local());
    }

    #[test]
    fn validation_message_is_passed_through_verbatim() {
        let err = PdfpressError::Validation("Only PDF files are allowed".into());
        assert_eq!(err.to_string(), "Only PDF files are allowed");
    }
}
