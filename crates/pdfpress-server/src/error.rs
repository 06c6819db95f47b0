// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP error responses: `{ "error": message }` with the status class chosen
// by `humanize_error`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pdfpress_core::PdfpressError;
use pdfpress_core::human_errors::{Severity, humanize_error};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler error wrapper so `?` works on `PdfpressError` in handlers.
#[derive(Debug)]
pub struct ApiError(pub PdfpressError);

impl From<PdfpressError> for ApiError {
    fn from(err: PdfpressError) -> Self {
        Self(err)
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Self(PdfpressError::Io(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let human = humanize_error(&self.0);
        match human.severity {
            Severity::Internal => error!(error = %self.0, "request failed"),
            Severity::BadRequest | Severity::NotFound => warn!(error = %self.0, "request rejected"),
        }
        let status = StatusCode::from_u16(human.severity.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse { error: human.message })).into_response()
    }
}
