// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// GET /download/{download_id}/{filename}: single-use download of a
// compressed output.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use pdfpress_core::DownloadId;
use pdfpress_core::error::PdfpressError;
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::staging::sanitize_filename;
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn download(
    State(state): State<AppState>,
    Path((download_id, filename)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let not_found = || PdfpressError::NotFound(format!("{download_id}/{filename}"));

    let id = DownloadId::parse(&download_id).ok_or_else(not_found)?;
    let name = sanitize_filename(&filename);
    if name.is_empty() {
        return Err(not_found().into());
    }

    let bytes = state.staging.claim_output(id, &name).await?;
    info!(%id, bytes = bytes.len(), "download served");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{name}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
