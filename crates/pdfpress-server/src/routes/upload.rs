// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// POST /upload: validate and stage the multipart upload, run the strategy
// chain off the async runtime, stage the output for download.

use axum::Json;
use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use pdfpress_core::error::PdfpressError;
use pdfpress_core::{CancelFlag, CompressionTier, DownloadId, StrategyKind};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use crate::error::ApiError;
use crate::staging::{StagedFile, compressed_filename, has_pdf_extension, upload_filename};
use crate::state::AppState;

/// Successful upload response.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub compressed_filename: String,
    pub download_id: String,
    /// Percent saved, rounded to two decimals. Negative if the output grew.
    pub compression_ratio: f64,
    pub original_size: u64,
    pub compressed_size: u64,
    pub strategy_used: StrategyKind,
}

/// The `file` field, written to staging.
struct StagedUpload {
    file: StagedFile,
    filename: String,
    size: u64,
}

#[instrument(skip_all, fields(download_id = tracing::field::Empty))]
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let download_id = DownloadId::new();
    tracing::Span::current().record("download_id", tracing::field::display(download_id));

    let mut tier = state.config.default_tier;
    let mut upload: Option<StagedUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(invalid_form)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") if upload.is_none() => {
                upload = Some(stage_file(&state, download_id, field).await?);
            }
            // Only the first `file` part counts; later ones would share its
            // staging path.
            Some("file") => debug!("ignoring repeated file field"),
            Some("compression_level") => {
                let raw = field.text().await.map_err(invalid_form)?;
                if !raw.trim().is_empty() {
                    tier = raw.parse::<CompressionTier>()?;
                }
            }
            other => debug!(field = ?other, "ignoring form field"),
        }
    }

    let upload = upload.ok_or_else(|| validation("No file selected"))?;
    if upload.size == 0 {
        return Err(validation("The uploaded file is empty").into());
    }
    info!(
        filename = %upload.filename,
        bytes = upload.size,
        tier = %tier,
        "upload staged"
    );

    let input = tokio::fs::read(upload.file.path()).await?;

    // Dropping this handler (client disconnect) trips the flag through the
    // guard; the blocking run checks it between strategies and pages.
    let cancel = CancelFlag::new();
    let guard = cancel.guard();
    let orchestrator = state.orchestrator.clone();
    let outcome = tokio::task::spawn_blocking(move || orchestrator.run(input, tier, &cancel))
        .await
        .map_err(|err| PdfpressError::Compression(format!("compression task failed: {err}")))??;
    guard.disarm();

    let output_name = compressed_filename(&upload.filename);
    let output = state.staging.stage_output(download_id, &output_name);
    tokio::fs::write(output.path(), &outcome.output).await?;
    output.keep();

    let result = outcome.result;
    info!(
        strategy = %result.strategy_used,
        ratio = result.ratio_percent,
        compressed_bytes = result.compressed_size_bytes,
        "upload compressed"
    );

    // `upload.file` drops here and removes the staged input.
    Ok(Json(UploadResponse {
        success: true,
        compressed_filename: output_name,
        download_id: download_id.to_string(),
        compression_ratio: round2(result.ratio_percent),
        original_size: result.original_size_bytes,
        compressed_size: result.compressed_size_bytes,
        strategy_used: result.strategy_used,
    }))
}

/// Validate the `file` field's name and stream its body to staging,
/// enforcing the size limit as bytes arrive.
async fn stage_file(
    state: &AppState,
    download_id: DownloadId,
    mut field: Field<'_>,
) -> Result<StagedUpload, ApiError> {
    let raw_name = field.file_name().unwrap_or_default().to_string();
    if raw_name.is_empty() {
        return Err(validation("No file selected").into());
    }
    if !has_pdf_extension(&raw_name) {
        return Err(validation("Only PDF files are allowed").into());
    }

    let filename = upload_filename(&raw_name);
    let staged = state.staging.stage_upload(download_id, &filename);
    let mut file = tokio::fs::File::create(staged.path()).await?;
    let limit = state.config.max_upload_bytes;
    let mut size: u64 = 0;

    while let Some(chunk) = field.chunk().await.map_err(invalid_form)? {
        size += chunk.len() as u64;
        if size > limit {
            return Err(validation(&format!(
                "File size must be less than {}MB.",
                state.config.max_upload_mib()
            ))
            .into());
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    Ok(StagedUpload {
        file: staged,
        filename,
        size,
    })
}

fn validation(message: &str) -> PdfpressError {
    PdfpressError::Validation(message.to_string())
}

fn invalid_form(err: axum::extract::multipart::MultipartError) -> PdfpressError {
    PdfpressError::Validation(format!("Invalid upload: {}", err.body_text()))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_rounds_to_two_places() {
        assert_eq!(round2(42.3456), 42.35);
        assert_eq!(round2(-7.12345), -7.12);
    }
}
