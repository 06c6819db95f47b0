// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP routes.

pub mod download;
pub mod meta;
pub mod upload;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Allowance for multipart boundaries, headers and the tier field on top of
/// the file itself. The per-field size check produces the user-facing error.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

/// Build the application router. Used by the binary and the tests.
pub fn app(state: AppState) -> Router {
    let body_limit = state
        .config
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    Router::new()
        .route("/", get(meta::index))
        .route("/health", get(meta::health))
        .route("/upload", post(upload::upload))
        .route("/download/:download_id/:filename", get(download::download))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
