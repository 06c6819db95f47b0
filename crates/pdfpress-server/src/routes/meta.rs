// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Liveness and service descriptor endpoints.

use axum::Json;
use axum::extract::State;
use pdfpress_core::{CompressionTier, StrategyKind};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Endpoints {
    pub health: String,
    pub upload: String,
    pub download: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub message: String,
    pub status: String,
    pub version: String,
    pub endpoints: Endpoints,
    /// Strategies this process will try, in order.
    pub strategies: Vec<StrategyKind>,
    pub compression_levels: Vec<CompressionTier>,
    pub default_level: CompressionTier,
    pub max_upload_bytes: u64,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
    })
}

/// GET /
pub async fn index(State(state): State<AppState>) -> Json<ServiceDescriptor> {
    Json(ServiceDescriptor {
        message: "PDF Compressor API".into(),
        status: "running".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        endpoints: Endpoints {
            health: "/health".into(),
            upload: "/upload".into(),
            download: "/download/<download_id>/<filename>".into(),
        },
        strategies: state.orchestrator.strategies(),
        compression_levels: CompressionTier::ALL.to_vec(),
        default_level: state.config.default_tier,
        max_upload_bytes: state.config.max_upload_bytes,
    })
}
