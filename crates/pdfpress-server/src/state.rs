// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared application state handed to every handler.

use std::sync::Arc;

use pdfpress_core::ServerConfig;
use pdfpress_core::error::Result;
use pdfpress_document::{Capabilities, Orchestrator};

use crate::staging::StagingArea;

/// Everything a request needs. Cheap to clone; nothing in it is mutated
/// after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub staging: Arc<StagingArea>,
    pub orchestrator: Arc<Orchestrator>,
    pub capabilities: Capabilities,
}

impl AppState {
    /// Create the staging directories and the strategy chain.
    pub fn new(config: ServerConfig, capabilities: Capabilities) -> Result<Self> {
        let staging = StagingArea::create(&config.staging_dir)?;
        let orchestrator = Orchestrator::new(&capabilities, &config);
        Ok(Self {
            config: Arc::new(config),
            staging: Arc::new(staging),
            orchestrator: Arc::new(orchestrator),
            capabilities,
        })
    }
}
