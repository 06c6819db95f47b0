// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Startup capability probe: which strategies this process can run.

use std::fmt;
use std::sync::Arc;

use pdfpress_core::StrategyKind;
use tracing::info;

use crate::compress::{BasicCompressor, Compressor, RasterCompressor, StreamCompressor};
use crate::render::{self, PageRasterizer};

/// Strategies available to this process. Probed once at startup and shared
/// by every request.
#[derive(Clone)]
pub struct Capabilities {
    rasterizer: Option<Arc<dyn PageRasterizer>>,
}

impl Capabilities {
    /// Detect the optional rendering backend.
    pub fn probe() -> Self {
        let capabilities = Self {
            rasterizer: render::probe_backend(),
        };
        info!(
            strategies = ?capabilities.available(),
            rasterizer = capabilities.rasterizer_name().unwrap_or("none"),
            "capabilities probed"
        );
        capabilities
    }

    /// Only the lopdf-based strategies.
    pub fn structural_only() -> Self {
        Self { rasterizer: None }
    }

    /// Use `rasterizer` for the rasterising strategy.
    pub fn with_rasterizer(rasterizer: Arc<dyn PageRasterizer>) -> Self {
        Self {
            rasterizer: Some(rasterizer),
        }
    }

    pub fn rasterizer_name(&self) -> Option<&'static str> {
        self.rasterizer.as_ref().map(|backend| backend.name())
    }

    /// Available strategies in fallback order.
    pub fn available(&self) -> Vec<StrategyKind> {
        StrategyKind::PRIORITY
            .into_iter()
            .filter(|kind| *kind != StrategyKind::Rasterization || self.rasterizer.is_some())
            .collect()
    }

    /// Instantiate the compressor for `kind`, if available.
    pub fn compressor(&self, kind: StrategyKind) -> Option<Box<dyn Compressor>> {
        match kind {
            StrategyKind::Rasterization => self
                .rasterizer
                .clone()
                .map(|backend| Box::new(RasterCompressor::new(backend)) as Box<dyn Compressor>),
            StrategyKind::StreamRecompressor => Some(Box::new(StreamCompressor)),
            StrategyKind::BasicStructural => Some(Box::new(BasicCompressor)),
        }
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("rasterizer", &self.rasterizer_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_strategies_always_available() {
        let caps = Capabilities::structural_only();
        assert_eq!(
            caps.available(),
            vec![StrategyKind::StreamRecompressor, StrategyKind::BasicStructural]
        );
        assert!(caps.compressor(StrategyKind::Rasterization).is_none());
    }

    #[cfg(not(feature = "raster"))]
    #[test]
    fn probe_without_backend_skips_rasterization() {
        let caps = Capabilities::probe();
        assert!(!caps.available().contains(&StrategyKind::Rasterization));
    }
}
