// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Compression strategies. Each turns a parsed document into a new serialised
// PDF; the orchestrator decides which output to keep.

pub mod basic;
pub mod raster;
pub mod stream;

use pdfpress_core::error::Result;
use pdfpress_core::{CancelFlag, CompressionTier, StrategyKind};

use crate::pdf::PdfDocument;

pub use basic::BasicCompressor;
pub use raster::RasterCompressor;
pub use stream::StreamCompressor;

/// One interchangeable compression technique.
///
/// Implementations read `doc` without mutating it and look their parameters
/// up from the tier's preset row. They should poll `cancel` at natural
/// boundaries (between pages) and return `Cancelled` when it trips.
pub trait Compressor: Send + Sync {
    fn kind(&self) -> StrategyKind;

    fn compress(&self, doc: &PdfDocument, tier: CompressionTier, cancel: &CancelFlag) -> Result<Vec<u8>>;
}
