// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfpress-document: PDF compression for the pdfpress service.
//
// Parses uploads into a page-geometry model, provides the three compression
// strategies (rasterise, recompress streams, structural copy) and the
// orchestrator that runs them as a fallback chain.

pub mod capabilities;
pub mod compress;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
pub mod image;
pub mod orchestrator;
pub mod pdf;
pub mod render;

// Re-export the primary structs so callers can use `pdfpress_document::Orchestrator` etc.
pub use capabilities::Capabilities;
pub use compress::Compressor;
pub use image::processor::ImageProcessor;
pub use orchestrator::{CompressionOutcome, Orchestrator};
pub use pdf::{PageInfo, PdfDocument};
pub use render::PageRasterizer;
