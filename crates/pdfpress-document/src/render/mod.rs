// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterisers: backends that turn each page of a document into an RGB
// pixel buffer.

#[cfg(feature = "raster")]
pub mod mupdf_backend;

use std::sync::Arc;

use image::RgbImage;
use pdfpress_core::error::Result;

use crate::pdf::PdfDocument;

/// Receives each rendered page as `(zero-based index, pixels)`. Returning an
/// error stops rendering.
pub type PageSink<'s> = dyn FnMut(usize, RgbImage) -> Result<()> + 's;

/// A rendering backend.
///
/// Pages are delivered one at a time, in order, so a caller never holds more
/// than one page's pixels.
pub trait PageRasterizer: Send + Sync {
    /// Short backend name for logs and the service descriptor.
    fn name(&self) -> &'static str;

    /// Render every page of `doc` at `zoom` (1.0 = 72 dpi), calling `sink`
    /// for each. Pages must honour `/Rotate`.
    fn render_pages(&self, doc: &PdfDocument, zoom: f32, sink: &mut PageSink<'_>) -> Result<()>;
}

/// The compiled-in backend, if it initialises.
#[cfg(feature = "raster")]
pub fn probe_backend() -> Option<Arc<dyn PageRasterizer>> {
    match mupdf_backend::MupdfRasterizer::probe() {
        Ok(backend) => Some(Arc::new(backend)),
        Err(err) => {
            tracing::warn!(%err, "MuPDF rasteriser failed to initialise");
            None
        }
    }
}

/// The compiled-in backend, if it initialises.
#[cfg(not(feature = "raster"))]
pub fn probe_backend() -> Option<Arc<dyn PageRasterizer>> {
    tracing::debug!("built without the raster feature");
    None
}
