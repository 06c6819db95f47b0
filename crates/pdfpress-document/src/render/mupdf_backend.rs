// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// MuPDF rendering backend.

use image::RgbImage;
use mupdf::{Colorspace, Document, Matrix, Pixmap};
use pdfpress_core::error::{PdfpressError, Result};
use tracing::{debug, instrument};

use super::{PageRasterizer, PageSink};
use crate::pdf::{PdfDocument, PdfWriter, XrefLayout};

const PDF_MAGIC: &str = "application/pdf";

/// Renders pages with MuPDF as device-RGB pixmaps without alpha.
#[derive(Debug, Default)]
pub struct MupdfRasterizer;

impl MupdfRasterizer {
    /// Render a one-page blank document to confirm the library works.
    pub fn probe() -> Result<Self> {
        let mut writer = PdfWriter::new();
        writer.add_blank_page(72.0, 72.0);
        let bytes = writer
            .finish(XrefLayout::Classic)
            .map_err(|err| PdfpressError::Render(format!("probe document: {err}")))?;
        let doc = PdfDocument::parse(bytes)?;

        let backend = Self;
        backend.render_pages(&doc, 1.0, &mut |_, _| Ok(()))?;
        Ok(backend)
    }
}

impl PageRasterizer for MupdfRasterizer {
    fn name(&self) -> &'static str {
        "mupdf"
    }

    #[instrument(skip_all, fields(pages = doc.page_count(), zoom = zoom))]
    fn render_pages(&self, doc: &PdfDocument, zoom: f32, sink: &mut PageSink<'_>) -> Result<()> {
        let document = Document::from_bytes(doc.bytes(), PDF_MAGIC).map_err(render_err)?;
        let count = document.page_count().map_err(render_err)?;
        let transform = Matrix::new_scale(zoom, zoom);
        let rgb = Colorspace::device_rgb();

        for index in 0..count {
            let pixels = {
                let page = document.load_page(index).map_err(render_err)?;
                let pixmap = page
                    .to_pixmap(&transform, &rgb, false, false)
                    .map_err(render_err)?;
                pixmap_to_rgb(&pixmap)?
            };
            debug!(page = index + 1, width = pixels.width(), height = pixels.height(), "page rendered");
            sink(index as usize, pixels)?;
        }
        Ok(())
    }
}

/// Copy pixmap samples into an `RgbImage`, dropping any extra channels and
/// the row padding implied by the stride.
fn pixmap_to_rgb(pixmap: &Pixmap) -> Result<RgbImage> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(PdfpressError::Render(format!(
            "unsupported pixmap format: {n} channels"
        )));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
        return Err(PdfpressError::Render("pixmap buffer size mismatch".into()));
    }

    let mut out = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        let row = &samples[y * stride..y * stride + row_bytes];
        if n == 3 {
            out.extend_from_slice(row);
        } else {
            for px in row.chunks_exact(n) {
                out.extend_from_slice(&px[..3]);
            }
        }
    }

    RgbImage::from_raw(pixmap.width(), pixmap.height(), out)
        .ok_or_else(|| PdfpressError::Render("pixmap dimensions overflow".into()))
}

fn render_err(err: mupdf::error::Error) -> PdfpressError {
    PdfpressError::Render(format!("MuPDF: {err}"))
}
