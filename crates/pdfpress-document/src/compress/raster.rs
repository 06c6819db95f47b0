// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rasterising compressor: every page becomes a single JPEG.

use std::sync::Arc;

use pdfpress_core::error::{PdfpressError, Result};
use pdfpress_core::{CancelFlag, CompressionTier, StrategyKind};
use tracing::{debug, info, instrument};

use super::Compressor;
use crate::image::ImageProcessor;
use crate::pdf::{PdfDocument, PdfWriter, XrefLayout};
use crate::render::PageRasterizer;

/// Renders each page, downsamples it, and rebuilds the document from JPEGs.
///
/// Text and vector content is lost; output pages keep the displayed size of
/// the originals.
pub struct RasterCompressor {
    rasterizer: Arc<dyn PageRasterizer>,
}

impl RasterCompressor {
    pub fn new(rasterizer: Arc<dyn PageRasterizer>) -> Self {
        Self { rasterizer }
    }
}

impl Compressor for RasterCompressor {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Rasterization
    }

    #[instrument(skip_all, fields(tier = %tier, pages = doc.page_count(), backend = self.rasterizer.name()))]
    fn compress(&self, doc: &PdfDocument, tier: CompressionTier, cancel: &CancelFlag) -> Result<Vec<u8>> {
        let preset = tier.raster();
        let pages = doc.pages();
        let mut writer = PdfWriter::new();

        self.rasterizer
            .render_pages(doc, preset.zoom, &mut |index, pixels| {
                cancel.check()?;
                let page = pages.get(index).ok_or_else(|| {
                    PdfpressError::Render(format!(
                        "backend produced page {} of a {}-page document",
                        index + 1,
                        pages.len()
                    ))
                })?;

                let processor = ImageProcessor::from_rgb(pixels).fit_width(preset.max_width_px);
                let pixel_size = processor.dimensions();
                let jpeg = processor
                    .to_jpeg_bytes(preset.jpeg_quality)
                    .map_err(|err| PdfpressError::Render(format!("page {}: {err}", page.number)))?;

                let (width_pt, height_pt) = page.display_size();
                debug!(page = page.number, jpeg_bytes = jpeg.len(), "page encoded");
                writer
                    .add_jpeg_page(jpeg, pixel_size, width_pt, height_pt)
                    .map_err(|err| PdfpressError::Render(format!("page {}: {err}", page.number)))?;
                Ok(())
            })?;

        if writer.page_count() != pages.len() {
            return Err(PdfpressError::Render(format!(
                "rendered {} of {} pages",
                writer.page_count(),
                pages.len()
            )));
        }

        let output = writer
            .finish(XrefLayout::Classic)
            .map_err(|err| PdfpressError::Render(format!("failed to serialise: {err}")))?;
        info!(output_bytes = output.len(), "rasterised");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use lopdf::Document;

    use super::*;
    use crate::fixtures;
    use crate::render::PageSink;

    /// Paints each page a flat grey at the requested zoom, honouring rotation.
    struct FlatRasterizer;

    impl PageRasterizer for FlatRasterizer {
        fn name(&self) -> &'static str {
            "flat"
        }

        fn render_pages(&self, doc: &PdfDocument, zoom: f32, sink: &mut PageSink<'_>) -> Result<()> {
            for (index, page) in doc.pages().iter().enumerate() {
                let (w, h) = page.display_size();
                let pixels = RgbImage::from_pixel(
                    (w * zoom) as u32,
                    (h * zoom) as u32,
                    Rgb([200, 200, 200]),
                );
                sink(index, pixels)?;
            }
            Ok(())
        }
    }

    /// Paints a noisy gradient at three times the requested zoom, so every
    /// tier's width cap applies.
    struct TexturedRasterizer;

    impl PageRasterizer for TexturedRasterizer {
        fn name(&self) -> &'static str {
            "textured"
        }

        fn render_pages(&self, doc: &PdfDocument, zoom: f32, sink: &mut PageSink<'_>) -> Result<()> {
            for (index, page) in doc.pages().iter().enumerate() {
                let (w, h) = page.display_size();
                let pixels = RgbImage::from_fn((w * zoom * 3.0) as u32, (h * zoom * 3.0) as u32, |x, y| {
                    let noise = (x.wrapping_mul(73_856_093) ^ y.wrapping_mul(19_349_663)) % 64;
                    let r = ((x / 4) % 192 + noise) as u8;
                    let g = ((y / 4) % 192 + noise) as u8;
                    let b = (((x + y) / 8) % 192 + noise) as u8;
                    Rgb([r, g, b])
                });
                sink(index, pixels)?;
            }
            Ok(())
        }
    }

    fn image_widths(output: &[u8]) -> Vec<i64> {
        let rebuilt = Document::load_mem(output).expect("reload");
        rebuilt
            .objects
            .values()
            .filter_map(|obj| obj.as_stream().ok())
            .filter(|stream| stream.dict.get(b"Subtype").and_then(|s| s.as_name()).ok() == Some(b"Image".as_slice()))
            .filter_map(|stream| stream.dict.get(b"Width").and_then(|w| w.as_i64()).ok())
            .collect()
    }

    fn compressor() -> RasterCompressor {
        RasterCompressor::new(Arc::new(FlatRasterizer))
    }

    #[test]
    fn output_keeps_page_count_and_size() {
        let doc = PdfDocument::parse(fixtures::text_pdf(3)).expect("parse");
        let output = compressor()
            .compress(&doc, CompressionTier::Medium, &CancelFlag::new())
            .expect("compress");

        let rebuilt = PdfDocument::parse(output).expect("reparse");
        assert_eq!(rebuilt.page_count(), 3);
        let page = &rebuilt.pages()[0];
        assert_eq!((page.width_pt, page.height_pt), fixtures::A4_PT);
    }

    #[test]
    fn images_are_capped_at_preset_width() {
        let doc = PdfDocument::parse(fixtures::text_pdf(1)).expect("parse");
        let output = compressor()
            .compress(&doc, CompressionTier::Extreme, &CancelFlag::new())
            .expect("compress");

        let widths = image_widths(&output);
        assert_eq!(widths.len(), 1);
        // A4 at zoom 0.7 is ~416 px wide, under the 1000 px cap.
        assert!(widths[0] <= i64::from(CompressionTier::Extreme.raster().max_width_px));
    }

    #[test]
    fn output_shrinks_as_tiers_get_more_aggressive() {
        let doc = PdfDocument::parse(fixtures::text_pdf(1)).expect("parse");
        let textured = RasterCompressor::new(Arc::new(TexturedRasterizer));

        let mut previous: Option<(CompressionTier, usize)> = None;
        for tier in CompressionTier::ALL {
            let output = textured
                .compress(&doc, tier, &CancelFlag::new())
                .expect("compress");

            let cap = i64::from(tier.raster().max_width_px);
            let widths = image_widths(&output);
            assert_eq!(widths.len(), 1, "tier {tier}");
            assert!(widths.iter().all(|&w| w <= cap), "tier {tier}: {widths:?} over {cap}");

            if let Some((prev_tier, prev_len)) = previous {
                assert!(
                    output.len() <= prev_len,
                    "{tier} produced {} bytes, more than {prev_tier} at {prev_len}",
                    output.len()
                );
            }
            previous = Some((tier, output.len()));
        }
    }

    #[test]
    fn cancellation_stops_between_pages() {
        let doc = PdfDocument::parse(fixtures::text_pdf(2)).expect("parse");
        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = compressor()
            .compress(&doc, CompressionTier::Low, &cancel)
            .expect_err("cancelled");
        assert!(matches!(err, PdfpressError::Cancelled));
    }
}
