// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: width-bounded downscaling and JPEG encoding of rendered
// pages, using the `image` crate.

use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use pdfpress_core::error::{PdfpressError, Result};
use tracing::{debug, instrument};

/// Processing pipeline for a single rendered page.
///
/// Methods that transform the image consume `self` and return a new
/// `ImageProcessor`, so steps chain:
///
/// ```ignore
/// let jpeg = ImageProcessor::from_rgb(pixels)
///     .fit_width(1400)
///     .to_jpeg_bytes(55)?;
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    pub fn from_rgb(image: RgbImage) -> Self {
        Self {
            image: DynamicImage::ImageRgb8(image),
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    // -- Transformations ------------------------------------------------------

    /// Downscale proportionally so the width is at most `max_width`, using
    /// Lanczos3. Narrower images are returned untouched.
    #[instrument(skip(self))]
    pub fn fit_width(self, max_width: u32) -> Self {
        let (width, height) = self.dimensions();
        if width <= max_width || max_width == 0 {
            return self;
        }

        let ratio = f64::from(max_width) / f64::from(width);
        let new_height = ((f64::from(height) * ratio).round() as u32).max(1);
        let resized = self
            .image
            .resize_exact(max_width, new_height, FilterType::Lanczos3);
        debug!(
            from_w = width,
            from_h = height,
            new_w = resized.width(),
            new_h = resized.height(),
            "downscaled"
        );
        Self { image: resized }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode as baseline JPEG with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        rgb.write_with_encoder(encoder)
            .map_err(|err| PdfpressError::Image(format!("JPEG encoding failed: {err}")))?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]))
    }

    #[test]
    fn wide_image_is_downscaled_proportionally() {
        let processor = ImageProcessor::from_rgb(gradient(2000, 1000)).fit_width(1000);
        assert_eq!(processor.dimensions(), (1000, 500));
    }

    #[test]
    fn narrow_image_is_untouched() {
        let processor = ImageProcessor::from_rgb(gradient(800, 600)).fit_width(1000);
        assert_eq!(processor.dimensions(), (800, 600));
    }

    #[test]
    fn jpeg_output_has_soi_marker() {
        let jpeg = ImageProcessor::from_rgb(gradient(64, 64))
            .to_jpeg_bytes(55)
            .expect("encode");
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn lower_quality_is_smaller() {
        let processor = ImageProcessor::from_rgb(gradient(256, 256));
        let high = processor.to_jpeg_bytes(90).expect("q90");
        let low = processor.to_jpeg_bytes(20).expect("q20");
        assert!(low.len() < high.len());
    }
}
