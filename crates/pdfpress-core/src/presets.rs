// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-tier parameter tables for each compression strategy.
//
// Each table has one row per tier, indexed by `CompressionTier::index()`.
// Compressors look their parameters up here instead of branching on the tier.

use serde::Serialize;

use crate::types::CompressionTier;

/// Parameters for the page-rasterising compressor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RasterPreset {
    /// JPEG quality, 1-100.
    pub jpeg_quality: u8,
    /// Render scale relative to 72 dpi.
    pub zoom: f32,
    /// Rendered pages wider than this are downscaled to fit.
    pub max_width_px: u32,
}

/// How non-stream objects are written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectStreamMode {
    /// Keep the input's layout: packed inputs stay packed, classic inputs
    /// keep a classic xref table.
    Preserve,
    /// Pack small objects into object streams with an xref stream.
    Generate,
}

/// Parameters for the structural stream recompressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamPreset {
    pub object_streams: ObjectStreamMode,
    /// Decode and re-encode page content operators into one compact stream.
    pub normalize_content: bool,
    /// Inflate already-deflated streams so they are re-deflated uniformly.
    pub recompress_flate: bool,
    /// Keep XMP metadata and object numbering intact.
    pub preserve_archival: bool,
}

/// Parameters for the last-resort structural copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BasicPreset {
    /// Merge each page's content streams into a single deflated stream.
    pub compact_content_streams: bool,
}

pub const RASTER_PRESETS: [RasterPreset; 4] = [
    RasterPreset { jpeg_quality: 70, zoom: 1.0, max_width_px: 1600 },
    RasterPreset { jpeg_quality: 55, zoom: 0.9, max_width_px: 1400 },
    RasterPreset { jpeg_quality: 40, zoom: 0.8, max_width_px: 1200 },
    RasterPreset { jpeg_quality: 25, zoom: 0.7, max_width_px: 1000 },
];

const FULL_RECOMPRESSION: StreamPreset = StreamPreset {
    object_streams: ObjectStreamMode::Generate,
    normalize_content: true,
    recompress_flate: true,
    preserve_archival: false,
};

// high and extreme share medium's row. Kept as-is; see DESIGN.md.
pub const STREAM_PRESETS: [StreamPreset; 4] = [
    StreamPreset {
        object_streams: ObjectStreamMode::Preserve,
        normalize_content: false,
        recompress_flate: false,
        preserve_archival: true,
    },
    FULL_RECOMPRESSION,
    FULL_RECOMPRESSION,
    FULL_RECOMPRESSION,
];

pub const BASIC_PRESETS: [BasicPreset; 4] = [
    BasicPreset { compact_content_streams: false },
    BasicPreset { compact_content_streams: false },
    BasicPreset { compact_content_streams: false },
    BasicPreset { compact_content_streams: true },
];

impl CompressionTier {
    pub fn raster(self) -> RasterPreset {
        RASTER_PRESETS[self.index()]
    }

    pub fn stream(self) -> StreamPreset {
        STREAM_PRESETS[self.index()]
    }

    pub fn basic(self) -> BasicPreset {
        BASIC_PRESETS[self.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raster_presets_match_published_values() {
        let medium = CompressionTier::Medium.raster();
        assert_eq!(medium.jpeg_quality, 55);
        assert_eq!(medium.max_width_px, 1400);
        assert!((medium.zoom - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn raster_presets_grow_more_aggressive() {
        for pair in CompressionTier::ALL.windows(2) {
            let (gentle, harsh) = (pair[0].raster(), pair[1].raster());
            assert!(harsh.jpeg_quality < gentle.jpeg_quality);
            assert!(harsh.max_width_px < gentle.max_width_px);
            assert!(harsh.zoom <= gentle.zoom);
        }
    }

    #[test]
    fn only_low_preserves_archival_structure() {
        let low = CompressionTier::Low.stream();
        assert!(low.preserve_archival);
        assert_eq!(low.object_streams, ObjectStreamMode::Preserve);
        assert!(!CompressionTier::Medium.stream().preserve_archival);
    }

    #[test]
    fn upper_stream_tiers_match_medium() {
        let medium = CompressionTier::Medium.stream();
        assert_eq!(CompressionTier::High.stream(), medium);
        assert_eq!(CompressionTier::Extreme.stream(), medium);
    }

    #[test]
    fn only_extreme_compacts_basic_content() {
        assert!(CompressionTier::Extreme.basic().compact_content_streams);
        assert!(!CompressionTier::High.basic().compact_content_streams);
    }
}
