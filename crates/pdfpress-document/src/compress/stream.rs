// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stream recompressor: rewrite the object graph losslessly with uniform
// deflate, compacted page content and (above `low`) object streams.

use lopdf::{Document, Object};
use pdfpress_core::error::{PdfpressError, Result};
use pdfpress_core::presets::ObjectStreamMode;
use pdfpress_core::{CancelFlag, CompressionTier, StrategyKind};
use tracing::{debug, info, instrument};

use super::Compressor;
use crate::pdf::content::compact_page_content;
use crate::pdf::{PdfDocument, XrefLayout, serialize};

/// Keys left in the trailer by a cross-reference stream that make no sense
/// once the document is written out again.
const XREF_STREAM_KEYS: [&[u8]; 8] = [
    b"Type",
    b"W",
    b"Index",
    b"Length",
    b"Filter",
    b"DecodeParms",
    b"Prev",
    b"XRefStm",
];

/// Entries with no effect on rendering, dropped unless archival structure
/// must be kept.
const CATALOG_EXTRAS: [&[u8]; 2] = [b"Metadata", b"PieceInfo"];
const PAGE_EXTRAS: [&[u8]; 3] = [b"Metadata", b"PieceInfo", b"Thumb"];

#[derive(Debug, Default)]
pub struct StreamCompressor;

impl Compressor for StreamCompressor {
    fn kind(&self) -> StrategyKind {
        StrategyKind::StreamRecompressor
    }

    #[instrument(skip_all, fields(tier = %tier, pages = doc.page_count()))]
    fn compress(&self, doc: &PdfDocument, tier: CompressionTier, cancel: &CancelFlag) -> Result<Vec<u8>> {
        let preset = tier.stream();
        let mut document = doc.lopdf().clone();
        let packed_input = uses_object_streams(&document);
        drop_xref_leftovers(&mut document);

        if preset.recompress_flate {
            document.decompress();
        }

        if preset.normalize_content {
            for page in doc.pages() {
                cancel.check()?;
                compact_page_content(&mut document, page.id).map_err(|err| {
                    PdfpressError::Recompress(format!("page {} content: {err}", page.number))
                })?;
            }
        }

        if !preset.preserve_archival {
            strip_extras(&mut document, doc);
            let pruned = document.prune_objects().len();
            let empty = document.delete_zero_length_streams().len();
            document.renumber_objects();
            debug!(pruned, empty, "object graph collected");
        }

        cancel.check()?;
        document.compress();

        let layout = match preset.object_streams {
            ObjectStreamMode::Preserve if packed_input => XrefLayout::ObjectStreams,
            ObjectStreamMode::Preserve => XrefLayout::Classic,
            ObjectStreamMode::Generate => XrefLayout::ObjectStreams,
        };
        let output = serialize(&mut document, layout)
            .map_err(|err| PdfpressError::Recompress(format!("failed to serialise: {err}")))?;
        info!(output_bytes = output.len(), ?layout, "recompressed");
        Ok(output)
    }
}

/// Whether the input was written with object streams or a cross-reference
/// stream. `Preserve` keeps that packing instead of unpacking it.
fn uses_object_streams(document: &Document) -> bool {
    let trailer_is_stream = document
        .trailer
        .get(b"Type")
        .and_then(Object::as_name)
        .is_ok_and(|name| name == b"XRef");
    trailer_is_stream
        || document.objects.values().any(|object| {
            matches!(object, Object::Stream(stream)
                if stream.dict.has_type(b"ObjStm") || stream.dict.has_type(b"XRef"))
        })
}

/// Remove cross-reference and object-stream containers carried over from
/// the input, and their keys in the trailer. The writer builds its own.
fn drop_xref_leftovers(document: &mut Document) {
    document.objects.retain(|_, object| match object {
        Object::Stream(stream) => !(stream.dict.has_type(b"XRef") || stream.dict.has_type(b"ObjStm")),
        _ => true,
    });
    for key in XREF_STREAM_KEYS {
        document.trailer.remove(key);
    }
}

fn strip_extras(document: &mut Document, doc: &PdfDocument) {
    if let Ok(root_id) = document.trailer.get(b"Root").and_then(Object::as_reference)
        && let Ok(Object::Dictionary(catalog)) = document.get_object_mut(root_id)
    {
        for key in CATALOG_EXTRAS {
            catalog.remove(key);
        }
    }
    for page in doc.pages() {
        if let Ok(Object::Dictionary(dict)) = document.get_object_mut(page.id) {
            for key in PAGE_EXTRAS {
                dict.remove(key);
            }
        }
    }
}
