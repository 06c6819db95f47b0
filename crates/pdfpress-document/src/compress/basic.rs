// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Basic structural compressor: copy every page into a fresh document and
// serialise it with deflate. The last resort of the fallback chain.

use pdfpress_core::error::{PdfpressError, Result};
use pdfpress_core::{CancelFlag, CompressionTier, StrategyKind};
use tracing::{info, instrument, warn};

use super::Compressor;
use crate::pdf::content::compact_page_content;
use crate::pdf::{PageCloner, PdfDocument, PdfWriter, XrefLayout};

#[derive(Debug, Default)]
pub struct BasicCompressor;

impl Compressor for BasicCompressor {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BasicStructural
    }

    #[instrument(skip_all, fields(tier = %tier, pages = doc.page_count()))]
    fn compress(&self, doc: &PdfDocument, tier: CompressionTier, cancel: &CancelFlag) -> Result<Vec<u8>> {
        let preset = tier.basic();
        let mut writer = PdfWriter::new();
        let mut cloner = PageCloner::new(doc.lopdf(), writer.pages_id());
        cloner.reserve_pages(writer.document_mut(), doc.pages().iter().map(|page| page.id));

        for page in doc.pages() {
            cancel.check()?;
            let new_id = cloner
                .clone_page(writer.document_mut(), page.id)
                .map_err(|err| PdfpressError::Recompress(format!("page {}: {err}", page.number)))?;

            // Undecodable content is copied as-is.
            if preset.compact_content_streams
                && let Err(err) = compact_page_content(writer.document_mut(), new_id)
            {
                warn!(page = page.number, %err, "content left uncompacted");
            }
            writer.push_page(new_id);
        }

        let output = writer
            .finish(XrefLayout::Classic)
            .map_err(|err| PdfpressError::Recompress(format!("failed to serialise: {err}")))?;
        info!(output_bytes = output.len(), "pages copied");
        Ok(output)
    }
}
