// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page content compaction: decode a page's content stream(s) into operators
// and re-encode them as one stream with canonical spacing.

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

/// Replace the content of `page_id` with a single re-encoded stream.
///
/// Returns `false` when the page has no content to compact. The old
/// streams are left in place for `prune_objects` to collect. Malformed
/// operators are an error.
pub fn compact_page_content(document: &mut Document, page_id: ObjectId) -> lopdf::Result<bool> {
    let raw = document.get_page_content(page_id)?;
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(false);
    }

    let encoded = Content::decode(&raw)?.encode()?;
    let stream_id = document.add_object(Stream::new(dictionary! {}, encoded));
    if let Ok(Object::Dictionary(page)) = document.get_object_mut(page_id) {
        page.set("Contents", stream_id);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn compaction_keeps_operators() {
        let mut doc = Document::load_mem(&fixtures::text_pdf(1)).expect("load");
        let page_id = *doc.get_pages().get(&1).expect("page 1");
        let before = Content::decode(&doc.get_page_content(page_id).expect("content"))
            .expect("decode")
            .operations
            .len();

        assert!(compact_page_content(&mut doc, page_id).expect("compact"));

        let after = Content::decode(&doc.get_page_content(page_id).expect("content"))
            .expect("decode")
            .operations
            .len();
        assert_eq!(before, after);
    }

    #[test]
    fn page_without_content_is_left_alone() {
        let mut writer = crate::pdf::PdfWriter::new();
        let page_id = writer.add_blank_page(100.0, 100.0);
        let doc = writer.document_mut();
        assert!(!compact_page_content(doc, page_id).expect("compact"));
    }
}
