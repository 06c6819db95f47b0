// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Parsed input document: the original bytes, the lopdf object graph and the
// geometry of every page, resolved once per request.

use lopdf::{Document, Object, ObjectId};
use pdfpress_core::error::{PdfpressError, Result};
use tracing::{debug, instrument};

/// US Letter, used when a page carries neither /MediaBox nor /CropBox.
pub const LETTER_PT: (f32, f32) = (612.0, 792.0);

/// Page tree nesting deeper than this is treated as malformed.
const MAX_TREE_DEPTH: usize = 64;

/// Geometry of one page as a viewer would display it.
#[derive(Debug, Clone, PartialEq)]
pub struct PageInfo {
    /// 1-indexed page number.
    pub number: u32,
    /// Object id of the page dictionary in the source document.
    pub id: ObjectId,
    pub width_pt: f32,
    pub height_pt: f32,
    /// Clockwise rotation in degrees, normalised to `0..360`.
    pub rotation: i64,
}

impl PageInfo {
    /// Width and height after applying `/Rotate`.
    pub fn display_size(&self) -> (f32, f32) {
        if self.rotation % 180 == 90 {
            (self.height_pt, self.width_pt)
        } else {
            (self.width_pt, self.height_pt)
        }
    }
}

/// An uploaded PDF, parsed once and shared read-only by every compressor.
pub struct PdfDocument {
    bytes: Vec<u8>,
    document: Document,
    pages: Vec<PageInfo>,
}

impl PdfDocument {
    // -- Construction ---------------------------------------------------------

    /// Parse `bytes` and resolve page geometry. A document without pages is
    /// rejected.
    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    pub fn parse(bytes: Vec<u8>) -> Result<Self> {
        let document = Document::load_mem(&bytes)
            .map_err(|err| PdfpressError::Parse(format!("failed to load PDF: {err}")))?;

        let pages: Vec<PageInfo> = document
            .get_pages()
            .into_iter()
            .map(|(number, id)| page_info(&document, number, id))
            .collect();

        if pages.is_empty() {
            return Err(PdfpressError::Parse("document has no pages".into()));
        }

        debug!(pages = pages.len(), version = %document.version, "PDF parsed");
        Ok(Self {
            bytes,
            document,
            pages,
        })
    }

    /// Parse a copy of `data`.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::parse(data.to_vec())
    }

    // -- Inspection -----------------------------------------------------------

    /// The original, unmodified input.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Pages in document order.
    pub fn pages(&self) -> &[PageInfo] {
        &self.pages
    }

    /// The parsed object graph. Compressors clone it before mutating.
    pub fn lopdf(&self) -> &Document {
        &self.document
    }
}

// -- Page attributes ----------------------------------------------------------

fn page_info(document: &Document, number: u32, id: ObjectId) -> PageInfo {
    let (width_pt, height_pt) = visible_box(document, id)
        .map(|[llx, lly, urx, ury]| (urx - llx, ury - lly))
        .unwrap_or(LETTER_PT);

    let rotation = inherited_attribute(document, id, b"Rotate")
        .and_then(|obj| resolve(document, obj))
        .and_then(|obj| obj.as_i64().ok())
        .unwrap_or(0)
        .rem_euclid(360);

    PageInfo {
        number,
        id,
        width_pt,
        height_pt,
        rotation,
    }
}

/// The area a viewer (and MuPDF) shows: the CropBox clipped to the
/// MediaBox. Either box alone is used when the other is missing, and the
/// MediaBox when the two do not overlap.
fn visible_box(document: &Document, page_id: ObjectId) -> Option<[f32; 4]> {
    let media = page_rect(document, page_id, b"MediaBox");
    let crop = page_rect(document, page_id, b"CropBox");
    match (media, crop) {
        (Some(media), Some(crop)) => intersect(media, crop).or(Some(media)),
        (media, crop) => media.or(crop),
    }
}

/// A rectangle attribute as `[llx, lly, urx, ury]` with the corners put in
/// order, or `None` when absent, not four numbers, or degenerate.
fn page_rect(document: &Document, page_id: ObjectId, key: &[u8]) -> Option<[f32; 4]> {
    let raw = inherited_attribute(document, page_id, key)?;
    let rect = resolve(document, raw)?.as_array().ok()?;
    if rect.len() != 4 {
        return None;
    }
    let mut coords = [0f32; 4];
    for (slot, value) in coords.iter_mut().zip(rect) {
        *slot = number(resolve(document, value)?)?;
    }
    let ordered = [
        coords[0].min(coords[2]),
        coords[1].min(coords[3]),
        coords[0].max(coords[2]),
        coords[1].max(coords[3]),
    ];
    (ordered[2] > ordered[0] && ordered[3] > ordered[1]).then_some(ordered)
}

fn intersect(a: [f32; 4], b: [f32; 4]) -> Option<[f32; 4]> {
    let clipped = [a[0].max(b[0]), a[1].max(b[1]), a[2].min(b[2]), a[3].min(b[3])];
    (clipped[2] > clipped[0] && clipped[3] > clipped[1]).then_some(clipped)
}

/// Look `key` up on the page dictionary, then on each ancestor /Pages node.
/// Returns the raw (possibly indirect) value.
pub(crate) fn inherited_attribute<'a>(
    document: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node = document.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = document.get_dictionary(parent).ok()?;
    }
    None
}

/// Follow indirect references until a direct object is reached.
pub(crate) fn resolve<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Object> {
    let mut current = object;
    for _ in 0..MAX_TREE_DEPTH {
        match current {
            Object::Reference(id) => current = document.get_object(*id).ok()?,
            direct => return Some(direct),
        }
    }
    None
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use lopdf::{Dictionary, dictionary};

    use super::*;
    use crate::fixtures;

    #[test]
    fn parses_text_fixture() {
        let bytes = fixtures::text_pdf(3);
        let doc = PdfDocument::parse(bytes.clone()).expect("parse");
        assert_eq!(doc.page_count(), 3);
        assert_eq!(doc.len(), bytes.len());
        let numbers: Vec<u32> = doc.pages().iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn parsing_is_deterministic() {
        let bytes = fixtures::text_pdf(4);
        let first = PdfDocument::from_bytes(&bytes).expect("first parse");
        let second = PdfDocument::from_bytes(&bytes).expect("second parse");
        assert_eq!(first.page_count(), second.page_count());
        assert_eq!(first.pages(), second.pages());
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = PdfDocument::from_bytes(b"definitely not a pdf").err().expect("must fail");
        assert!(matches!(err, PdfpressError::Parse(_)));
    }

    #[test]
    fn empty_page_tree_is_a_parse_error() {
        let err = PdfDocument::parse(fixtures::empty_pdf()).err().expect("must fail");
        assert!(matches!(err, PdfpressError::Parse(_)));
    }

    #[test]
    fn media_box_is_inherited_from_page_tree() {
        // fixtures put /MediaBox on the /Pages node only.
        let doc = PdfDocument::parse(fixtures::text_pdf(1)).expect("parse");
        let page = &doc.pages()[0];
        assert_eq!((page.width_pt, page.height_pt), fixtures::A4_PT);
        assert_eq!(page.rotation, 0);
    }

    #[test]
    fn rotation_swaps_display_size() {
        let page = PageInfo {
            number: 1,
            id: (1, 0),
            width_pt: 200.0,
            height_pt: 100.0,
            rotation: 270,
        };
        assert_eq!(page.display_size(), (100.0, 200.0));
    }

    /// One-page document whose page carries `boxes` directly.
    fn page_with(boxes: Dictionary) -> (Document, ObjectId) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        };
        for (key, value) in &boxes {
            page.set(key.clone(), value.clone());
        }
        let page_id = doc.add_object(page);
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        (doc, page_id)
    }

    fn rect(values: [i64; 4]) -> Object {
        Object::Array(values.iter().map(|&v| Object::Integer(v)).collect())
    }

    #[test]
    fn crop_box_sets_the_visible_size() {
        let (doc, page_id) = page_with(dictionary! {
            "MediaBox" => rect([0, 0, 612, 792]),
            "CropBox" => rect([36, 36, 576, 756]),
        });
        let info = page_info(&doc, 1, page_id);
        assert_eq!((info.width_pt, info.height_pt), (540.0, 720.0));
    }

    #[test]
    fn crop_box_is_clipped_to_media_box() {
        let (doc, page_id) = page_with(dictionary! {
            "MediaBox" => rect([0, 0, 300, 400]),
            "CropBox" => rect([-50, 100, 500, 900]),
        });
        let info = page_info(&doc, 1, page_id);
        assert_eq!((info.width_pt, info.height_pt), (300.0, 300.0));
    }

    #[test]
    fn disjoint_crop_box_falls_back_to_media_box() {
        let (doc, page_id) = page_with(dictionary! {
            "MediaBox" => rect([0, 0, 300, 400]),
            "CropBox" => rect([500, 500, 600, 600]),
        });
        let info = page_info(&doc, 1, page_id);
        assert_eq!((info.width_pt, info.height_pt), (300.0, 400.0));
    }

    #[test]
    fn crop_box_alone_is_used() {
        let (doc, page_id) = page_with(dictionary! {
            "CropBox" => rect([10, 10, 210, 110]),
        });
        let info = page_info(&doc, 1, page_id);
        assert_eq!((info.width_pt, info.height_pt), (200.0, 100.0));
    }

    #[test]
    fn missing_boxes_fall_back_to_letter() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Rotate" => -90,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let info = page_info(&doc, 1, page_id);
        assert_eq!((info.width_pt, info.height_pt), LETTER_PT);
        assert_eq!(info.rotation, 270);
    }
}
