// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: assemble fresh output documents and serialise any lopdf
// document with either a classic xref table or object streams.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, SaveOptions, Stream, dictionary};
use tracing::debug;

/// Objects packed into a single object stream.
const OBJECTS_PER_STREAM: usize = 100;

/// Cross-reference layout of a serialised document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefLayout {
    /// `xref` table, every object written on its own.
    Classic,
    /// Non-stream objects packed into object streams, xref stream.
    ObjectStreams,
}

/// Builds a new document from a catalog and a flat page tree.
///
/// The page tree root id is reserved up front so that page dictionaries can
/// point their /Parent at it before the root itself is written.
pub struct PdfWriter {
    document: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl PdfWriter {
    pub fn new() -> Self {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        Self {
            document,
            pages_id,
            kids: Vec::new(),
        }
    }

    // -- Accessors ------------------------------------------------------------

    /// Id the page tree root will have once written.
    pub fn pages_id(&self) -> ObjectId {
        self.pages_id
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    // -- Pages ----------------------------------------------------------------

    /// Add a page whose only content is `jpeg` drawn over the full
    /// `width_pt` x `height_pt` page.
    pub fn add_jpeg_page(
        &mut self,
        jpeg: Vec<u8>,
        pixel_size: (u32, u32),
        width_pt: f32,
        height_pt: f32,
    ) -> lopdf::Result<ObjectId> {
        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(pixel_size.0),
                "Height" => i64::from(pixel_size.1),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        )
        .with_compression(false);
        let image_id = self.document.add_object(image);

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        width_pt.into(),
                        0.into(),
                        0.into(),
                        height_pt.into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = self
            .document
            .add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = self.document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => media_box(width_pt, height_pt),
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
            "Contents" => content_id,
        });
        self.kids.push(page_id.into());
        Ok(page_id)
    }

    /// Add an empty page of the given size.
    pub fn add_blank_page(&mut self, width_pt: f32, height_pt: f32) -> ObjectId {
        let page_id = self.document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => media_box(width_pt, height_pt),
            "Resources" => dictionary! {},
        });
        self.kids.push(page_id.into());
        page_id
    }

    /// Register a page dictionary already inserted into the document. Its
    /// /Parent must be [`PdfWriter::pages_id`].
    pub fn push_page(&mut self, page_id: ObjectId) {
        self.kids.push(page_id.into());
    }

    // -- Output ---------------------------------------------------------------

    /// Write the page tree and catalog, deflate unfiltered streams, drop
    /// unreferenced objects and serialise.
    pub fn finish(mut self, layout: XrefLayout) -> lopdf::Result<Vec<u8>> {
        let count = self.kids.len() as i64;
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.document.trailer.set("Root", catalog_id);

        self.document.compress();
        self.document.prune_objects();
        serialize(&mut self.document, layout)
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialise `document` to bytes.
pub fn serialize(document: &mut Document, layout: XrefLayout) -> lopdf::Result<Vec<u8>> {
    let mut output = Vec::new();
    match layout {
        XrefLayout::Classic => document.save_to(&mut output)?,
        XrefLayout::ObjectStreams => {
            let options = SaveOptions::builder()
                .use_object_streams(true)
                .use_xref_streams(true)
                .max_objects_per_stream(OBJECTS_PER_STREAM)
                .compression_level(9)
                .build();
            document.save_with_options(&mut output, options)?;
        }
    }
    debug!(?layout, output_bytes = output.len(), "document serialised");
    Ok(output)
}

fn media_box(width_pt: f32, height_pt: f32) -> Vec<Object> {
    vec![0.into(), 0.into(), width_pt.into(), height_pt.into()]
}
