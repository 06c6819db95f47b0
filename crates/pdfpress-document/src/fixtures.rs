// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sample documents generated in memory, shared by unit tests, the server's
// end-to-end tests and the benches. Only built for tests or with the
// `fixtures` feature.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// A4 portrait, the size of every fixture page.
pub const A4_PT: (f32, f32) = (595.0, 842.0);

const LINES_PER_PAGE: usize = 40;

/// A `pages`-page document of plain Helvetica text with uncompressed content
/// streams. /MediaBox lives on the page tree root so pages inherit it.
pub fn text_pdf(pages: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::with_capacity(pages as usize);
    for number in 1..=pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, text_content(number)));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::from(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => i64::from(pages),
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), A4_PT.0.into(), A4_PT.1.into()],
        }),
    );
    finish(doc, pages_id)
}

/// A structurally valid document whose page tree is empty.
pub fn empty_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => Vec::<Object>::new(),
        "Count" => 0,
    });
    finish(doc, pages_id)
}

/// A one-page document of approximately `target_len` bytes (exact to within
/// a few bytes once `target_len` exceeds the bare document size).
pub fn padded_pdf(target_len: usize) -> Vec<u8> {
    let bare = padded_with(0).len();
    let first = padded_with(target_len.saturating_sub(bare));
    // Correct for the digits the /Length value gained.
    let overshoot = first.len().saturating_sub(target_len);
    if overshoot == 0 {
        return first;
    }
    padded_with(target_len.saturating_sub(bare + overshoot))
}

fn padded_with(padding: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let filler = doc.add_object(Stream::new(dictionary! {}, vec![b'0'; padding]).with_compression(false));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), A4_PT.0.into(), A4_PT.1.into()],
        "PieceInfo" => filler,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::from(page_id)],
            "Count" => 1,
        }),
    );
    finish(doc, pages_id)
}

fn text_content(page: u32) -> Vec<u8> {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 11.into()]),
        Operation::new("TL", vec![14.into()]),
        Operation::new("Td", vec![56.into(), 780.into()]),
    ];
    for line in 0..LINES_PER_PAGE {
        let text = format!(
            "Page {page}, line {line}: the quick brown fox jumps over the lazy dog again and again."
        );
        operations.push(Operation::new("Tj", vec![Object::string_literal(text)]));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));

    Content { operations }.encode().expect("encode fixture content")
}

fn finish(mut doc: Document, pages_id: lopdf::ObjectId) -> Vec<u8> {
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut output = Vec::new();
    doc.save_to(&mut output).expect("save fixture");
    output
}
