// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Copy pages, with everything they reference, from one document into another.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::warn;

use super::document::inherited_attribute;

/// Page attributes a page may inherit from its ancestors. They are written
/// onto the copy because the copy's parent is a fresh, attribute-less root.
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Deep-copies pages between documents.
///
/// Every source object is copied at most once: shared fonts and images stay
/// shared in the target, and reference cycles (annotation /P back-pointers,
/// /Parent chains) terminate. References to /Pages nodes are redirected to
/// the target's page tree root.
pub struct PageCloner<'a> {
    source: &'a Document,
    target_root: ObjectId,
    copied: HashMap<ObjectId, ObjectId>,
}

impl<'a> PageCloner<'a> {
    pub fn new(source: &'a Document, target_root: ObjectId) -> Self {
        Self {
            source,
            target_root,
            copied: HashMap::new(),
        }
    }

    /// Allocate target ids for `pages` before any are copied, so links
    /// between pages resolve to the copies instead of dragging in the source
    /// page tree.
    pub fn reserve_pages(&mut self, target: &mut Document, pages: impl IntoIterator<Item = ObjectId>) {
        for page_id in pages {
            self.copied
                .entry(page_id)
                .or_insert_with(|| target.new_object_id());
        }
    }

    /// Copy one page into `target` and return its id there. The caller adds
    /// the id to the target's /Kids.
    pub fn clone_page(&mut self, target: &mut Document, page_id: ObjectId) -> lopdf::Result<ObjectId> {
        let source = self.source;
        let mut page = source.get_dictionary(page_id)?.clone();
        for key in INHERITABLE {
            if !page.has(key)
                && let Some(value) = inherited_attribute(source, page_id, key)
            {
                page.set(key.to_vec(), value.clone());
            }
        }
        page.remove(b"Parent");

        let new_id = *self
            .copied
            .entry(page_id)
            .or_insert_with(|| target.new_object_id());

        let mut copy = self.clone_dictionary(target, &page);
        copy.set("Parent", self.target_root);
        target.objects.insert(new_id, Object::Dictionary(copy));
        Ok(new_id)
    }

    // -- Helpers --------------------------------------------------------------

    fn clone_object(&mut self, target: &mut Document, object: &Object) -> Object {
        match object {
            Object::Reference(id) => self.clone_reference(target, *id),
            Object::Dictionary(dict) => Object::Dictionary(self.clone_dictionary(target, dict)),
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.clone_object(target, item))
                    .collect(),
            ),
            Object::Stream(stream) => {
                let dict = self.clone_dictionary(target, &stream.dict);
                let mut copy = Stream::new(dict, stream.content.clone());
                copy.allows_compression = stream.allows_compression;
                Object::Stream(copy)
            }
            other => other.clone(),
        }
    }

    fn clone_dictionary(&mut self, target: &mut Document, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            copy.set(key.clone(), self.clone_object(target, value));
        }
        copy
    }

    fn clone_reference(&mut self, target: &mut Document, id: ObjectId) -> Object {
        if let Some(new_id) = self.copied.get(&id) {
            return Object::Reference(*new_id);
        }

        let source = self.source;
        let object = match source.get_object(id) {
            Ok(object) => object,
            Err(err) => {
                warn!(?id, %err, "dangling reference replaced with null");
                return Object::Null;
            }
        };
        if is_page_tree_node(object) {
            return Object::Reference(self.target_root);
        }

        // Record the mapping before descending so cycles stop here.
        let new_id = target.new_object_id();
        self.copied.insert(id, new_id);
        let copy = self.clone_object(target, object);
        target.objects.insert(new_id, copy);
        Object::Reference(new_id)
    }
}

fn is_page_tree_node(object: &Object) -> bool {
    match object {
        Object::Dictionary(dict) => dict.has_type(b"Pages"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use lopdf::dictionary;

    use super::*;
    use crate::fixtures;
    use crate::pdf::{PdfWriter, XrefLayout};

    fn copy_all(source: &Document) -> Vec<u8> {
        let mut writer = PdfWriter::new();
        let root = writer.pages_id();
        let pages: Vec<ObjectId> = source.get_pages().into_values().collect();
        let mut cloner = PageCloner::new(source, root);
        cloner.reserve_pages(writer.document_mut(), pages.iter().copied());
        for page_id in pages {
            let new_id = cloner
                .clone_page(writer.document_mut(), page_id)
                .expect("clone");
            writer.push_page(new_id);
        }
        writer.finish(XrefLayout::Classic).expect("finish")
    }

    #[test]
    fn shared_resources_are_copied_once() {
        let source = Document::load_mem(&fixtures::text_pdf(5)).expect("load");
        let copied = Document::load_mem(&copy_all(&source)).expect("reload");

        let fonts = copied
            .objects
            .values()
            .filter(|obj| matches!(obj, Object::Dictionary(d) if d.has_type(b"Font")))
            .count();
        assert_eq!(fonts, 1);
        assert_eq!(copied.get_pages().len(), 5);
    }

    #[test]
    fn inherited_media_box_is_materialised() {
        let source = Document::load_mem(&fixtures::text_pdf(1)).expect("load");
        let copied = Document::load_mem(&copy_all(&source)).expect("reload");

        let page_id = *copied.get_pages().get(&1).expect("page 1");
        let page = copied.get_dictionary(page_id).expect("page dict");
        assert!(page.has(b"MediaBox"));
        assert!(page.has(b"Resources"));
    }

    #[test]
    fn annotation_cycle_terminates() {
        let bytes = fixtures::text_pdf(1);
        let mut source = Document::load_mem(&bytes).expect("load");
        let page_id = *source.get_pages().get(&1).expect("page 1");

        let annot_id = source.new_object_id();
        source.objects.insert(
            annot_id,
            Object::Dictionary(dictionary! {
                "Type" => "Annot",
                "Subtype" => "Text",
                "Rect" => vec![0.into(), 0.into(), 10.into(), 10.into()],
                "P" => page_id,
            }),
        );
        if let Ok(Object::Dictionary(page)) = source.get_object_mut(page_id) {
            page.set("Annots", vec![Object::Reference(annot_id)]);
        }

        let copied = Document::load_mem(&copy_all(&source)).expect("reload");
        let new_page = *copied.get_pages().get(&1).expect("page 1");
        let annots = copied
            .get_dictionary(new_page)
            .and_then(|page| page.get(b"Annots"))
            .and_then(Object::as_array)
            .expect("annots");
        let annot = copied
            .get_dictionary(annots[0].as_reference().expect("ref"))
            .expect("annot");
        assert_eq!(annot.get(b"P").and_then(Object::as_reference).ok(), Some(new_page));
    }
}
