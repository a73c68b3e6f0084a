//! Combines pages of independently loaded PDFs into one output document.
//!
//! Source objects are imported with their ids shifted past the destination's
//! current maximum, so references inside each source stay valid. Selected pages
//! are re-parented under a fresh page tree and anything no longer reachable
//! from the catalog is pruned before saving.

use lopdf::{dictionary, Document, Object, ObjectId};
use tracing::debug;

use crate::error::ReportError;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSelection {
    First,
    All,
}

pub struct MergePart {
    pub doc: Document,
    pub pages: PageSelection,
}

impl MergePart {
    pub fn first_page(doc: Document) -> Self {
        Self { doc, pages: PageSelection::First }
    }

    pub fn all_pages(doc: Document) -> Self {
        Self { doc, pages: PageSelection::All }
    }
}

pub fn first_page_id(doc: &Document) -> Result<ObjectId, ReportError> {
    doc.get_pages()
        .values()
        .next()
        .copied()
        .ok_or_else(|| ReportError::Pdf("document has no pages".into()))
}

/// Copies inherited attributes onto the page itself so it stays complete once
/// detached from its original page tree.
pub fn inherit_page_attributes(doc: &mut Document, page_id: ObjectId) -> Result<(), ReportError> {
    let mut inherited = Vec::new();
    {
        let page = doc.get_dictionary(page_id)?;
        let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
        let mut missing: Vec<&[u8]> = INHERITABLE.iter().copied().filter(|key| !page.has(key)).collect();
        let mut depth = 0;
        while let Some(parent_id) = parent {
            if missing.is_empty() || depth > 32 {
                break;
            }
            let node = doc.get_dictionary(parent_id)?;
            missing.retain(|key| match node.get(key) {
                Ok(value) => {
                    inherited.push((key.to_vec(), value.clone()));
                    false
                }
                Err(_) => true,
            });
            parent = node.get(b"Parent").and_then(Object::as_reference).ok();
            depth += 1;
        }
    }

    let page = doc.get_dictionary_mut(page_id)?;
    for (key, value) in inherited {
        page.set(key, value);
    }
    Ok(())
}

fn shift_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(items) => Object::Array(items.into_iter().map(|o| shift_refs(o, offset)).collect()),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = shift_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = shift_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}

/// Builds one document from the selected pages of every part, in order.
pub fn merge(parts: Vec<MergePart>) -> Result<Document, ReportError> {
    let mut dest = Document::with_version("1.5");
    let pages_id = dest.new_object_id();
    let mut kids: Vec<ObjectId> = Vec::new();

    for MergePart { mut doc, pages } in parts {
        let mut selected: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if pages == PageSelection::First {
            selected.truncate(1);
        }
        for page_id in &selected {
            inherit_page_attributes(&mut doc, *page_id)?;
        }

        let offset = dest.max_id;
        for (id, object) in std::mem::take(&mut doc.objects) {
            dest.objects.insert((id.0 + offset, id.1), shift_refs(object, offset));
        }
        dest.max_id = dest.max_id.max(doc.max_id + offset);

        for page_id in selected {
            let new_id = (page_id.0 + offset, page_id.1);
            dest.get_dictionary_mut(new_id)?.set("Parent", pages_id);
            kids.push(new_id);
        }
    }

    if kids.is_empty() {
        return Err(ReportError::NothingToExport);
    }
    debug!(pages = kids.len(), "merged page tree");

    dest.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
            "Count" => kids.len() as i64,
        }),
    );
    let catalog_id = dest.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    dest.trailer.set("Root", catalog_id);
    dest.prune_objects();
    Ok(dest)
}

pub fn to_bytes(mut doc: Document) -> Result<Vec<u8>, ReportError> {
    doc.compress();
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).map_err(|e| ReportError::Pdf(e.to_string()))?;
    Ok(buffer)
}
