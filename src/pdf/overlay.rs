//! Borang export: stamps summaries onto the official template pages, appends
//! the image gallery and merges everything into one document.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use serde::Deserialize;
use tracing::{info, warn};

use super::canvas::PrintCanvas;
use super::gallery::{render_gallery, GalleryItem};
use super::images::ImageEmbedder;
use super::merge::{first_page_id, inherit_page_attributes, merge, to_bytes, MergePart};
use super::templates::{
    coordinates, template_path, Point, TemplateSource, EVIDENCE_MARK_SIZE, FIELD_FONT_SIZE, SCHOOL_NAME_AT, VISIT_DATE_AT,
};
use super::text::{encode_win_ansi, wrap_text, Face};
use crate::error::ReportError;
use crate::models::{StandardSummary, VisitImage};

/// Resource name of the Helvetica font added to stamped pages.
const STAMP_FONT: &str = "FSip";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverlayRequest {
    pub school_name: String,
    pub visit_date: String,
    #[serde(default)]
    pub sections: Vec<StandardSummary>,
    #[serde(default)]
    pub images: Vec<VisitImage>,
}

fn text_at(text: &str, at: Point) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(STAMP_FONT.as_bytes().to_vec()), FIELD_FONT_SIZE.into()]),
        Operation::new("Td", vec![at.x.into(), at.y.into()]),
        Operation::new("Tj", vec![Object::String(encode_win_ansi(text), StringFormat::Literal)]),
        Operation::new("ET", vec![]),
    ]
}

fn filled_square(at: Point, size: f32) -> Vec<Operation> {
    vec![
        Operation::new("re", vec![at.x.into(), at.y.into(), size.into(), size.into()]),
        Operation::new("f", vec![]),
    ]
}

/// Drawing operations for one standard's borang page, in black.
pub fn stamp_operations(summary: &StandardSummary, school_name: &str, visit_date: &str) -> Vec<Operation> {
    let coords = coordinates(summary.code);
    let mut ops = vec![Operation::new("g", vec![0.into()])];

    ops.extend(text_at(school_name, SCHOOL_NAME_AT));
    ops.extend(text_at(visit_date, VISIT_DATE_AT));

    if let (Some(score), Some(at)) = (summary.score, coords.score) {
        ops.extend(text_at(&score.to_string(), at));
    }

    // Positional: answer i marks box i; answers past the last box draw nothing.
    for (checked, at) in summary.evidences.iter().zip(coords.evidences) {
        if *checked {
            ops.extend(filled_square(*at, EVIDENCE_MARK_SIZE));
        }
    }

    if let (Some(remarks), Some(area)) = (summary.remarks_text(), coords.remarks) {
        for (i, line) in wrap_text(remarks, area.max_width, Face::Regular, FIELD_FONT_SIZE).iter().enumerate() {
            ops.extend(text_at(line, Point { x: area.x, y: area.y - i as f32 * area.line_height }));
        }
    }
    ops
}

/// Resources dictionary of the page, resolved through a reference if needed.
fn page_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary, ReportError> {
    match doc.get_dictionary(page_id)?.get(b"Resources") {
        Ok(Object::Reference(id)) => Ok(doc.get_dictionary(*id)?.clone()),
        Ok(Object::Dictionary(dict)) => Ok(dict.clone()),
        _ => Ok(Dictionary::new()),
    }
}

fn register_stamp_font(doc: &mut Document, page_id: ObjectId) -> Result<(), ReportError> {
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => Face::Regular.base_font(),
        "Encoding" => "WinAnsiEncoding",
    });

    let mut resources = page_resources(doc, page_id)?;
    let mut fonts = match resources.get(b"Font") {
        Ok(Object::Reference(id)) => doc.get_dictionary(*id)?.clone(),
        Ok(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };
    fonts.set(STAMP_FONT, font_id);
    resources.set("Font", fonts);
    doc.get_dictionary_mut(page_id)?.set("Resources", resources);
    Ok(())
}

/// Appends `ops` after the page's existing content, which is isolated in q/Q.
fn append_content(doc: &mut Document, page_id: ObjectId, ops: Vec<Operation>) -> Result<(), ReportError> {
    let existing: Vec<Object> = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(Object::Reference(id)) => vec![Object::Reference(*id)],
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    let mut operations = vec![Operation::new("Q", vec![])];
    operations.extend(ops);
    let mut stamp = b"\n".to_vec();
    stamp.extend(Content { operations }.encode()?);

    let open_id = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
    let stamp_id = doc.add_object(Stream::new(dictionary! {}, stamp));

    let mut contents = vec![Object::Reference(open_id)];
    contents.extend(existing);
    contents.push(Object::Reference(stamp_id));
    doc.get_dictionary_mut(page_id)?.set("Contents", contents);
    Ok(())
}

/// Stamps one summary onto the first page of a loaded template.
pub fn stamp_template(doc: &mut Document, summary: &StandardSummary, school_name: &str, visit_date: &str) -> Result<(), ReportError> {
    let page_id = first_page_id(doc)?;
    inherit_page_attributes(doc, page_id)?;
    register_stamp_font(doc, page_id)?;
    append_content(doc, page_id, stamp_operations(summary, school_name, visit_date))
}

async fn load_template(templates: &dyn TemplateSource, path: &str) -> Result<Document, ReportError> {
    let bytes = templates.fetch(path).await?;
    Document::load_mem(&bytes).map_err(|e| ReportError::TemplateInvalid { path: path.to_string(), reason: e.to_string() })
}

/// Generates the borang PDF.
///
/// Only standards with data are exported. A missing or unreadable template
/// fails the whole call; an image that cannot be embedded is left out.
pub async fn generate_overlay(
    request: &OverlayRequest,
    templates: &dyn TemplateSource,
    embedder: &ImageEmbedder,
) -> Result<Vec<u8>, ReportError> {
    let mut parts = Vec::new();
    for summary in request.sections.iter().filter(|s| s.has_data()) {
        let path = template_path(summary.code);
        let mut doc = load_template(templates, &path).await?;
        stamp_template(&mut doc, summary, &request.school_name, &request.visit_date)?;
        info!("🖊️ Stamped standard {} onto {}", summary.code, path);
        parts.push(MergePart::first_page(doc));
    }

    if !request.images.is_empty() {
        let embedded = embedder.embed_all(&request.images).await;
        let items: Vec<GalleryItem> = request
            .images
            .iter()
            .zip(&embedded)
            .filter_map(|(image, decoded)| match decoded {
                Some(decoded) => Some(GalleryItem { caption: image.caption(), group: image.standard(), image: decoded }),
                None => {
                    warn!("⚠️ Skipping image {} in gallery", image.id);
                    None
                }
            })
            .collect();

        if !items.is_empty() {
            let mut canvas = PrintCanvas::new("SIP+ Visit Images")?;
            render_gallery(&mut canvas, &items);
            let gallery = Document::load_mem(&canvas.finish()?)?;
            info!("🖼️ Gallery with {} images", items.len());
            parts.push(MergePart::all_pages(gallery));
        }
    }

    if parts.is_empty() {
        return Err(ReportError::NothingToExport);
    }
    to_bytes(merge(parts)?)
}
