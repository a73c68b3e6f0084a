//! Drawing surface for documents built from scratch (narrative report, gallery).
//!
//! Coordinates are PDF points from the bottom-left corner of an A4 page.

use std::io::BufWriter;

use printpdf::*;

use super::images::EmbeddedImage;
use super::text::Face;
use super::{A4_HEIGHT, A4_WIDTH};
use crate::error::ReportError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub face: Face,
    /// 0.0 is black, 1.0 is white.
    pub gray: f32,
}

impl TextStyle {
    pub fn regular(size: f32) -> Self {
        Self { size, face: Face::Regular, gray: 0.0 }
    }

    pub fn bold(size: f32) -> Self {
        Self { size, face: Face::Bold, gray: 0.0 }
    }

    pub fn gray(mut self, gray: f32) -> Self {
        self.gray = gray;
        self
    }
}

pub trait Canvas {
    fn new_page(&mut self);
    fn text(&mut self, text: &str, x: f32, y: f32, style: TextStyle);
    /// Draws `image` with its lower-left corner at (x, y), stretched to `width` × `height`.
    fn image(&mut self, image: &EmbeddedImage, x: f32, y: f32, width: f32, height: f32);
    fn page_count(&self) -> usize;
}

pub fn pt_to_mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}

/// [`Canvas`] backed by a printpdf document with the built-in Helvetica faces.
pub struct PrintCanvas {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    pages: usize,
}

impl PrintCanvas {
    pub fn new(title: &str) -> Result<Self, ReportError> {
        let (doc, page, layer) = PdfDocument::new(title, pt_to_mm(A4_WIDTH), pt_to_mm(A4_HEIGHT), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(|e| ReportError::Pdf(e.to_string()))?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(|e| ReportError::Pdf(e.to_string()))?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self { doc, layer, regular, bold, pages: 1 })
    }

    pub fn finish(self) -> Result<Vec<u8>, ReportError> {
        let mut buf: Vec<u8> = Vec::new();
        {
            let mut writer = BufWriter::new(&mut buf);
            self.doc.save(&mut writer).map_err(|e| ReportError::Pdf(e.to_string()))?;
        }
        Ok(buf)
    }
}

impl Canvas for PrintCanvas {
    fn new_page(&mut self) {
        self.pages += 1;
        let (page, layer) = self.doc.add_page(pt_to_mm(A4_WIDTH), pt_to_mm(A4_HEIGHT), format!("Page {}", self.pages));
        self.layer = self.doc.get_page(page).get_layer(layer);
    }

    fn text(&mut self, text: &str, x: f32, y: f32, style: TextStyle) {
        let font = match style.face {
            Face::Regular => &self.regular,
            Face::Bold => &self.bold,
        };
        self.layer.set_fill_color(Color::Rgb(Rgb::new(style.gray, style.gray, style.gray, None)));
        self.layer.use_text(text, style.size, pt_to_mm(x), pt_to_mm(y), font);
    }

    fn image(&mut self, image: &EmbeddedImage, x: f32, y: f32, width: f32, height: f32) {
        if image.width == 0 || image.height == 0 {
            return;
        }
        let xobject = Image::from(ImageXObject {
            width: Px(image.width as usize),
            height: Px(image.height as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: image.rgb.clone(),
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        });
        // At 72 dpi one pixel is one point, so the scale is the target size in pixels.
        xobject.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(pt_to_mm(x)),
                translate_y: Some(pt_to_mm(y)),
                scale_x: Some(width / image.width as f32),
                scale_y: Some(height / image.height as f32),
                dpi: Some(72.0),
                ..Default::default()
            },
        );
    }

    fn page_count(&self) -> usize {
        self.pages
    }
}
