//! Image embedding shared by both generators: fetch, sniff, decode, scale.
//!
//! Decoded images are plain RGB buffers independent of any document; each
//! drawing surface embeds them when they are drawn. Every failure degrades to
//! `None` so callers can fall back to text or skip the image.

use base64::Engine;
use image::{DynamicImage, ImageFormat, Rgba};
use tracing::{info, warn};

use crate::fetch::{Fetched, HttpFetcher};
use crate::models::VisitImage;

/// Longest side kept when embedding; larger photos are downscaled.
const MAX_EMBED_PX: u32 = 1600;

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl EmbeddedImage {
    pub fn size(&self) -> (f32, f32) {
        (self.width as f32, self.height as f32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Jpeg,
    Png,
}

impl SourceFormat {
    fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        match mime.as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(SourceFormat::Jpeg),
            "image/png" => Some(SourceFormat::Png),
            _ => None,
        }
    }

    fn from_url(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next().unwrap_or_default().to_ascii_lowercase();
        if path.ends_with(".jpg") || path.ends_with(".jpeg") {
            Some(SourceFormat::Jpeg)
        } else if path.ends_with(".png") {
            Some(SourceFormat::Png)
        } else {
            None
        }
    }

    fn from_magic(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            ImageFormat::Png => Some(SourceFormat::Png),
            ImageFormat::Jpeg => Some(SourceFormat::Jpeg),
            _ => None,
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            SourceFormat::Jpeg => ImageFormat::Jpeg,
            SourceFormat::Png => ImageFormat::Png,
        }
    }
}

/// Declared content type first, then the URL extension, then magic bytes; JPEG otherwise.
pub fn sniff_format(content_type: Option<&str>, url: &str, bytes: &[u8]) -> SourceFormat {
    content_type
        .and_then(SourceFormat::from_content_type)
        .or_else(|| SourceFormat::from_url(url))
        .or_else(|| SourceFormat::from_magic(bytes))
        .unwrap_or(SourceFormat::Jpeg)
}

pub fn decode(bytes: &[u8], format: SourceFormat) -> Result<EmbeddedImage, image::ImageError> {
    let mut img = image::load_from_memory_with_format(bytes, format.image_format())?;
    if img.width() > MAX_EMBED_PX || img.height() > MAX_EMBED_PX {
        img = img.thumbnail(MAX_EMBED_PX, MAX_EMBED_PX);
    }
    let rgb = flatten_on_white(&img);
    Ok(EmbeddedImage { width: img.width(), height: img.height(), rgb })
}

fn flatten_on_white(img: &DynamicImage) -> Vec<u8> {
    if !img.color().has_alpha() {
        return img.to_rgb8().into_raw();
    }
    img.to_rgba8()
        .pixels()
        .flat_map(|Rgba([r, g, b, a])| {
            let alpha = f32::from(*a) / 255.0;
            let blend = |c: u8| (f32::from(c) * alpha + 255.0 * (1.0 - alpha)).round() as u8;
            [blend(*r), blend(*g), blend(*b)]
        })
        .collect()
}

/// Largest size inside `bounds` with the aspect ratio of `natural`.
/// One side always touches its bound.
pub fn scale_to_fit(natural: (f32, f32), bounds: (f32, f32)) -> (f32, f32) {
    let (w, h) = natural;
    let (max_w, max_h) = bounds;
    if w <= 0.0 || h <= 0.0 || max_w <= 0.0 || max_h <= 0.0 {
        return (0.0, 0.0);
    }
    if max_w / w <= max_h / h {
        (max_w, (h * max_w / w).min(max_h))
    } else {
        ((w * max_h / h).min(max_w), max_h)
    }
}

fn decode_data_url(url: &str) -> Option<Fetched> {
    let rest = url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let content_type = meta.strip_suffix(";base64")?;
    let bytes = base64::engine::general_purpose::STANDARD.decode(payload.trim()).ok()?;
    Some(Fetched { bytes: bytes.into(), content_type: Some(content_type.to_string()) })
}

#[derive(Clone)]
pub struct ImageEmbedder {
    http: HttpFetcher,
}

impl ImageEmbedder {
    pub fn new(http: HttpFetcher) -> Self {
        Self { http }
    }

    /// Fetches and decodes one image. `None` means "image unavailable".
    pub async fn embed_from_url(&self, url: &str) -> Option<EmbeddedImage> {
        let fetched = if url.starts_with("data:") {
            match decode_data_url(url) {
                Some(f) => f,
                None => {
                    warn!("⚠️ Malformed data URL image skipped");
                    return None;
                }
            }
        } else {
            match self.http.get(url).await {
                Ok(f) => f,
                Err(e) => {
                    warn!("⚠️ Image fetch failed for {}: {}", url, e);
                    return None;
                }
            }
        };

        let format = sniff_format(fetched.content_type.as_deref(), url, &fetched.bytes);
        match decode(&fetched.bytes, format) {
            Ok(img) => {
                info!("🖼️ Embedded {:?} image {}x{}", format, img.width, img.height);
                Some(img)
            }
            Err(e) => {
                warn!("⚠️ Image decode failed for {} as {:?}: {}", url, format, e);
                None
            }
        }
    }

    /// Embeds every image in input order; images without a URL are unavailable.
    pub async fn embed_all(&self, images: &[VisitImage]) -> Vec<Option<EmbeddedImage>> {
        let mut out = Vec::with_capacity(images.len());
        for image in images {
            let embedded = match image.public_url.as_deref() {
                Some(url) if !url.trim().is_empty() => self.embed_from_url(url).await,
                _ => {
                    warn!("⚠️ Image {} has no public URL", image.id);
                    None
                }
            };
            out.push(embedded);
        }
        out
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

    pub fn png_bytes(width: u32, height: u32, pixel: [u8; 4]) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(pixel)));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    pub fn png_data_url(width: u32, height: u32) -> String {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes(width, height, [20, 120, 200, 255]));
        format!("data:image/png;base64,{}", encoded)
    }
}
