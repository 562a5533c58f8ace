//! Scanned-page extraction from PDFs using lopdf.
//!
//! Scanned invoices are usually one full-page image per PDF page. This
//! rasterizer pulls that image out directly instead of rendering the page,
//! which needs no external binaries but ignores the requested DPI.
//!
//! A page without a decodable image becomes a blank placeholder so the page
//! is still recognized (and fails) on its own.

use image::{DynamicImage, GrayImage, Luma, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace, warn};

use super::{looks_like_pdf, PdfRasterizer, Result};
use crate::error::DecodeError;

/// Extracts the dominant embedded image of every page.
pub struct EmbeddedImageRasterizer;

impl EmbeddedImageRasterizer {
    pub fn new() -> Self {
        Self
    }

    fn load(&self, data: &[u8]) -> Result<Document> {
        if data.is_empty() {
            return Err(DecodeError::Empty);
        }
        if !looks_like_pdf(data) {
            return Err(DecodeError::Pdf("missing %PDF header".to_string()));
        }

        let mut doc = Document::load_mem(data).map_err(|e| DecodeError::Pdf(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            doc.decrypt("")
                .map_err(|_| DecodeError::Pdf("PDF is encrypted".to_string()))?;
            debug!("Decrypted PDF with empty password");
        }

        Ok(doc)
    }

    /// Largest image XObject on a page, by pixel area.
    fn page_image(&self, doc: &Document, page_id: ObjectId) -> Option<DynamicImage> {
        let resources = page_resources(doc, page_id)?;
        let xobjects = resources.get(b"XObject").ok()?;
        let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) else {
            return None;
        };

        xobj_dict
            .iter()
            .filter_map(|(_, obj_ref)| doc.dereference(obj_ref).ok())
            .filter_map(|(_, obj)| decode_image_object(obj))
            .max_by_key(|img| img.width() as u64 * img.height() as u64)
    }
}

impl Default for EmbeddedImageRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfRasterizer for EmbeddedImageRasterizer {
    fn rasterize(&self, data: &[u8], dpi: u32) -> Result<Vec<DynamicImage>> {
        let doc = self.load(data)?;
        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(DecodeError::NoPages);
        }

        trace!("Embedded rasterizer ignores requested {} dpi", dpi);

        let mut images = Vec::with_capacity(pages.len());
        let mut missing = 0;
        for (number, page_id) in pages {
            match self.page_image(&doc, page_id) {
                Some(image) => {
                    debug!("Page {}: embedded image {}x{}", number, image.width(), image.height());
                    images.push(image);
                }
                None => {
                    warn!("Page {} has no decodable image, using a blank page", number);
                    missing += 1;
                    images.push(blank_page());
                }
            }
        }

        if missing == images.len() {
            return Err(DecodeError::Rasterizer(
                "no page has a decodable image".to_string(),
            ));
        }
        Ok(images)
    }
}

fn blank_page() -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(1, 1, Luma([255])))
}

/// Resources dictionary for a page, following `Parent` inheritance.
fn page_resources(doc: &Document, node_id: ObjectId) -> Option<Dictionary> {
    let Ok(Object::Dictionary(dict)) = doc.get_object(node_id) else {
        return None;
    };

    if let Ok(resources) = dict.get(b"Resources") {
        if let Ok((_, Object::Dictionary(res_dict))) = doc.dereference(resources) {
            return Some(res_dict.clone());
        }
    }

    match dict.get(b"Parent") {
        Ok(Object::Reference(parent_id)) => page_resources(doc, *parent_id),
        _ => None,
    }
}

fn decode_image_object(obj: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = obj else {
        return None;
    };
    let dict = &stream.dict;

    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }

    let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
    let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;
    trace!("Found image object: {}x{}", width, height);

    let filter = dict.get(b"Filter").ok().and_then(|f| match f {
        Object::Name(name) => Some(name.as_slice()),
        Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
        _ => None,
    });

    match filter {
        Some(b"DCTDecode") => {
            return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                .ok();
        }
        Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
            trace!("Unsupported image filter {:?}", filter.map(String::from_utf8_lossy));
            return None;
        }
        _ => {}
    }

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);
    if bits != 8 {
        trace!("Unsupported bits per component: {}", bits);
        return None;
    }

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    raw_to_image(data, width, height, color_space)
}

fn raw_to_image(mut data: Vec<u8>, width: u32, height: u32, color_space: &[u8]) -> Option<DynamicImage> {
    let pixels = (width as usize).checked_mul(height as usize)?;
    let rgb_len = pixels.checked_mul(3)?;

    match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= rgb_len => {
            data.truncate(rgb_len);
            RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8)
        }
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            data.truncate(pixels);
            GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8)
        }
        _ => {
            trace!(
                "Could not decode raw image: {} bytes for {}x{} {:?}",
                data.len(),
                width,
                height,
                String::from_utf8_lossy(color_space)
            );
            None
        }
    }
}
