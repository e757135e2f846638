//! PDF text and first-page bitmap extraction using lopdf and pdf-extract.

use std::borrow::Cow;

use image::{DynamicImage, GrayImage, RgbImage, imageops::FilterType};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::{DocumentBackend, Result};
use crate::error::PdfError;
use crate::models::config::PdfConfig;

/// Page size used when page 1 declares no MediaBox (A4 in points).
const DEFAULT_MEDIA_BOX: (f32, f32) = (595.0, 842.0);

/// lopdf-backed [`DocumentBackend`].
///
/// Text comes from pdf-extract. Forms arrive as scans with one full-page
/// raster per page, so page 1 is "rendered" by taking its largest embedded
/// image and resizing it to the page's MediaBox at the requested scale.
pub struct LopdfBackend {
    decrypt_empty_password: bool,
}

impl LopdfBackend {
    /// Create a new backend.
    pub fn new() -> Self {
        Self {
            decrypt_empty_password: true,
        }
    }

    /// Create a backend from the PDF section of the configuration.
    pub fn from_config(config: &PdfConfig) -> Self {
        Self {
            decrypt_empty_password: config.decrypt_empty_password,
        }
    }

    /// Set whether encrypted PDFs are opened with an empty password.
    pub fn with_empty_password_decryption(mut self, enabled: bool) -> Self {
        self.decrypt_empty_password = enabled;
        self
    }

    /// Parse the document, decrypting it when allowed.
    ///
    /// Returns the document and the bytes pdf-extract should read, which
    /// are re-serialized when decryption happened.
    fn load<'a>(&self, data: &'a [u8]) -> Result<(Document, Cow<'a, [u8]>)> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let bytes = if doc.is_encrypted() {
            if !self.decrypt_empty_password || doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {e}")))?;
            Cow::Owned(decrypted)
        } else {
            Cow::Borrowed(data)
        };

        if doc.get_pages().is_empty() {
            return Err(PdfError::NoPages);
        }
        Ok((doc, bytes))
    }
}

impl Default for LopdfBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBackend for LopdfBackend {
    fn extract_text(&self, data: &[u8]) -> Result<String> {
        let (doc, bytes) = self.load(data)?;
        let text = pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;

        debug!(
            "Extracted {} characters from {} pages",
            text.len(),
            doc.get_pages().len()
        );
        Ok(text)
    }

    fn render_first_page(&self, data: &[u8], scale: f32) -> Result<DynamicImage> {
        let (doc, _) = self.load(data)?;
        let page_id = *doc.get_pages().get(&1).ok_or(PdfError::InvalidPage(1))?;

        let (width_pt, height_pt) = media_box(&doc, page_id).unwrap_or(DEFAULT_MEDIA_BOX);
        let width = (width_pt * scale).round().max(1.0) as u32;
        let height = (height_pt * scale).round().max(1.0) as u32;

        let raster = page_images(&doc, page_id)
            .into_iter()
            .max_by_key(|img| u64::from(img.width()) * u64::from(img.height()))
            .ok_or_else(|| PdfError::Render("no decodable raster image on page 1".to_string()))?;

        debug!(
            "Page 1: {}x{} pt, raster {}x{} -> bitmap {}x{}",
            width_pt,
            height_pt,
            raster.width(),
            raster.height(),
            width,
            height
        );
        Ok(raster.resize_exact(width, height, FilterType::Lanczos3))
    }
}

/// Look up a page attribute, walking up the page tree when inherited.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = page_id;
    loop {
        let dict = doc.get_object(current).and_then(Object::as_dict).ok()?;
        if let Ok(value) = dict.get(key) {
            return doc.dereference(value).ok().map(|(_, obj)| obj);
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
}

fn media_box(doc: &Document, page_id: ObjectId) -> Option<(f32, f32)> {
    let values = inherited(doc, page_id, b"MediaBox")?.as_array().ok()?;
    let numbers: Vec<f32> = values.iter().filter_map(number).collect();
    match numbers.as_slice() {
        [x0, y0, x1, y1] if x1 > x0 && y1 > y0 => Some((x1 - x0, y1 - y0)),
        _ => None,
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Decodable image XObjects referenced from the page's resources.
fn page_images(doc: &Document, page_id: ObjectId) -> Vec<DynamicImage> {
    let Some(resources) = inherited(doc, page_id, b"Resources").and_then(|o| o.as_dict().ok())
    else {
        return Vec::new();
    };
    let Some(xobjects) = resources
        .get(b"XObject")
        .ok()
        .and_then(|o| doc.dereference(o).ok())
        .and_then(|(_, o)| o.as_dict().ok())
    else {
        return Vec::new();
    };

    xobjects
        .iter()
        .filter_map(|(_, obj)| doc.dereference(obj).ok())
        .filter_map(|(_, obj)| decode_image(doc, obj))
        .collect()
}

fn decode_image(doc: &Document, obj: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = obj else {
        return None;
    };
    let dict = &stream.dict;
    if dict.get(b"Subtype").and_then(Object::as_name).ok()? != b"Image" {
        return None;
    }

    let width = u32::try_from(dict.get(b"Width").and_then(Object::as_i64).ok()?).ok()?;
    let height = u32::try_from(dict.get(b"Height").and_then(Object::as_i64).ok()?).ok()?;
    trace!("Image XObject {}x{}", width, height);

    match filter_name(dict) {
        Some(b"DCTDecode") => {
            return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                .ok();
        }
        Some(b"JPXDecode" | b"CCITTFaxDecode" | b"JBIG2Decode") => {
            trace!("Skipping image with unsupported filter");
            return None;
        }
        _ => {}
    }

    let bits = dict
        .get(b"BitsPerComponent")
        .and_then(Object::as_i64)
        .unwrap_or(8);
    if bits != 8 {
        trace!("Skipping image with {} bits per component", bits);
        return None;
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    raw_image(doc, dict, data, width, height)
}

fn filter_name(dict: &Dictionary) -> Option<&[u8]> {
    match dict.get(b"Filter").ok()? {
        Object::Name(name) => Some(name.as_slice()),
        Object::Array(filters) => filters.first().and_then(|o| o.as_name().ok()),
        _ => None,
    }
}

/// Build an image from uncompressed 8-bit gray or RGB samples.
fn raw_image(
    doc: &Document,
    dict: &Dictionary,
    mut data: Vec<u8>,
    width: u32,
    height: u32,
) -> Option<DynamicImage> {
    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => doc.get_object(*r).and_then(Object::as_name).ok(),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let pixels = width as usize * height as usize;
    match color_space {
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            data.truncate(pixels);
            GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8)
        }
        b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => {
            data.truncate(pixels * 3);
            RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8)
        }
        _ => {
            trace!(
                "Could not decode image: {} bytes for {}x{} in {:?}",
                data.len(),
                width,
                height,
                String::from_utf8_lossy(color_space)
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Stream, dictionary};

    /// One page with a MediaBox on the Pages node and a gray raster.
    fn scanned_pdf(raster: (i64, i64), media: (i64, i64)) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id: ObjectId = doc.new_object_id();

        let pixels = (raster.0 * raster.1) as usize;
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => raster.0,
                "Height" => raster.1,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8i64,
            },
            vec![200u8; pixels],
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::from(page_id)],
                "Count" => 1i64,
                "MediaBox" => vec![0.into(), 0.into(), media.0.into(), media.1.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_render_scales_media_box() {
        let pdf = scanned_pdf((20, 30), (100, 150));
        let page = LopdfBackend::new().render_first_page(&pdf, 2.0).unwrap();
        assert_eq!((page.width(), page.height()), (200, 300));
    }

    #[test]
    fn test_not_a_pdf() {
        let err = LopdfBackend::new().extract_text(b"not a pdf").unwrap_err();
        assert!(matches!(err, PdfError::Parse(_)));
    }

    #[test]
    fn test_page_without_raster_fails_render() {
        let mut doc = Document::with_version("1.5");
        let pages_id: ObjectId = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::from(page_id)],
                "Count" => 1i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        let mut pdf = Vec::new();
        doc.save_to(&mut pdf).unwrap();

        let err = LopdfBackend::new().render_first_page(&pdf, 1.0).unwrap_err();
        assert!(matches!(err, PdfError::Render(_)));
    }
}
