//! Identity photo crop.
//!
//! The photo box sits at a fixed position in the top-right corner of the
//! form, so the crop is a ratio-based rectangle on the page 1 bitmap. The
//! crop is cover-fitted to a fixed size, lightly sharpened and returned as
//! a PNG data URL.

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::{DynamicImage, ImageFormat, imageops::FilterType};
use tracing::debug;

use crate::error::PhotoError;
use crate::models::config::PhotoConfig;

/// Result type for photo operations.
pub type Result<T> = std::result::Result<T, PhotoError>;

const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Crop rectangle in bitmap pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoRegion {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl PhotoRegion {
    /// Rectangle from the configured ratios, clamped inside the page.
    ///
    /// Clamping only moves the origin; width and height are kept.
    pub fn from_ratios(page_width: u32, page_height: u32, config: &PhotoConfig) -> Self {
        let scale = |total: u32, ratio: f64| (f64::from(total) * ratio).round() as u32;

        let width = scale(page_width, config.width_ratio);
        let height = scale(page_height, config.height_ratio);
        let left = scale(page_width, config.left_ratio).min(page_width.saturating_sub(width));
        let top = scale(page_height, config.top_ratio).min(page_height.saturating_sub(height));

        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Whether the rectangle lies entirely inside a page of this size.
    pub fn fits(&self, page_width: u32, page_height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.left + self.width <= page_width
            && self.top + self.height <= page_height
    }
}

/// Crop rectangle for a page bitmap of `width` x `height` with default ratios.
pub fn compute_crop_rect(width: u32, height: u32) -> PhotoRegion {
    PhotoRegion::from_ratios(width, height, &PhotoConfig::default())
}

/// Crop `region`, cover-fit it to the target size, sharpen and encode PNG.
pub fn crop_and_standardize(
    page: &DynamicImage,
    region: PhotoRegion,
    config: &PhotoConfig,
) -> Result<Vec<u8>> {
    let (page_width, page_height) = (page.width(), page.height());
    if !region.fits(page_width, page_height) {
        return Err(PhotoError::OutOfBounds {
            left: region.left,
            top: region.top,
            width: region.width,
            height: region.height,
            page_width,
            page_height,
        });
    }

    let photo = page
        .crop_imm(region.left, region.top, region.width, region.height)
        .resize_to_fill(config.target_width, config.target_height, FilterType::Lanczos3)
        .unsharpen(config.sharpen_sigma, config.sharpen_threshold);

    let mut png = Vec::new();
    photo
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| PhotoError::Encode(e.to_string()))?;
    Ok(png)
}

/// Wrap PNG bytes as a `data:image/png;base64,` URL.
pub fn to_data_url(png: &[u8]) -> String {
    format!("{DATA_URL_PREFIX}{}", BASE64.encode(png))
}

/// Decode a `data:image/png;base64,` URL back to PNG bytes.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>> {
    let payload = url
        .strip_prefix(DATA_URL_PREFIX)
        .ok_or_else(|| PhotoError::DataUrl("missing data:image/png;base64, prefix".to_string()))?;
    BASE64
        .decode(payload.trim())
        .map_err(|e| PhotoError::DataUrl(e.to_string()))
}

/// Full photo path on a page 1 bitmap: crop rectangle, standardize, data URL.
pub fn extract_photo(page: &DynamicImage, config: &PhotoConfig) -> Result<String> {
    let region = PhotoRegion::from_ratios(page.width(), page.height(), config);
    debug!(
        "Photo crop {}x{}+{}+{} on {}x{} page",
        region.width,
        region.height,
        region.left,
        region.top,
        page.width(),
        page.height()
    );
    let png = crop_and_standardize(page, region, config)?;
    Ok(to_data_url(&png))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    #[test]
    fn test_crop_rect_reference_page() {
        let rect = compute_crop_rect(2000, 3000);
        assert_eq!(
            rect,
            PhotoRegion {
                left: 1640,
                top: 450,
                width: 240,
                height: 540
            }
        );
    }

    #[test]
    fn test_clamping_keeps_size() {
        let config = PhotoConfig {
            left_ratio: 0.95,
            top_ratio: 0.9,
            ..PhotoConfig::default()
        };
        let rect = PhotoRegion::from_ratios(1000, 1000, &config);
        assert_eq!((rect.width, rect.height), (120, 180));
        assert_eq!((rect.left, rect.top), (880, 820));
        assert!(rect.fits(1000, 1000));
    }

    #[test]
    fn test_standardized_photo_size() {
        let page = DynamicImage::ImageRgb8(RgbImage::from_pixel(400, 600, Rgb([90, 120, 150])));
        let url = extract_photo(&page, &PhotoConfig::default()).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));

        let png = decode_data_url(&url).unwrap();
        let photo = image::load_from_memory(&png).unwrap();
        assert_eq!(photo.dimensions(), (300, 400)); // cover-fit, exact target
    }

    #[test]
    fn test_region_outside_page() {
        let page = DynamicImage::ImageRgb8(RgbImage::new(100, 100));
        let region = PhotoRegion {
            left: 90,
            top: 0,
            width: 20,
            height: 20,
        };
        let err = crop_and_standardize(&page, region, &PhotoConfig::default()).unwrap_err();
        assert!(matches!(err, PhotoError::OutOfBounds { .. }));
    }

    #[test]
    fn test_decode_data_url_rejects_other_types() {
        assert!(decode_data_url("data:image/jpeg;base64,AAAA").is_err());
    }
}
