//! Configuration structures for the extraction pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Main configuration for the renach pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenachConfig {
    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Photo crop configuration.
    pub photo: PhotoConfig,

    /// Input limits and stage budgets.
    pub limits: LimitsConfig,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Scale factor applied to page points when rendering page 1.
    pub render_scale: f32,

    /// Try to open encrypted PDFs with an empty password.
    pub decrypt_empty_password: bool,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_scale: 3.0,
            decrypt_empty_password: true,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Fall back to the installation's home state when no RG UF is found.
    pub uf_fallback: bool,

    /// Validate CPF check digits.
    pub validate_cpf: bool,

    /// Date used for year plausibility bands (default: today).
    pub reference_date: Option<NaiveDate>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            uf_fallback: true,
            validate_cpf: true,
            reference_date: None,
        }
    }
}

/// Photo crop configuration, expressed against the rendered page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoConfig {
    /// Extract the photo at all.
    pub enabled: bool,

    /// Left edge as a fraction of page width.
    pub left_ratio: f64,

    /// Top edge as a fraction of page height.
    pub top_ratio: f64,

    /// Crop width as a fraction of page width.
    pub width_ratio: f64,

    /// Crop height as a fraction of page height.
    pub height_ratio: f64,

    /// Output width in pixels.
    pub target_width: u32,

    /// Output height in pixels.
    pub target_height: u32,

    /// Unsharp mask sigma.
    pub sharpen_sigma: f32,

    /// Unsharp mask threshold.
    pub sharpen_threshold: i32,
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            left_ratio: 0.82,
            top_ratio: 0.15,
            width_ratio: 0.12,
            height_ratio: 0.18,
            target_width: 300,
            target_height: 400,
            sharpen_sigma: 0.8,
            sharpen_threshold: 2,
        }
    }
}

/// Input limits and wall-clock budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Documents larger than this are rejected before processing.
    pub max_document_bytes: usize,

    /// Budget for text extraction. Exceeding it fails the call.
    pub text_timeout_ms: u64,

    /// Budget for photo extraction. Exceeding it drops the photo.
    pub photo_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_document_bytes: 10 * 1024 * 1024,
            text_timeout_ms: 10_000,
            photo_timeout_ms: 20_000,
        }
    }
}

impl RenachConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: RenachConfig =
            serde_json::from_str(r#"{"limits": {"text_timeout_ms": 500}}"#).unwrap();
        assert_eq!(config.limits.text_timeout_ms, 500);
        assert_eq!(config.limits.photo_timeout_ms, 20_000);
        assert_eq!(config.photo.target_width, 300);
        assert!(config.extraction.uf_fallback);
    }

    #[test]
    fn test_reference_date_roundtrip() {
        let mut config = RenachConfig::default();
        config.extraction.reference_date = NaiveDate::from_ymd_opt(2025, 6, 1);
        let json = serde_json::to_string(&config).unwrap();
        let back: RenachConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.extraction.reference_date, config.extraction.reference_date);
    }
}
