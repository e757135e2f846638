//! Concurrent extraction pipeline.
//!
//! One call owns one document: the text path (PDF text, then the field
//! rules) and the photo path (page 1 bitmap, then the crop) run side by
//! side on blocking workers, each under its own budget. A text failure
//! fails the call; a photo failure only drops the photo.

use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use tokio::task::JoinError;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{ExtractionError, InputError, Result};
use crate::form::{FormParser, ParseResult, RenachParser};
use crate::models::config::RenachConfig;
use crate::models::record::ExtractionResult;
use crate::pdf::DocumentBackend;
use crate::photo::extract_photo;

const PDF_DATA_URL_PREFIX: &str = "data:application/pdf;base64,";

/// Decode a base64 document, with or without a `data:application/pdf` prefix.
pub fn decode_document(input: &str) -> std::result::Result<Vec<u8>, InputError> {
    let payload = input.trim();
    let payload = payload.strip_prefix(PDF_DATA_URL_PREFIX).unwrap_or(payload);
    if payload.is_empty() {
        return Err(InputError::Empty);
    }
    BASE64
        .decode(payload)
        .map_err(|e| InputError::Base64(e.to_string()))
}

/// RENACH form extractor over a [`DocumentBackend`].
pub struct RenachExtractor<B> {
    backend: Arc<B>,
    config: RenachConfig,
}

impl<B: DocumentBackend + 'static> RenachExtractor<B> {
    pub fn new(backend: B, config: RenachConfig) -> Self {
        Self {
            backend: Arc::new(backend),
            config,
        }
    }

    pub fn config(&self) -> &RenachConfig {
        &self.config
    }

    /// Extract from a base64 payload. Never fails; errors become `success=false`.
    pub async fn extract_base64(&self, input: &str) -> ExtractionResult {
        match decode_document(input) {
            Ok(data) => self.extract(data).await,
            Err(e) => {
                warn!("Rejected input: {}", e);
                ExtractionResult::failure(crate::error::RenachError::from(e).to_string())
            }
        }
    }

    /// Extract from raw PDF bytes. Never fails; errors become `success=false`.
    pub async fn extract(&self, data: Vec<u8>) -> ExtractionResult {
        match self.try_extract(data).await {
            Ok((parsed, photo)) => ExtractionResult::success(parsed.record, photo),
            Err(e) => {
                warn!("Extraction failed: {}", e);
                ExtractionResult::failure(e.to_string())
            }
        }
    }

    /// Extract from raw PDF bytes, returning the parse details and photo.
    pub async fn try_extract(&self, data: Vec<u8>) -> Result<(ParseResult, Option<String>)> {
        let start = Instant::now();
        self.check_input(&data)?;
        info!("Extracting RENACH form from {} byte PDF", data.len());

        let data: Arc<[u8]> = data.into();
        let (parsed, photo) = tokio::join!(
            self.text_stage(Arc::clone(&data)),
            self.photo_stage(Arc::clone(&data))
        );
        let parsed = parsed?;

        for warning in &parsed.warnings {
            debug!("{}", warning);
        }
        info!(
            "Extracted {} fields, photo {} in {}ms",
            parsed.record.len(),
            if photo.is_some() { "present" } else { "absent" },
            start.elapsed().as_millis()
        );
        Ok((parsed, photo))
    }

    fn check_input(&self, data: &[u8]) -> std::result::Result<(), InputError> {
        let max = self.config.limits.max_document_bytes;
        if data.is_empty() {
            Err(InputError::Empty)
        } else if data.len() > max {
            Err(InputError::TooLarge {
                size: data.len(),
                max,
            })
        } else {
            Ok(())
        }
    }

    async fn text_stage(&self, data: Arc<[u8]>) -> Result<ParseResult> {
        let backend = Arc::clone(&self.backend);
        let parser = RenachParser::from_config(&self.config.extraction);
        let budget_ms = self.config.limits.text_timeout_ms;

        let task = tokio::task::spawn_blocking(move || -> Result<ParseResult> {
            let text = backend.extract_text(&data)?;
            Ok(parser.parse(&text))
        });

        match timeout(Duration::from_millis(budget_ms), task).await {
            Ok(joined) => joined.map_err(|e| worker_failed("text", e))?,
            Err(_) => Err(ExtractionError::Timeout {
                stage: "text",
                budget_ms,
            }
            .into()),
        }
    }

    async fn photo_stage(&self, data: Arc<[u8]>) -> Option<String> {
        if !self.config.photo.enabled {
            return None;
        }
        let backend = Arc::clone(&self.backend);
        let scale = self.config.pdf.render_scale;
        let photo_config = self.config.photo.clone();
        let budget_ms = self.config.limits.photo_timeout_ms;

        let task = tokio::task::spawn_blocking(move || -> Result<String> {
            let page = backend.render_first_page(&data, scale)?;
            Ok(extract_photo(&page, &photo_config)?)
        });

        let outcome = match timeout(Duration::from_millis(budget_ms), task).await {
            Ok(joined) => joined.map_err(|e| worker_failed("photo", e)).and_then(|r| r),
            Err(_) => Err(ExtractionError::Timeout {
                stage: "photo",
                budget_ms,
            }
            .into()),
        };

        outcome
            .inspect_err(|e| warn!("Photo dropped: {}", e))
            .ok()
    }
}

fn worker_failed(stage: &'static str, e: JoinError) -> crate::error::RenachError {
    ExtractionError::Worker {
        stage,
        reason: e.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PdfError;
    use crate::models::record::Field;
    use image::{DynamicImage, RgbImage};

    struct FakeBackend {
        text: &'static str,
        text_delay: Duration,
        text_error: Option<&'static str>,
        render: bool,
        render_delay: Duration,
    }

    impl FakeBackend {
        fn new(text: &'static str) -> Self {
            Self {
                text,
                text_delay: Duration::ZERO,
                text_error: None,
                render: true,
                render_delay: Duration::ZERO,
            }
        }
    }

    impl DocumentBackend for FakeBackend {
        fn extract_text(&self, _data: &[u8]) -> crate::pdf::Result<String> {
            std::thread::sleep(self.text_delay);
            match self.text_error {
                Some(reason) => Err(PdfError::TextExtraction(reason.to_string())),
                None => Ok(self.text.to_string()),
            }
        }

        fn render_first_page(&self, _data: &[u8], _scale: f32) -> crate::pdf::Result<DynamicImage> {
            std::thread::sleep(self.render_delay);
            if self.render {
                Ok(DynamicImage::ImageRgb8(RgbImage::new(400, 600)))
            } else {
                Err(PdfError::Render("no raster".to_string()))
            }
        }
    }

    const FORM: &str = "Nome: MARIA APARECIDA SOUZA\nCategoria Pretendida: B\nResultado: Apto\n";

    #[tokio::test]
    async fn test_text_and_photo() {
        let extractor = RenachExtractor::new(FakeBackend::new(FORM), RenachConfig::default());
        let result = extractor.extract(b"%PDF-1.4".to_vec()).await;

        assert!(result.success);
        assert_eq!(result.record.get(Field::Nome), Some("MARIA APARECIDA SOUZA"));
        assert!(result.photo.unwrap().starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_photo_failure_is_not_fatal() {
        let backend = FakeBackend {
            render: false,
            ..FakeBackend::new(FORM)
        };
        let result = RenachExtractor::new(backend, RenachConfig::default())
            .extract(b"%PDF-1.4".to_vec())
            .await;

        assert!(result.success);
        assert!(result.photo.is_none());
        assert_eq!(result.record.get(Field::ResultadoExame), Some("Apto"));
    }

    #[tokio::test]
    async fn test_text_timeout_fails_call() {
        let backend = FakeBackend {
            text_delay: Duration::from_millis(300),
            ..FakeBackend::new(FORM)
        };
        let mut config = RenachConfig::default();
        config.limits.text_timeout_ms = 20;

        let result = RenachExtractor::new(backend, config)
            .extract(b"%PDF-1.4".to_vec())
            .await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_photo_timeout_keeps_record() {
        let backend = FakeBackend {
            render_delay: Duration::from_millis(300),
            ..FakeBackend::new(FORM)
        };
        let mut config = RenachConfig::default();
        config.limits.photo_timeout_ms = 20;

        let result = RenachExtractor::new(backend, config)
            .extract(b"%PDF-1.4".to_vec())
            .await;

        assert!(result.success);
        assert!(result.photo.is_none());
        assert!(result.error.is_none());
        assert_eq!(result.record.get(Field::Nome), Some("MARIA APARECIDA SOUZA"));
    }

    #[tokio::test]
    async fn test_text_error_message_is_kept() {
        let backend = FakeBackend {
            text_error: Some("unsupported font encoding"),
            ..FakeBackend::new(FORM)
        };
        let result = RenachExtractor::new(backend, RenachConfig::default())
            .extract(b"%PDF-1.4".to_vec())
            .await;

        assert!(!result.success);
        assert!(result.record.is_empty());
        assert!(result.photo.is_none());
        assert!(result.error.unwrap().contains("unsupported font encoding"));
    }

    #[tokio::test]
    async fn test_input_checks() {
        let mut config = RenachConfig::default();
        config.limits.max_document_bytes = 4;
        let extractor = RenachExtractor::new(FakeBackend::new(FORM), config);

        assert!(!extractor.extract(Vec::new()).await.success);
        assert!(!extractor.extract(b"%PDF-1.4".to_vec()).await.success);
        assert!(!extractor.extract_base64("@@not base64@@").await.success);
        assert!(!extractor.extract_base64(PDF_DATA_URL_PREFIX).await.success);
    }

    #[test]
    fn test_decode_document_prefix() {
        let plain = decode_document("JVBERg==").unwrap();
        let prefixed = decode_document("data:application/pdf;base64,JVBERg==").unwrap();
        assert_eq!(plain, b"%PDF");
        assert_eq!(plain, prefixed);
    }
}
