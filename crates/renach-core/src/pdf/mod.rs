//! PDF processing module.
//!
//! The pipeline only needs two things from a PDF: its full text and a bitmap
//! of page 1 for the photo crop. Both sit behind [`DocumentBackend`] so the
//! pipeline can run against a fake in tests.

mod extractor;

pub use extractor::LopdfBackend;

use crate::error::PdfError;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Text and bitmap source for one PDF document.
///
/// Implementations are called from blocking worker threads, once per
/// document, and must not keep per-document state between calls.
pub trait DocumentBackend: Send + Sync {
    /// Extract the full text of the document in reading order.
    fn extract_text(&self, data: &[u8]) -> Result<String>;

    /// Produce a bitmap of page 1 at `scale` pixels per point.
    fn render_first_page(&self, data: &[u8], scale: f32) -> Result<DynamicImage>;
}
