//! Error types for the renach-core library.

use thiserror::Error;

/// Main error type for the renach library.
#[derive(Error, Debug)]
pub enum RenachError {
    /// Rejected input document.
    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Photo cropping error.
    #[error("photo error: {0}")]
    Photo(#[from] PhotoError),

    /// Pipeline error (timeouts, worker failures).
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),
}

/// Errors raised before any extraction is attempted.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InputError {
    /// No bytes or an empty string were supplied.
    #[error("document is empty")]
    Empty,

    /// The document exceeds the configured size limit.
    #[error("document is {size} bytes, limit is {max} bytes")]
    TooLarge { size: usize, max: usize },

    /// The base64 payload could not be decoded.
    #[error("document is not valid base64: {0}")]
    Base64(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to produce a bitmap for a page.
    #[error("failed to render page: {0}")]
    Render(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors from the photo crop path. Never fatal for an extraction.
#[derive(Error, Debug)]
pub enum PhotoError {
    /// The crop rectangle does not fit the page, even after clamping.
    #[error("crop {width}x{height}+{left}+{top} exceeds page {page_width}x{page_height}")]
    OutOfBounds {
        left: u32,
        top: u32,
        width: u32,
        height: u32,
        page_width: u32,
        page_height: u32,
    },

    /// PNG encoding failed.
    #[error("encode failed: {0}")]
    Encode(String),

    /// Not a `data:image/...;base64,` URL.
    #[error("invalid data URL: {0}")]
    DataUrl(String),
}

/// Errors from the concurrent extraction pipeline.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// A stage did not finish within its budget.
    #[error("{stage} timed out after {budget_ms}ms")]
    Timeout { stage: &'static str, budget_ms: u64 },

    /// A blocking worker panicked or was cancelled.
    #[error("{stage} worker failed: {reason}")]
    Worker { stage: &'static str, reason: String },
}

/// Result type for the renach library.
pub type Result<T> = std::result::Result<T, RenachError>;
