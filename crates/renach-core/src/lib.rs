//! Core library for RENACH driving-license form extraction.
//!
//! This crate provides:
//! - PDF processing (text and page 1 bitmap)
//! - Rule-based field extraction (names, documents, category, address, exam)
//! - Identity photo cropping
//! - A concurrent pipeline with per-stage time budgets

#![recursion_limit = "256"]

pub mod error;
pub mod form;
pub mod models;
pub mod pdf;
pub mod photo;
pub mod pipeline;

pub use error::{RenachError, Result};
pub use form::{FormParser, ParseResult, RenachParser, compose_address};
pub use models::{ExtractedRecord, ExtractionResult, Field, RenachConfig};
pub use pdf::{DocumentBackend, LopdfBackend};
pub use photo::{PhotoRegion, compute_crop_rect};
pub use pipeline::{RenachExtractor, decode_document};
