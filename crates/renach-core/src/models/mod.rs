//! Data models shared by the engine, the pipeline, and the CLI.

pub mod config;
pub mod record;

pub use config::RenachConfig;
pub use record::{ExtractedRecord, ExtractionResult, Field};
