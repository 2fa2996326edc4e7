//! Data models and configuration.

pub mod config;
pub mod invoice;

pub use config::{InvoxConfig, OcrConfig, PaddleConfig, PdfConfig, PreprocessConfig, TesseractConfig};
pub use invoice::{ExtractionResult, FieldName, FieldSet, RecognizedText};
