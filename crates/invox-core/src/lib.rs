//! Core library for invoice OCR field extraction.
//!
//! This crate provides:
//! - PDF rasterization (lopdf validation, `pdftoppm` rendering)
//! - Image preprocessing (denoising, adaptive thresholding)
//! - Text recognition through Tesseract or PaddleOCR models
//! - Rule-based extraction of invoice fields (number, dates, parties, amounts, currency)
//! - An orchestrator and background job tying the stages together

pub mod error;
pub mod invoice;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;

pub use error::{InvoxError, OcrError, PdfError, PipelineError, Result};
pub use invoice::{extract_fields, InvoiceParser, RuleBasedParser};
pub use models::config::InvoxConfig;
pub use models::invoice::{ExtractionResult, FieldName, FieldSet, RecognizedText};
pub use ocr::{EngineKind, OcrBackend, TextRecognitionAdapter};
pub use pdf::{PageImage, RasterizedDocument, Rasterizer};
pub use pipeline::{ExtractionJob, ExtractionState, JobEvent, Orchestrator, ProgressSink};
