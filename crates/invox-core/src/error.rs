//! Error types for the invox-core library.

use thiserror::Error;

/// Main error type for the invox library.
#[derive(Error, Debug)]
pub enum InvoxError {
    /// Extraction pipeline error.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// The external page renderer failed.
    #[error("failed to render pages: {0}")]
    Render(String),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// The OCR engine could not be run or returned a failure.
    #[error("{engine} failed: {reason}")]
    Engine { engine: String, reason: String },

    /// Image could not be handed to the engine.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Faults that move an extraction into the failed state.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The input extension is neither a PDF nor a supported image.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Rasterization produced no pages.
    #[error("failed to convert PDF to images")]
    NoPages,

    /// The requested OCR engine is not configured.
    #[error("OCR engine {0} is not available")]
    EngineUnavailable(String),

    /// The background worker died before reporting an outcome.
    #[error("extraction worker failed: {0}")]
    Worker(String),
}

/// Result type for the invox library.
pub type Result<T> = std::result::Result<T, InvoxError>;
