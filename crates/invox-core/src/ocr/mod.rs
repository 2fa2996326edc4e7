//! Text recognition: preprocessing, OCR backends and the adapter that
//! dispatches between them.

mod adapter;
mod preprocessing;
#[cfg(feature = "native")]
mod pure_engine;
mod tesseract;

pub use adapter::TextRecognitionAdapter;
pub use preprocessing::ImagePreprocessor;
#[cfg(feature = "native")]
pub use pure_engine::PaddleBackend;
pub use tesseract::TesseractBackend;

use std::fmt;
use std::str::FromStr;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Selectable OCR engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Tesseract, run on the preprocessed page image.
    Tesseract,
    /// PaddleOCR detection + recognition models, run on the original image.
    Paddle,
}

impl EngineKind {
    pub const ALL: [EngineKind; 2] = [EngineKind::Tesseract, EngineKind::Paddle];

    /// Identifier used in configuration files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Tesseract => "tesseract",
            EngineKind::Paddle => "paddle",
        }
    }

    /// Human-readable engine name.
    pub fn display_name(&self) -> &'static str {
        match self {
            EngineKind::Tesseract => "Tesseract",
            EngineKind::Paddle => "PaddleOCR",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tesseract" => Ok(EngineKind::Tesseract),
            "paddle" | "paddleocr" => Ok(EngineKind::Paddle),
            other => Err(format!("unknown OCR engine: '{other}'")),
        }
    }
}

/// Which version of the page image a backend consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageInput {
    /// Grayscale, denoised, binarized image.
    Preprocessed,
    /// Image as decoded from disk.
    Original,
}

/// A detected text region with its recognized content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Quadrilateral corners (x1, y1, x2, y2, x3, y3, x4, y4).
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence (0.0 - 1.0).
    pub confidence: f32,
}

/// Join the text of boxes scoring strictly above `min_confidence`, one box
/// per line, in detection order.
pub fn join_confident_lines(boxes: &[TextBox], min_confidence: f32) -> String {
    boxes
        .iter()
        .filter(|b| b.confidence > min_confidence)
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// An OCR engine able to turn one page image into text.
pub trait OcrBackend: Send + Sync {
    /// Engine this backend implements.
    fn kind(&self) -> EngineKind;

    /// Image variant the backend expects.
    fn input(&self) -> ImageInput;

    /// Recognize the text on one page.
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}
