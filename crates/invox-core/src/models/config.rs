//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{InvoxError, Result};
use crate::ocr::EngineKind;

/// Main configuration for the invox pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoxConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Image preprocessing configuration.
    pub preprocess: PreprocessConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Engine used when the caller does not pick one.
    pub default_engine: EngineKind,

    /// Tesseract backend settings.
    pub tesseract: TesseractConfig,

    /// PaddleOCR backend settings.
    pub paddle: PaddleConfig,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            default_engine: EngineKind::Tesseract,
            tesseract: TesseractConfig::default(),
            paddle: PaddleConfig::default(),
        }
    }
}

/// Characters Tesseract is allowed to emit.
pub const DEFAULT_CHAR_WHITELIST: &str =
    "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz.,:-/()£$€@# ";

/// Tesseract command-line settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseractConfig {
    /// Path or name of the `tesseract` executable.
    pub binary: String,

    /// Recognition language.
    pub language: String,

    /// OCR engine mode (`--oem`).
    pub engine_mode: u8,

    /// Page segmentation mode (`--psm`); 6 assumes a uniform block of text.
    pub page_segmentation_mode: u8,

    /// Character whitelist passed as `tessedit_char_whitelist`.
    pub char_whitelist: String,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
            language: "eng".to_string(),
            engine_mode: 3,
            page_segmentation_mode: 6,
            char_whitelist: DEFAULT_CHAR_WHITELIST.to_string(),
        }
    }
}

/// PaddleOCR model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaddleConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Detections at or below this confidence are dropped.
    pub min_confidence: f32,
}

impl Default for PaddleConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            min_confidence: 0.3,
        }
    }
}

impl PaddleConfig {
    /// Get full path to a model file.
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.model_dir.join(model_name)
    }
}

/// Image preprocessing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Non-local-means filter strength.
    pub denoise_strength: f32,

    /// Side of the square patch compared by the denoiser (odd).
    pub template_window: u32,

    /// Side of the square area searched for similar patches (odd).
    pub search_window: u32,

    /// Side of the Gaussian neighbourhood used by adaptive thresholding (odd).
    pub threshold_block_size: u32,

    /// Constant subtracted from the local mean.
    pub threshold_offset: i32,

    /// Side of the square structuring element used for closing.
    pub morph_kernel_size: u32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            denoise_strength: 3.0,
            template_window: 7,
            search_window: 21,
            threshold_block_size: 11,
            threshold_offset: 2,
            morph_kernel_size: 1,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Path or name of the `pdftoppm` executable.
    pub pdftoppm_binary: String,

    /// Linear upscale factor applied when rendering pages (1.0 = 72 DPI).
    pub render_scale: f32,

    /// OCR every page instead of only the first.
    pub process_all_pages: bool,

    /// Maximum pages to render (0 = unlimited).
    pub max_pages: u32,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            pdftoppm_binary: "pdftoppm".to_string(),
            render_scale: 2.0,
            process_all_pages: false,
            max_pages: 0,
        }
    }
}

impl PdfConfig {
    /// Render resolution for the configured scale.
    pub fn render_dpi(&self) -> u32 {
        (72.0 * self.render_scale).round().max(1.0) as u32
    }
}

impl InvoxConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| InvoxError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| InvoxError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
