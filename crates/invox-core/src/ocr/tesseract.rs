//! Tesseract backend driven through the `tesseract` command-line tool.

use std::process::Command;

use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::error::OcrError;
use crate::models::config::TesseractConfig;

use super::{EngineKind, ImageInput, OcrBackend};

/// OCR backend that shells out to Tesseract.
#[derive(Debug, Clone)]
pub struct TesseractBackend {
    config: TesseractConfig,
}

impl TesseractBackend {
    pub fn new(config: TesseractConfig) -> Self {
        Self { config }
    }

    /// Whether the configured binary can be executed.
    pub fn is_available(&self) -> bool {
        Command::new(&self.config.binary)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Arguments that follow the image path and output target.
    fn engine_args(&self) -> Vec<String> {
        vec![
            "-l".to_string(),
            self.config.language.clone(),
            "--oem".to_string(),
            self.config.engine_mode.to_string(),
            "--psm".to_string(),
            self.config.page_segmentation_mode.to_string(),
            "-c".to_string(),
            format!("tessedit_char_whitelist={}", self.config.char_whitelist),
        ]
    }

    fn engine_error(&self, reason: impl Into<String>) -> OcrError {
        OcrError::Engine {
            engine: EngineKind::Tesseract.display_name().to_string(),
            reason: reason.into(),
        }
    }
}

impl OcrBackend for TesseractBackend {
    fn kind(&self) -> EngineKind {
        EngineKind::Tesseract
    }

    fn input(&self) -> ImageInput {
        ImageInput::Preprocessed
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let page = tempfile::Builder::new()
            .prefix("invox-page-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| self.engine_error(format!("failed to create temp file: {e}")))?;

        image
            .save_with_format(page.path(), ImageFormat::Png)
            .map_err(|e| OcrError::InvalidImage(e.to_string()))?;

        let output = Command::new(&self.config.binary)
            .arg(page.path())
            .arg("stdout")
            .args(self.engine_args())
            .output()
            .map_err(|e| {
                self.engine_error(format!(
                    "failed to run '{}' (is it installed?): {e}",
                    self.config.binary
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.engine_error(format!(
                "exit code {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!("Tesseract returned {} characters", text.len());
        Ok(text)
    }
}
