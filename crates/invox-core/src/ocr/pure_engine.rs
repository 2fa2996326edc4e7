//! PaddleOCR backend using `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).

use std::sync::Mutex;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::PaddleConfig;

use super::{join_confident_lines, EngineKind, ImageInput, OcrBackend, TextBox};

/// PaddleOCR detection + recognition pipeline.
///
/// Models are loaded once at construction and reused for every page; calls
/// are serialized on the engine.
pub struct PaddleBackend {
    engine: Mutex<pure_onnx_ocr::engine::OcrEngine>,
    min_confidence: f32,
}

impl PaddleBackend {
    /// Load the models named in the configuration.
    pub fn from_config(config: &PaddleConfig) -> Result<Self, OcrError> {
        let det_path = config.model_path(&config.detection_model);
        let rec_path = config.model_path(&config.recognition_model);
        let dict_path = config.model_path(&config.dictionary);

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded PaddleOCR models from {}", config.model_dir.display());

        Ok(Self {
            engine: Mutex::new(engine),
            min_confidence: config.min_confidence,
        })
    }

    /// Detect and recognize text regions, in detection order.
    pub fn detect(&self, image: &DynamicImage) -> Result<Vec<TextBox>, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        let engine_error = |reason: String| OcrError::Engine {
            engine: EngineKind::Paddle.display_name().to_string(),
            reason,
        };

        let engine = self
            .engine
            .lock()
            .map_err(|e| engine_error(format!("engine lock poisoned: {e}")))?;
        let results = engine
            .run_from_image(image)
            .map_err(|e| engine_error(e.to_string()))?;

        let boxes: Vec<TextBox> = results
            .iter()
            .map(|r| TextBox {
                bbox: polygon_to_bbox(&r.bounding_box),
                text: r.text.clone(),
                confidence: r.confidence,
            })
            .collect();

        debug!(
            "PaddleOCR found {} text regions in {}x{} image in {}ms",
            boxes.len(),
            width,
            height,
            start.elapsed().as_millis()
        );

        Ok(boxes)
    }
}

impl OcrBackend for PaddleBackend {
    fn kind(&self) -> EngineKind {
        EngineKind::Paddle
    }

    fn input(&self) -> ImageInput {
        ImageInput::Original
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let boxes = self.detect(image)?;
        Ok(join_confident_lines(&boxes, self.min_confidence))
    }
}

/// Convert a `Polygon<f64>` to our `[f32; 8]` bbox format.
///
/// Takes the first 4 exterior points as `[x1, y1, x2, y2, x3, y3, x4, y4]`.
fn polygon_to_bbox(polygon: &pure_onnx_ocr::Polygon<f64>) -> [f32; 8] {
    let mut bbox = [0.0f32; 8];
    for (i, coord) in polygon.exterior().coords().take(4).enumerate() {
        bbox[i * 2] = coord.x as f32;
        bbox[i * 2 + 1] = coord.y as f32;
    }
    bbox
}
