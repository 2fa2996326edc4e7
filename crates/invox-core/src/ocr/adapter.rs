//! Dispatch between OCR backends.

use std::borrow::Cow;
use std::path::Path;

use image::DynamicImage;
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::models::invoice::RecognizedText;

use super::{EngineKind, ImageInput, ImagePreprocessor, OcrBackend};

/// Uniform entry point over the configured OCR backends.
///
/// Recognition problems on a single page (undecodable image, engine
/// failure) degrade to empty text; only asking for an engine that was never
/// configured is an error.
pub struct TextRecognitionAdapter {
    preprocessor: ImagePreprocessor,
    backends: Vec<Box<dyn OcrBackend>>,
}

impl TextRecognitionAdapter {
    pub fn new(preprocessor: ImagePreprocessor) -> Self {
        Self {
            preprocessor,
            backends: Vec::new(),
        }
    }

    /// Register a backend; a later backend of the same kind replaces it.
    pub fn with_backend(mut self, backend: Box<dyn OcrBackend>) -> Self {
        self.backends.retain(|b| b.kind() != backend.kind());
        self.backends.push(backend);
        self
    }

    /// Engines that can be requested.
    pub fn available_engines(&self) -> Vec<EngineKind> {
        self.backends.iter().map(|b| b.kind()).collect()
    }

    pub fn has_engine(&self, engine: EngineKind) -> bool {
        self.backend(engine).is_some()
    }

    fn backend(&self, engine: EngineKind) -> Option<&dyn OcrBackend> {
        self.backends
            .iter()
            .find(|b| b.kind() == engine)
            .map(|b| b.as_ref())
    }

    /// Recognize the text of an image file.
    pub fn recognize_file(
        &self,
        engine: EngineKind,
        path: &Path,
    ) -> Result<RecognizedText, PipelineError> {
        let backend = self
            .backend(engine)
            .ok_or_else(|| PipelineError::EngineUnavailable(engine.to_string()))?;

        let image = match image::open(path) {
            Ok(image) => image,
            Err(e) => {
                warn!("Could not decode {}: {}", path.display(), e);
                return Ok(RecognizedText::empty());
            }
        };

        Ok(self.run(backend, &image))
    }

    /// Recognize the text of an already decoded image.
    pub fn recognize_image(
        &self,
        engine: EngineKind,
        image: &DynamicImage,
    ) -> Result<RecognizedText, PipelineError> {
        let backend = self
            .backend(engine)
            .ok_or_else(|| PipelineError::EngineUnavailable(engine.to_string()))?;
        Ok(self.run(backend, image))
    }

    fn run(&self, backend: &dyn OcrBackend, image: &DynamicImage) -> RecognizedText {
        let input = match backend.input() {
            ImageInput::Preprocessed => {
                Cow::Owned(DynamicImage::ImageLuma8(self.preprocessor.process(image)))
            }
            ImageInput::Original => Cow::Borrowed(image),
        };

        match backend.recognize(&input) {
            Ok(text) => {
                debug!("{} recognized {} characters", backend.kind(), text.len());
                RecognizedText::new(text)
            }
            Err(e) => {
                warn!("{} recognition failed: {}", backend.kind(), e);
                RecognizedText::empty()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::{Arc, Mutex};

    use image::ColorType;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::OcrError;
    use crate::ocr::mock::MockBackend;

    /// Backend that records the color type of every image it receives.
    struct RecordingBackend {
        input: ImageInput,
        seen: Arc<Mutex<Vec<ColorType>>>,
    }

    impl OcrBackend for RecordingBackend {
        fn kind(&self) -> EngineKind {
            EngineKind::Tesseract
        }

        fn input(&self) -> ImageInput {
            self.input
        }

        fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
            self.seen.lock().unwrap().push(image.color());
            Ok("seen".to_string())
        }
    }

    fn rgb_image() -> DynamicImage {
        DynamicImage::new_rgb8(16, 16)
    }

    #[test]
    fn test_dispatches_to_requested_engine() {
        let adapter = TextRecognitionAdapter::new(ImagePreprocessor::default())
            .with_backend(Box::new(MockBackend::replying(EngineKind::Tesseract, "from tesseract")))
            .with_backend(Box::new(MockBackend::replying(EngineKind::Paddle, "from paddle")));

        let text = adapter.recognize_image(EngineKind::Paddle, &rgb_image()).unwrap();
        assert_eq!(text.as_str(), "from paddle");
        assert_eq!(adapter.available_engines(), vec![EngineKind::Tesseract, EngineKind::Paddle]);
    }

    #[test]
    fn test_missing_engine_is_an_error() {
        let adapter = TextRecognitionAdapter::new(ImagePreprocessor::default())
            .with_backend(Box::new(MockBackend::replying(EngineKind::Tesseract, "x")));

        let err = adapter.recognize_image(EngineKind::Paddle, &rgb_image()).unwrap_err();
        assert!(matches!(err, PipelineError::EngineUnavailable(_)));
        assert!(!adapter.has_engine(EngineKind::Paddle));
    }

    #[test]
    fn test_backend_failure_degrades_to_empty_text() {
        let adapter = TextRecognitionAdapter::new(ImagePreprocessor::default())
            .with_backend(Box::new(MockBackend::failing(EngineKind::Tesseract, "crashed")));

        let text = adapter.recognize_image(EngineKind::Tesseract, &rgb_image()).unwrap();
        assert!(text.is_empty());
    }

    #[test]
    fn test_preprocessed_backend_receives_grayscale() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let adapter = TextRecognitionAdapter::new(ImagePreprocessor::default()).with_backend(
            Box::new(RecordingBackend {
                input: ImageInput::Preprocessed,
                seen: Arc::clone(&seen),
            }),
        );

        adapter.recognize_image(EngineKind::Tesseract, &rgb_image()).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![ColorType::L8]);
    }

    #[test]
    fn test_original_backend_receives_unmodified_image() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let adapter = TextRecognitionAdapter::new(ImagePreprocessor::default()).with_backend(
            Box::new(RecordingBackend {
                input: ImageInput::Original,
                seen: Arc::clone(&seen),
            }),
        );

        adapter.recognize_image(EngineKind::Tesseract, &rgb_image()).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![ColorType::Rgb8]);
    }

    #[test]
    fn test_undecodable_file_yields_empty_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();

        let backend = MockBackend::replying(EngineKind::Tesseract, "unused");
        let calls = Arc::clone(&backend.calls);
        let adapter =
            TextRecognitionAdapter::new(ImagePreprocessor::default()).with_backend(Box::new(backend));

        let text = adapter.recognize_file(EngineKind::Tesseract, &path).unwrap();
        assert!(text.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_recognize_file_reads_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        rgb_image().save(&path).unwrap();

        let adapter = TextRecognitionAdapter::new(ImagePreprocessor::default())
            .with_backend(Box::new(MockBackend::replying(EngineKind::Tesseract, "INVOICE 1")));

        let text = adapter.recognize_file(EngineKind::Tesseract, &path).unwrap();
        assert_eq!(text.as_str(), "INVOICE 1");
    }
}
