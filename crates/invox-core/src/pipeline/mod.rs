//! Extraction orchestration: one input file to one [`ExtractionResult`].

mod job;

pub use job::{ExtractionJob, JobEvent};

use std::fmt;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::invoice::{InvoiceParser, RuleBasedParser};
use crate::models::config::InvoxConfig;
use crate::models::invoice::{ExtractionResult, RecognizedText};
use crate::ocr::{EngineKind, ImagePreprocessor, TesseractBackend, TextRecognitionAdapter};
use crate::pdf::{PageImage, PdftoppmRasterizer, Rasterizer};

/// File extensions accepted as raster images.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "tiff", "tif"];

/// Lifecycle of a single extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionState {
    Idle,
    /// PDF inputs only.
    Rasterizing,
    Recognizing,
    Extracting,
    Done,
    Failed,
}

impl fmt::Display for ExtractionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtractionState::Idle => "idle",
            ExtractionState::Rasterizing => "rasterizing",
            ExtractionState::Recognizing => "recognizing",
            ExtractionState::Extracting => "extracting",
            ExtractionState::Done => "done",
            ExtractionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Observer of state transitions.
pub trait ProgressSink {
    fn report(&mut self, state: ExtractionState, message: &str);
}

impl<F: FnMut(ExtractionState, &str)> ProgressSink for F {
    fn report(&mut self, state: ExtractionState, message: &str) {
        self(state, message)
    }
}

/// Sink that discards progress.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _state: ExtractionState, _message: &str) {}
}

/// Kind of input, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    Image,
}

impl InputKind {
    /// Classify a path by its extension, case-insensitively.
    pub fn from_path(path: &Path) -> std::result::Result<Self, PipelineError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if ext == "pdf" {
            Ok(InputKind::Pdf)
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Ok(InputKind::Image)
        } else if ext.is_empty() {
            Err(PipelineError::UnsupportedFormat(path.display().to_string()))
        } else {
            Err(PipelineError::UnsupportedFormat(format!(".{ext}")))
        }
    }
}

/// Runs rasterization, recognition and field extraction for one file.
///
/// Stateless between calls, so a single orchestrator can be shared across
/// sequential jobs.
pub struct Orchestrator {
    rasterizer: Box<dyn Rasterizer>,
    recognition: TextRecognitionAdapter,
    parser: Box<dyn InvoiceParser>,
    process_all_pages: bool,
}

impl Orchestrator {
    pub fn new(
        rasterizer: Box<dyn Rasterizer>,
        recognition: TextRecognitionAdapter,
        parser: Box<dyn InvoiceParser>,
    ) -> Self {
        Self {
            rasterizer,
            recognition,
            parser,
            process_all_pages: false,
        }
    }

    /// Recognize every page of a PDF instead of only the first.
    pub fn with_all_pages(mut self, enabled: bool) -> Self {
        self.process_all_pages = enabled;
        self
    }

    /// Build the default pipeline from configuration.
    ///
    /// Tesseract is always registered. PaddleOCR is registered only when its
    /// models load.
    pub fn from_config(config: &InvoxConfig) -> Self {
        let preprocessor = ImagePreprocessor::new(&config.preprocess);
        #[allow(unused_mut)]
        let mut recognition = TextRecognitionAdapter::new(preprocessor)
            .with_backend(Box::new(TesseractBackend::new(config.ocr.tesseract.clone())));

        #[cfg(feature = "native")]
        {
            match crate::ocr::PaddleBackend::from_config(&config.ocr.paddle) {
                Ok(backend) => recognition = recognition.with_backend(Box::new(backend)),
                Err(e) => info!("PaddleOCR unavailable: {}", e),
            }
        }

        Self::new(
            Box::new(PdftoppmRasterizer::new(&config.pdf)),
            recognition,
            Box::new(RuleBasedParser::new()),
        )
        .with_all_pages(config.pdf.process_all_pages)
    }

    /// Engines that can be requested from this orchestrator.
    pub fn available_engines(&self) -> Vec<EngineKind> {
        self.recognition.available_engines()
    }

    /// Extract invoice fields from one file.
    ///
    /// Every fault ends the extraction with an error; progress is reported
    /// to `progress` at each transition, including the terminal one.
    pub fn process(
        &self,
        path: &Path,
        engine: EngineKind,
        progress: &mut dyn ProgressSink,
    ) -> Result<ExtractionResult> {
        progress.report(ExtractionState::Idle, "Starting OCR processing...");

        match self.run(path, engine, progress) {
            Ok(result) => {
                info!(
                    "Extracted {} fields from {} using {}",
                    result.fields.filled_count(),
                    path.display(),
                    engine
                );
                progress.report(ExtractionState::Done, "OCR processing completed!");
                Ok(result)
            }
            Err(e) => {
                debug!("Extraction of {} failed: {}", path.display(), e);
                progress.report(ExtractionState::Failed, &e.to_string());
                Err(e)
            }
        }
    }

    fn run(
        &self,
        path: &Path,
        engine: EngineKind,
        progress: &mut dyn ProgressSink,
    ) -> Result<ExtractionResult> {
        // A missing image decodes to no text; a missing PDF yields no pages
        let kind = InputKind::from_path(path)?;
        if !self.recognition.has_engine(engine) {
            return Err(PipelineError::EngineUnavailable(engine.to_string()).into());
        }

        let (raw_text, pages_processed) = match kind {
            InputKind::Pdf => {
                progress.report(ExtractionState::Rasterizing, "Converting PDF to images...");
                // Page images are removed when `document` goes out of scope
                let document = self.rasterizer.rasterize(path);
                if document.is_empty() {
                    return Err(PipelineError::NoPages.into());
                }

                let pages = if self.process_all_pages {
                    document.pages()
                } else {
                    &document.pages()[..1]
                };
                debug!("Recognizing {} of {} page(s)", pages.len(), document.len());

                progress.report(
                    ExtractionState::Recognizing,
                    &format!("Extracting text using {engine}..."),
                );
                let texts = pages
                    .iter()
                    .map(|page| self.recognize_page(engine, page))
                    .collect::<std::result::Result<Vec<_>, _>>()?;

                (RecognizedText::new(texts.join("\n\n")), pages.len())
            }
            InputKind::Image => {
                progress.report(
                    ExtractionState::Recognizing,
                    &format!("Extracting text using {engine}..."),
                );
                (self.recognition.recognize_file(engine, path)?, 1)
            }
        };

        progress.report(ExtractionState::Extracting, "Extracting invoice fields...");
        let fields = self.parser.parse(&raw_text);

        Ok(ExtractionResult {
            source_file: path.to_path_buf(),
            raw_text,
            fields,
            engine,
            pages_processed,
        })
    }

    fn recognize_page(
        &self,
        engine: EngineKind,
        page: &PageImage,
    ) -> std::result::Result<String, PipelineError> {
        let text = match page.load() {
            Some(image) => self.recognition.recognize_image(engine, &image)?,
            None => RecognizedText::empty(),
        };
        Ok(text.into())
    }
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::fixtures::*;
    use super::*;
    use crate::error::InvoxError;
    use crate::models::invoice::FieldSet;
    use crate::ocr::mock::MockBackend;

    const INVOICE_TEXT: &str = "Acme Ltd\nINVOICE NO: A100\nDate 10/01/2024\nTOTAL: £1,234.56";

    fn collect(
        orchestrator: &Orchestrator,
        path: &Path,
        engine: EngineKind,
    ) -> (Result<ExtractionResult>, Vec<(ExtractionState, String)>) {
        let mut events = Vec::new();
        let mut sink = |state: ExtractionState, message: &str| {
            events.push((state, message.to_string()));
        };
        let result = orchestrator.process(path, engine, &mut sink);
        (result, events)
    }

    #[test]
    fn test_image_input_runs_all_stages() {
        let dir = tempfile::tempdir().unwrap();
        let scan = write_png(dir.path(), "scan.PNG");
        let orchestrator = orchestrator(
            vec![],
            Box::new(MockBackend::replying(EngineKind::Tesseract, INVOICE_TEXT)),
        );

        let (result, events) = collect(&orchestrator, &scan, EngineKind::Tesseract);
        let result = result.unwrap();

        assert_eq!(result.fields.invoice_number, "A100");
        assert_eq!(result.fields.total_amount, "1234.56");
        assert_eq!(result.fields.currency, "GBP");
        assert_eq!(result.pages_processed, 1);
        assert_eq!(result.file_name(), "scan.PNG");
        assert_eq!(
            events,
            vec![
                (ExtractionState::Idle, "Starting OCR processing...".to_string()),
                (ExtractionState::Recognizing, "Extracting text using Tesseract...".to_string()),
                (ExtractionState::Extracting, "Extracting invoice fields...".to_string()),
                (ExtractionState::Done, "OCR processing completed!".to_string()),
            ]
        );
    }

    #[test]
    fn test_pdf_without_pages_fails_before_recognition() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = touch(dir.path(), "empty.pdf");
        let backend = MockBackend::replying(EngineKind::Tesseract, INVOICE_TEXT);
        let calls = Arc::clone(&backend.calls);
        let orchestrator = orchestrator(vec![], Box::new(backend));

        let (result, events) = collect(&orchestrator, &pdf, EngineKind::Tesseract);
        let err = result.unwrap_err();

        assert_eq!(err.to_string(), "failed to convert PDF to images");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let states: Vec<ExtractionState> = events.iter().map(|(s, _)| *s).collect();
        assert_eq!(
            states,
            vec![
                ExtractionState::Idle,
                ExtractionState::Rasterizing,
                ExtractionState::Failed
            ]
        );
    }

    #[test]
    fn test_pdf_uses_first_page_only_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = touch(dir.path(), "two-pages.pdf");
        let pages = vec![write_png(dir.path(), "p1.png"), write_png(dir.path(), "p2.png")];
        let backend = MockBackend::replying(EngineKind::Paddle, INVOICE_TEXT);
        let calls = Arc::clone(&backend.calls);
        let orchestrator = orchestrator(pages, Box::new(backend));

        let (result, events) = collect(&orchestrator, &pdf, EngineKind::Paddle);
        let result = result.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.pages_processed, 1);
        assert_eq!(result.raw_text.as_str(), INVOICE_TEXT);
        assert_eq!(events[1], (ExtractionState::Rasterizing, "Converting PDF to images...".to_string()));
        assert_eq!(events[2], (ExtractionState::Recognizing, "Extracting text using PaddleOCR...".to_string()));
    }

    #[test]
    fn test_pdf_all_pages_are_joined_with_blank_line() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = touch(dir.path(), "two-pages.pdf");
        let pages = vec![write_png(dir.path(), "p1.png"), write_png(dir.path(), "p2.png")];
        let orchestrator = orchestrator(
            pages,
            Box::new(MockBackend::replying(EngineKind::Tesseract, "page text")),
        )
        .with_all_pages(true);

        let result = orchestrator
            .process(&pdf, EngineKind::Tesseract, &mut NoProgress)
            .unwrap();
        assert_eq!(result.pages_processed, 2);
        assert_eq!(result.raw_text.as_str(), "page text\n\npage text");
    }

    #[test]
    fn test_missing_image_yields_empty_fields() {
        let backend = MockBackend::replying(EngineKind::Tesseract, INVOICE_TEXT);
        let calls = Arc::clone(&backend.calls);
        let orchestrator = orchestrator(vec![], Box::new(backend));

        let result = orchestrator
            .process(Path::new("/nonexistent/scan.png"), EngineKind::Tesseract, &mut NoProgress)
            .unwrap();
        assert!(result.raw_text.is_empty());
        assert_eq!(result.fields, FieldSet::default());
        assert_eq!(result.file_name(), "scan.png");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_missing_pdf_has_no_pages() {
        let orchestrator = orchestrator(
            vec![],
            Box::new(MockBackend::replying(EngineKind::Tesseract, "")),
        );
        let err = orchestrator
            .process(Path::new("/nonexistent/scan.pdf"), EngineKind::Tesseract, &mut NoProgress)
            .unwrap_err();
        assert!(matches!(err, InvoxError::Pipeline(PipelineError::NoPages)));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let notes = touch(dir.path(), "notes.txt");
        let orchestrator = orchestrator(
            vec![],
            Box::new(MockBackend::replying(EngineKind::Tesseract, "")),
        );

        let err = orchestrator
            .process(&notes, EngineKind::Tesseract, &mut NoProgress)
            .unwrap_err();
        assert_eq!(err.to_string(), "unsupported file format: .txt");
    }

    #[test]
    fn test_unconfigured_engine() {
        let dir = tempfile::tempdir().unwrap();
        let scan = write_png(dir.path(), "scan.jpg");
        let orchestrator = orchestrator(
            vec![],
            Box::new(MockBackend::replying(EngineKind::Tesseract, "")),
        );

        let err = orchestrator
            .process(&scan, EngineKind::Paddle, &mut NoProgress)
            .unwrap_err();
        assert!(matches!(
            err,
            InvoxError::Pipeline(PipelineError::EngineUnavailable(_))
        ));
    }

    #[test]
    fn test_empty_recognition_still_extracts() {
        let dir = tempfile::tempdir().unwrap();
        let scan = write_png(dir.path(), "blank.png");
        let orchestrator = orchestrator(
            vec![],
            Box::new(MockBackend::failing(EngineKind::Tesseract, "no text")),
        );

        let result = orchestrator
            .process(&scan, EngineKind::Tesseract, &mut NoProgress)
            .unwrap();
        assert!(result.raw_text.is_empty());
        assert_eq!(result.fields, FieldSet::default());
    }

    #[test]
    fn test_input_kind_from_path() {
        assert_eq!(InputKind::from_path(Path::new("a/INVOICE.PDF")).unwrap(), InputKind::Pdf);
        assert_eq!(InputKind::from_path(Path::new("scan.Tif")).unwrap(), InputKind::Image);
        assert_eq!(InputKind::from_path(Path::new("scan.jpeg")).unwrap(), InputKind::Image);
        assert!(InputKind::from_path(Path::new("scan.gif")).is_err());
        assert!(InputKind::from_path(Path::new("README")).is_err());
    }
}
