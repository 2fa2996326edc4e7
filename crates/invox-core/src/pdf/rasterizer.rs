//! PDF rasterization with lopdf validation and poppler's `pdftoppm`.

use std::path::{Path, PathBuf};
use std::process::Command;

use lopdf::Document;
use tracing::{debug, warn};

use crate::error::PdfError;
use crate::models::config::PdfConfig;

use super::{PageImage, RasterizedDocument, Rasterizer};

/// Rasterizer shelling out to `pdftoppm`.
///
/// The PDF is first opened with lopdf so that corrupt, password-protected or
/// empty files are rejected before the renderer runs.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    binary: String,
    dpi: u32,
    last_page: Option<u32>,
}

impl PdftoppmRasterizer {
    pub fn new(config: &PdfConfig) -> Self {
        let last_page = if !config.process_all_pages {
            Some(1)
        } else if config.max_pages > 0 {
            Some(config.max_pages)
        } else {
            None
        };

        Self {
            binary: config.pdftoppm_binary.clone(),
            dpi: config.render_dpi(),
            last_page,
        }
    }

    /// Number of pages, after checking the file is a readable PDF.
    fn inspect(&self, pdf: &Path) -> Result<usize, PdfError> {
        let mut doc = Document::load(pdf).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        match doc.get_pages().len() {
            0 => Err(PdfError::NoPages),
            count => Ok(count),
        }
    }

    fn render(&self, pdf: &Path) -> Result<RasterizedDocument, PdfError> {
        let page_count = self.inspect(pdf)?;
        debug!("Rendering {} at {} DPI ({} pages in file)", pdf.display(), self.dpi, page_count);

        let workspace = tempfile::Builder::new()
            .prefix("invox-pages-")
            .tempdir()
            .map_err(|e| PdfError::Render(format!("failed to create temp dir: {e}")))?;
        let prefix = workspace.path().join("page");

        let mut cmd = Command::new(&self.binary);
        cmd.arg("-png").arg("-r").arg(self.dpi.to_string());
        if let Some(last) = self.last_page {
            cmd.arg("-f").arg("1").arg("-l").arg(last.to_string());
        }
        cmd.arg(pdf).arg(&prefix);

        let output = cmd.output().map_err(|e| {
            PdfError::Render(format!("failed to run '{}' (is poppler installed?): {e}", self.binary))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PdfError::Render(format!(
                "exit code {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        let files = rendered_pages(workspace.path())?;
        let pages = files
            .into_iter()
            .enumerate()
            .map(|(i, path)| PageImage {
                number: i as u32 + 1,
                path,
            })
            .collect();

        Ok(RasterizedDocument::in_workspace(pages, workspace))
    }
}

impl Rasterizer for PdftoppmRasterizer {
    fn rasterize(&self, pdf: &Path) -> RasterizedDocument {
        match self.render(pdf) {
            Ok(doc) => {
                debug!("Rasterized {} page(s) from {}", doc.len(), pdf.display());
                doc
            }
            Err(e) => {
                warn!("Could not rasterize {}: {}", pdf.display(), e);
                RasterizedDocument::empty()
            }
        }
    }
}

/// PNG files in `dir`, in page order.
///
/// `pdftoppm` zero-pads page numbers to a common width, so name order is
/// page order.
fn rendered_pages(dir: &Path) -> Result<Vec<PathBuf>, PdfError> {
    let entries = std::fs::read_dir(dir).map_err(|e| PdfError::Render(e.to_string()))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "png"))
        .collect();
    files.sort();
    Ok(files)
}
