//! PDF rasterization.

mod rasterizer;

pub use rasterizer::PdftoppmRasterizer;

use std::path::{Path, PathBuf};

use image::DynamicImage;
use tempfile::TempDir;
use tracing::warn;

/// Trait for turning a PDF into page images.
pub trait Rasterizer: Send + Sync {
    /// Render the pages of `pdf` in page order.
    ///
    /// Failures are not errors: an unreadable, encrypted or page-less PDF
    /// yields an empty document, and callers decide what that means.
    fn rasterize(&self, pdf: &Path) -> RasterizedDocument;
}

/// A rendered page image on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// Page number (1-indexed).
    pub number: u32,
    /// Location of the rendered image.
    pub path: PathBuf,
}

impl PageImage {
    /// Decode the page image; an undecodable file is logged and yields `None`.
    pub fn load(&self) -> Option<DynamicImage> {
        match image::open(&self.path) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("Could not decode page {} ({}): {}", self.number, self.path.display(), e);
                None
            }
        }
    }
}

/// Page images produced by a [`Rasterizer`].
///
/// Images may live in a scratch directory owned by the document; it is
/// removed when the document is dropped.
#[derive(Debug, Default)]
pub struct RasterizedDocument {
    pages: Vec<PageImage>,
    workspace: Option<TempDir>,
}

impl RasterizedDocument {
    /// Document with no pages.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Pages stored in an owned scratch directory.
    pub fn in_workspace(pages: Vec<PageImage>, workspace: TempDir) -> Self {
        Self {
            pages,
            workspace: Some(workspace),
        }
    }

    /// Pages whose files are owned by someone else.
    pub fn from_pages(pages: Vec<PageImage>) -> Self {
        Self {
            pages,
            workspace: None,
        }
    }

    pub fn pages(&self) -> &[PageImage] {
        &self.pages
    }

    pub fn first(&self) -> Option<&PageImage> {
        self.pages.first()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl Drop for RasterizedDocument {
    fn drop(&mut self) {
        if let Some(workspace) = self.workspace.take() {
            let path = workspace.path().to_path_buf();
            if let Err(e) = workspace.close() {
                warn!("Failed to remove page images in {}: {}", path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_is_removed_on_drop() {
        let workspace = tempfile::tempdir().unwrap();
        let dir = workspace.path().to_path_buf();
        let page = dir.join("page-1.png");
        std::fs::write(&page, b"png").unwrap();

        let doc = RasterizedDocument::in_workspace(
            vec![PageImage { number: 1, path: page }],
            workspace,
        );
        assert_eq!(doc.len(), 1);
        assert!(dir.exists());

        drop(doc);
        assert!(!dir.exists());
    }

    #[test]
    fn test_page_load() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("page-1.png");
        DynamicImage::new_luma8(3, 2).save(&good).unwrap();
        let bad = dir.path().join("page-2.png");
        std::fs::write(&bad, b"garbage").unwrap();

        let loaded = PageImage { number: 1, path: good }.load().unwrap();
        assert_eq!((loaded.width(), loaded.height()), (3, 2));
        assert!(PageImage { number: 2, path: bad }.load().is_none());
    }

    #[test]
    fn test_empty_document() {
        let doc = RasterizedDocument::empty();
        assert!(doc.is_empty());
        assert!(doc.first().is_none());
    }
}
