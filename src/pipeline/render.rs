//! PDF rasterisation: render every page of a document to a [`PixelBuffer`].
//!
//! The orchestrator only sees the [`PageRenderer`] trait, so the stitching
//! pipeline can run against synthetic pages in tests and against pdfium in
//! production. Rendering is synchronous and CPU-bound; pdfium is not safe to
//! drive from async tasks, see [`crate::extract::extract_dashboards`].

use super::buffer::PixelBuffer;
use super::engine::bind_pdfium;
use crate::config::ExtractionConfig;
use crate::error::StitchError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// All rendered pages of one source PDF, in page order.
///
/// The PDF handle itself is closed as soon as rendering finishes; dropping
/// this releases the page buffers.
#[derive(Debug)]
pub struct PageDocument {
    path: PathBuf,
    pages: Vec<PixelBuffer>,
}

impl PageDocument {
    pub fn new(path: impl Into<PathBuf>, pages: Vec<PixelBuffer>) -> Self {
        Self {
            path: path.into(),
            pages,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pages(&self) -> &[PixelBuffer] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Turns a source PDF into page buffers.
pub trait PageRenderer {
    /// Open `path` and render every page.
    fn render_document(&self, path: &Path) -> Result<PageDocument, StitchError>;
}

/// [`PageRenderer`] backed by the pdfium library.
pub struct PdfiumRenderer {
    pdfium: Pdfium,
    scale: f32,
    dpi: u32,
}

impl PdfiumRenderer {
    /// Bind pdfium and remember the render scale.
    pub fn new(config: &ExtractionConfig) -> Result<Self, StitchError> {
        let pdfium = bind_pdfium(config.pdfium_lib_path.as_deref())?;
        Ok(Self::with_pdfium(pdfium, config))
    }

    /// Use an already bound pdfium instance.
    pub fn with_pdfium(pdfium: Pdfium, config: &ExtractionConfig) -> Self {
        Self {
            pdfium,
            scale: config.scale,
            dpi: config.dpi(),
        }
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render_document(&self, path: &Path) -> Result<PageDocument, StitchError> {
        let document =
            self.pdfium
                .load_pdf_from_file(path, None)
                .map_err(|e| StitchError::CorruptPdf {
                    path: path.to_path_buf(),
                    detail: format!("{:?}", e),
                })?;

        let pages = document.pages();
        info!("PDF loaded: {} ({} pages)", path.display(), pages.len());

        let render_config = PdfRenderConfig::new().scale_page_by_factor(self.scale);
        let dpi = self.dpi;

        let mut buffers = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                StitchError::RasterisationFailed {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                }
            })?;

            let buffer = PixelBuffer::from_image(bitmap.as_image()).with_dpi(dpi, dpi);
            debug!(
                "Rendered page {} → {}x{} px",
                idx + 1,
                buffer.width(),
                buffer.height()
            );
            buffers.push(buffer);
        }

        Ok(PageDocument::new(path, buffers))
    }
}
