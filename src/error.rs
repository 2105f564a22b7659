//! Error types for the dashboard-stitch library.
//!
//! Every failure is fatal for the dashboard it occurs in: there is no
//! partial stitching of a single PDF. Four kinds come straight from the
//! algorithm and are what callers usually match on:
//!
//! * [`StitchError::Configuration`]: the team/dashboard mapping or the
//!   settings are malformed.
//! * [`StitchError::NotFound`]: a configured source PDF is missing.
//! * [`StitchError::BlankPage`]: a page has nothing above its footer.
//! * [`StitchError::Geometry`]: the height constants do not fit the
//!   rendered pages.
//!
//! The remaining variants cover the rendering engine and I/O around it.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the dashboard-stitch library.
#[derive(Debug, Error)]
pub enum StitchError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// The report configuration or the extraction settings are invalid.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// A configured source PDF does not exist.
    #[error("Source PDF not found: '{path}'\nWas the dashboard downloaded into the source directory?")]
    NotFound { path: PathBuf },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' could not be opened: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    // ── Algorithm errors ──────────────────────────────────────────────────
    /// Every row above the footer band matches the footer reference row.
    ///
    /// `page` is 1-indexed.
    #[error("Page {page} is blank: no content found above the footer band")]
    BlankPage { page: usize },

    /// The header/footer heights do not fit the rendered page.
    ///
    /// Usually a height-constant/scale mismatch or a malformed export.
    #[error("Page geometry error on page {page}: {detail}")]
    Geometry { page: usize, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The stitched image could not be PNG-encoded.
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Set `pdfium_lib_path` under `settings` in the configuration file.\n\
  • Install libpdfium where the system loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StitchError {
    /// Shorthand for a [`StitchError::Geometry`] on a 0-indexed page.
    pub(crate) fn geometry(page_index: usize, detail: impl Into<String>) -> Self {
        StitchError::Geometry {
            page: page_index + 1,
            detail: detail.into(),
        }
    }

    /// `true` for errors raised by validating the configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(self, StitchError::Configuration(_))
    }
}
