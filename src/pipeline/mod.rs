//! Pipeline stages for turning one dashboard PDF into one PNG.
//!
//! Each submodule implements exactly one step, so the pixel work in
//! [`buffer`], [`trim`] and [`stitch`] never depends on the PDF library.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ trim ──▶ stitch ──▶ encode
//! (path)    (pdfium)   (rows)   (copy)     (PNG)
//! ```
//!
//! 1. [`input`]: check the configured file exists and looks like a PDF
//! 2. [`render`]: rasterise every page at `scale × 72 DPI` (binding via
//!    [`engine`])
//! 3. [`trim`]: find where trailing whitespace starts on each page
//! 4. [`stitch`]: drop headers/footers and stack the content regions
//! 5. [`encode`]: PNG-encode the stitched buffer

pub mod buffer;
pub mod encode;
pub mod engine;
pub mod input;
pub mod render;
pub mod stitch;
pub mod trim;
