//! # dashboard-stitch
//!
//! Turn multi-page dashboard PDF exports into one continuous PNG per
//! dashboard, ready to embed in a report.
//!
//! ## Why this crate?
//!
//! Dashboard tools export long boards as paginated PDFs. Every page repeats
//! a header band and a footer band, and the last page usually ends in empty
//! space. Pasting those pages into a report gives a choppy, repetitive
//! result. This crate rasterises each page, cuts away the repeated bands and
//! the trailing whitespace, and stacks what is left into a single image.
//!
//! ## Pipeline Overview
//!
//! ```text
//! weekly_report.yaml ──▶ TeamDashboardMap
//!                           │ per dashboard, in declaration order
//!                           ├─ 1. Input   locate <source_dir>/<filename>, check %PDF
//!                           ├─ 2. Render  rasterise pages via pdfium (spawn_blocking)
//!                           ├─ 3. Trim    find the last content row above the footer
//!                           ├─ 4. Stitch  drop headers, stack content regions
//!                           └─ 5. Encode  PNG bytes
//!                           ▼
//!                     ExtractionResult ──▶ PNG files / HTML report
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dashboard_stitch::{extract_dashboards, ExtractionConfig, ReportConfiguration};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let report = ReportConfiguration::load(Path::new("weekly_report.yaml"))?;
//!     let config = report.settings.apply(ExtractionConfig::builder()).build()?;
//!     let result = extract_dashboards(&report.teams, "lwr_downloaded_pdfs", &config).await?;
//!     for (team, dashboard, png) in result.images() {
//!         eprintln!("{team} / {dashboard}: {} bytes", png.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `dashstitch` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! dashboard-stitch = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod report;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ExtractionConfig, ExtractionConfigBuilder, FailurePolicy, HeightConstants, PageGeometry,
};
pub use error::StitchError;
pub use extract::{extract_dashboards, extract_dashboards_sync, get_pdf_objects, stitch_dashboard};
pub use output::{
    image_filename, render_html, write_html, write_images, DashboardFailure, ExtractionResult,
    ExtractionSummary,
};
pub use pipeline::buffer::PixelBuffer;
pub use pipeline::render::{PageDocument, PageRenderer, PdfiumRenderer};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use report::{DashboardOptions, ReportConfiguration, Settings, Team, TeamDashboardMap};
