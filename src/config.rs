//! Configuration types for dashboard extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. The height constants are stored at
//! the 72 DPI base resolution and scaled together with the render resolution,
//! so a single `scale` knob keeps the two consistent.

use crate::error::StitchError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Resolution of a PDF user-space unit; `scale` multiplies this.
pub const BASE_DPI: f32 = 72.0;

/// Accepted range for [`ExtractionConfig::scale`].
pub const SCALE_RANGE: (f32, f32) = (0.1, 8.0);

/// Header and footer band heights, in rows at scale 1.0 (72 DPI).
///
/// The defaults are calibrated for the analytics product's PDF export
/// template. A different template needs different values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeightConstants {
    /// Title block present only at the top of the first page.
    pub report_header_height: u32,
    /// Header repeated at the top of every later page.
    pub page_header_height: u32,
    /// Page-number band at the bottom of every page. Must be ≥ 1.
    pub footer_height: u32,
}

impl Default for HeightConstants {
    fn default() -> Self {
        Self {
            report_header_height: 96,
            page_header_height: 36,
            footer_height: 40,
        }
    }
}

impl HeightConstants {
    /// Convert to pixel rows at the given render scale.
    ///
    /// Heights scale linearly and are rounded to the nearest row. The footer
    /// never rounds down to zero since its first row is the blank reference.
    pub fn at_scale(&self, scale: f32) -> PageGeometry {
        let px = |h: u32| (h as f32 * scale).round() as u32;
        PageGeometry {
            report_header_height: px(self.report_header_height),
            page_header_height: px(self.page_header_height),
            footer_height: px(self.footer_height).max(1),
        }
    }
}

/// Header and footer heights in pixel rows of a rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    pub report_header_height: u32,
    pub page_header_height: u32,
    pub footer_height: u32,
}

/// What to do when one dashboard fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the whole run at the first failing dashboard (default).
    #[default]
    Abort,
    /// Record the failure, skip the dashboard and carry on.
    Continue,
}

/// Configuration for a dashboard extraction run.
///
/// # Example
/// ```rust
/// use dashboard_stitch::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .scale(2.0)
///     .footer_height(40)
///     .build()
///     .unwrap();
/// assert_eq!(config.geometry().footer_height, 80);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Render resolution as a multiple of 72 DPI. Range: 0.1–8.0. Default: 1.0.
    ///
    /// The stitched image grows with the square of the scale; 2.0 is usually
    /// plenty for text to stay legible when embedded in a document.
    pub scale: f32,

    /// Header/footer bands at scale 1.0.
    pub heights: HeightConstants,

    /// Behaviour when a dashboard fails. Default: [`FailurePolicy::Abort`].
    pub failure_policy: FailurePolicy,

    /// Explicit path to the pdfium shared library.
    /// If None, `PDFIUM_LIB_PATH` and then the system library are tried.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Receives per-dashboard events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            heights: HeightConstants::default(),
            failure_policy: FailurePolicy::default(),
            pdfium_lib_path: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("scale", &self.scale)
            .field("heights", &self.heights)
            .field("failure_policy", &self.failure_policy)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Rendering resolution in dots per inch, rounded to a whole dot.
    pub fn dpi(&self) -> u32 {
        (BASE_DPI * self.scale).round() as u32
    }

    /// Height constants in pixel rows at the configured scale.
    pub fn geometry(&self) -> PageGeometry {
        self.heights.at_scale(self.scale)
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn scale(mut self, scale: f32) -> Self {
        self.config.scale = scale;
        self
    }

    pub fn heights(mut self, heights: HeightConstants) -> Self {
        self.config.heights = heights;
        self
    }

    pub fn report_header_height(mut self, rows: u32) -> Self {
        self.config.heights.report_header_height = rows;
        self
    }

    pub fn page_header_height(mut self, rows: u32) -> Self {
        self.config.heights.page_header_height = rows;
        self
    }

    pub fn footer_height(mut self, rows: u32) -> Self {
        self.config.heights.footer_height = rows;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, StitchError> {
        let c = &self.config;
        let (min, max) = SCALE_RANGE;
        if !c.scale.is_finite() || c.scale < min || c.scale > max {
            return Err(StitchError::Configuration(format!(
                "scale must be {min}–{max}, got {}",
                c.scale
            )));
        }
        if c.heights.footer_height == 0 {
            return Err(StitchError::Configuration(
                "footer_height must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build() {
        let config = ExtractionConfig::builder().build().unwrap();
        assert_eq!(config.scale, 1.0);
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert_eq!(config.dpi(), 72);
    }

    #[test]
    fn dpi_follows_scale() {
        let config = ExtractionConfig::builder().scale(1.5).build().unwrap();
        assert_eq!(config.dpi(), 108);
    }

    #[test]
    fn geometry_scales_linearly() {
        let heights = HeightConstants {
            report_header_height: 100,
            page_header_height: 30,
            footer_height: 41,
        };
        assert_eq!(
            heights.at_scale(1.5),
            PageGeometry {
                report_header_height: 150,
                page_header_height: 45,
                footer_height: 62,
            }
        );
    }

    #[test]
    fn footer_never_scales_to_zero() {
        let heights = HeightConstants {
            report_header_height: 0,
            page_header_height: 0,
            footer_height: 1,
        };
        assert_eq!(heights.at_scale(0.1).footer_height, 1);
    }

    #[test]
    fn scale_out_of_range_is_rejected() {
        for bad in [0.0, 0.05, 8.5, f32::NAN] {
            let err = ExtractionConfig::builder().scale(bad).build().unwrap_err();
            assert!(err.is_configuration(), "scale {bad}: {err}");
        }
    }

    #[test]
    fn zero_footer_is_rejected() {
        assert!(ExtractionConfig::builder().footer_height(0).build().is_err());
    }

    #[test]
    fn failure_policy_deserialises_lowercase() {
        let p: FailurePolicy = serde_json::from_str("\"continue\"").unwrap();
        assert_eq!(p, FailurePolicy::Continue);
    }
}
