//! Owned raster buffer decoupled from the PDF rendering library.
//!
//! The trimmer and stitcher only ever ask for "row N as a byte slice" and
//! "copy these rows over there", so this type deliberately exposes nothing
//! else about the pixel layout. Rows are `stride` bytes long; the first
//! `width × channels` bytes of a row are pixel samples and the remainder is
//! alignment padding.

use crate::error::StitchError;
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

/// A decoded page (or stitched result) as a 2-D array of samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    stride: usize,
    channels: u8,
    has_alpha: bool,
    dpi: (u32, u32),
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw samples, validating the layout.
    ///
    /// `data.len()` must equal `stride × height` and `stride` must be at
    /// least `width × channels`.
    pub fn from_raw(
        width: u32,
        height: u32,
        stride: usize,
        channels: u8,
        has_alpha: bool,
        data: Vec<u8>,
    ) -> Result<Self, StitchError> {
        if channels == 0 || channels > 4 {
            return Err(StitchError::Internal(format!(
                "unsupported channel count {channels}"
            )));
        }
        if has_alpha && !matches!(channels, 2 | 4) {
            return Err(StitchError::Internal(format!(
                "alpha flag set on a {channels}-channel buffer"
            )));
        }
        let row_len = width as usize * channels as usize;
        if stride < row_len {
            return Err(StitchError::Internal(format!(
                "stride {stride} is shorter than a {width}px row of {channels} channels"
            )));
        }
        if data.len() != stride * height as usize {
            return Err(StitchError::Internal(format!(
                "buffer holds {} bytes, expected {} ({stride} × {height})",
                data.len(),
                stride * height as usize
            )));
        }
        Ok(Self {
            width,
            height,
            stride,
            channels,
            has_alpha,
            dpi: (72, 72),
            data,
        })
    }

    /// Allocate a zero-filled, tightly packed buffer shaped like `template`.
    ///
    /// Width, channel layout and DPI follow the template; only the height
    /// differs.
    pub fn blank_like(template: &PixelBuffer, height: u32) -> Self {
        let stride = template.row_len();
        Self {
            width: template.width,
            height,
            stride,
            channels: template.channels,
            has_alpha: template.has_alpha,
            dpi: template.dpi,
            data: vec![0; stride * height as usize],
        }
    }

    /// Convert a rendered `DynamicImage` into a tightly packed buffer.
    ///
    /// Grey and RGB images keep their layout; everything else is widened to
    /// RGBA8.
    pub fn from_image(image: DynamicImage) -> Self {
        let (channels, has_alpha, width, height, data) = match image {
            DynamicImage::ImageLuma8(img) => (1, false, img.width(), img.height(), img.into_raw()),
            DynamicImage::ImageRgb8(img) => (3, false, img.width(), img.height(), img.into_raw()),
            other => {
                let img = other.into_rgba8();
                (4, true, img.width(), img.height(), img.into_raw())
            }
        };
        Self {
            width,
            height,
            stride: width as usize * channels as usize,
            channels,
            has_alpha,
            dpi: (72, 72),
            data,
        }
    }

    /// Record the resolution the page was rendered at.
    pub fn with_dpi(mut self, horizontal: u32, vertical: u32) -> Self {
        self.dpi = (horizontal, vertical);
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row, padding included.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// Horizontal and vertical resolution in dots per inch.
    pub fn dpi(&self) -> (u32, u32) {
        self.dpi
    }

    /// Bytes of pixel samples per row, padding excluded.
    pub fn row_len(&self) -> usize {
        self.width as usize * self.channels as usize
    }

    /// The full `stride`-length byte range of row `y`.
    ///
    /// # Panics
    /// If `y >= height`.
    pub fn row(&self, y: u32) -> &[u8] {
        assert!(y < self.height, "row {y} out of range (height {})", self.height);
        let start = y as usize * self.stride;
        &self.data[start..start + self.stride]
    }

    /// `true` when both buffers can exchange rows sample-for-sample.
    pub fn same_row_layout(&self, other: &PixelBuffer) -> bool {
        self.width == other.width && self.channels == other.channels
    }

    /// Copy `count` rows starting at `src_y` in `src` into `self` at `dst_y`.
    ///
    /// Only the pixel samples of each row are copied, so the two buffers may
    /// have different strides.
    pub fn copy_rows_from(
        &mut self,
        src: &PixelBuffer,
        src_y: u32,
        count: u32,
        dst_y: u32,
    ) -> Result<(), StitchError> {
        if !self.same_row_layout(src) {
            return Err(StitchError::Internal(format!(
                "row layout mismatch: {}px × {} channels vs {}px × {} channels",
                src.width, src.channels, self.width, self.channels
            )));
        }
        if src_y as u64 + count as u64 > src.height as u64
            || dst_y as u64 + count as u64 > self.height as u64
        {
            return Err(StitchError::Internal(format!(
                "row copy [{src_y}, +{count}) → [{dst_y}, +{count}) exceeds {} / {} rows",
                src.height, self.height
            )));
        }

        let row_len = self.row_len();
        if src.stride == row_len && self.stride == row_len {
            // Both tightly packed: one contiguous block.
            let s = src_y as usize * row_len;
            let d = dst_y as usize * row_len;
            let n = count as usize * row_len;
            self.data[d..d + n].copy_from_slice(&src.data[s..s + n]);
            return Ok(());
        }

        for i in 0..count as usize {
            let s = (src_y as usize + i) * src.stride;
            let d = (dst_y as usize + i) * self.stride;
            self.data[d..d + row_len].copy_from_slice(&src.data[s..s + row_len]);
        }
        Ok(())
    }

    /// Convert into an `image` crate buffer for encoding.
    ///
    /// Padding bytes are dropped.
    pub fn into_image(self) -> Result<DynamicImage, StitchError> {
        let (width, height, channels, has_alpha) =
            (self.width, self.height, self.channels, self.has_alpha);
        let packed = self.into_packed();
        let image = match (channels, has_alpha) {
            (1, false) => GrayImage::from_raw(width, height, packed).map(DynamicImage::ImageLuma8),
            (2, true) => image::GrayAlphaImage::from_raw(width, height, packed)
                .map(DynamicImage::ImageLumaA8),
            (3, false) => RgbImage::from_raw(width, height, packed).map(DynamicImage::ImageRgb8),
            (4, true) => RgbaImage::from_raw(width, height, packed).map(DynamicImage::ImageRgba8),
            // Four channels without alpha (e.g. BGRx): drop the fourth sample.
            (4, false) => {
                let rgb: Vec<u8> = packed
                    .chunks_exact(4)
                    .flat_map(|px| [px[0], px[1], px[2]])
                    .collect();
                RgbImage::from_raw(width, height, rgb).map(DynamicImage::ImageRgb8)
            }
            _ => None,
        };
        image.ok_or_else(|| {
            StitchError::Internal(format!(
                "cannot build a {width}×{height} image from {channels} channels"
            ))
        })
    }

    fn into_packed(self) -> Vec<u8> {
        let row_len = self.row_len();
        if self.stride == row_len {
            return self.data;
        }
        let mut packed = Vec::with_capacity(row_len * self.height as usize);
        for row in self.data.chunks_exact(self.stride) {
            packed.extend_from_slice(&row[..row_len]);
        }
        packed
    }
}
