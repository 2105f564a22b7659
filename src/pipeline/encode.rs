//! Image encoding: stitched [`PixelBuffer`] → PNG bytes, PNG → data URI.
//!
//! PNG keeps dashboard text and thin chart lines crisp, and the encoder is
//! deterministic, so the same PDF always yields the same bytes.

use super::buffer::PixelBuffer;
use crate::error::StitchError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::io::Cursor;
use tracing::debug;

/// MIME type of every image this crate produces.
pub const PNG_MIME: &str = "image/png";

/// Encode a stitched image as PNG.
pub fn encode_png(buffer: PixelBuffer) -> Result<Vec<u8>, StitchError> {
    let img = buffer.into_image()?;
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!(
        "Encoded {}x{} image → {} bytes PNG",
        img.width(),
        img.height(),
        buf.len()
    );
    Ok(buf)
}

/// Wrap PNG bytes as a `data:` URI for embedding in HTML.
pub fn png_data_uri(png: &[u8]) -> String {
    format!("data:{PNG_MIME};base64,{}", STANDARD.encode(png))
}
