//! Trailing-whitespace detection on a rendered page.
//!
//! Dashboard exports pad every page to a fixed size with blank rows beneath
//! the last chart, followed by a footer band. The first footer row is known
//! to be blank, so it serves as the reference: scanning upwards from just
//! above the footer, the first row whose bytes differ from the reference is
//! the last row of real content.
//!
//! Comparison is exact byte equality over the whole stride. Anti-aliased
//! chart edges that are merely near-white therefore count as content.

use super::buffer::PixelBuffer;
use crate::error::StitchError;

/// Return the exclusive end row of the page content.
///
/// The result is `index + 1` of the bottom-most row above the footer band
/// that differs from the footer's first row, so `0..result` is the content
/// (header included). `page_index` is only used to label errors.
///
/// # Errors
/// * [`StitchError::Geometry`] if `footer_height` is zero or not smaller
///   than the page height.
/// * [`StitchError::BlankPage`] if every row above the footer matches the
///   reference row.
pub fn find_content_end(
    buffer: &PixelBuffer,
    footer_height: u32,
    page_index: usize,
) -> Result<u32, StitchError> {
    if footer_height == 0 || footer_height >= buffer.height() {
        return Err(StitchError::geometry(
            page_index,
            format!(
                "footer height {footer_height} does not fit a page of {} rows",
                buffer.height()
            ),
        ));
    }

    let footer_start = buffer.height() - footer_height;
    let blank = buffer.row(footer_start);

    (0..footer_start)
        .rev()
        .find(|&y| buffer.row(y) != blank)
        .map(|y| y + 1)
        .ok_or(StitchError::BlankPage {
            page: page_index + 1,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: u8 = 0xFF;

    /// A 4-px-wide RGB page filled white, with the given rows painted black.
    fn page(height: u32, dark_rows: &[u32]) -> PixelBuffer {
        let stride = 12;
        let mut data = vec![WHITE; stride * height as usize];
        for &y in dark_rows {
            let start = y as usize * stride;
            data[start..start + stride].fill(0);
        }
        PixelBuffer::from_raw(4, height, stride, 3, false, data).unwrap()
    }

    #[test]
    fn returns_one_past_last_content_row() {
        let buf = page(20, &[2, 5, 9]);
        assert_eq!(find_content_end(&buf, 4, 0).unwrap(), 10);
    }

    #[test]
    fn content_directly_above_footer_is_kept() {
        // Row 15 is the boundary row: the last row before the footer band.
        let buf = page(20, &[15]);
        assert_eq!(find_content_end(&buf, 4, 0).unwrap(), 16);
    }

    #[test]
    fn footer_contents_are_ignored() {
        // Page numbers printed in the footer below the reference row.
        let buf = page(20, &[3, 18, 19]);
        assert_eq!(find_content_end(&buf, 4, 0).unwrap(), 4);
    }

    #[test]
    fn content_only_in_first_row() {
        let buf = page(10, &[0]);
        assert_eq!(find_content_end(&buf, 2, 0).unwrap(), 1);
    }

    #[test]
    fn reference_row_need_not_be_white() {
        // A grey footer reference: everything above that is white differs.
        let mut buf = page(10, &[]);
        let grey = PixelBuffer::from_raw(4, 1, 12, 3, false, vec![0x80; 12]).unwrap();
        buf.copy_rows_from(&grey, 0, 1, 7).unwrap();
        assert_eq!(find_content_end(&buf, 3, 0).unwrap(), 7);
    }

    #[test]
    fn blank_page_is_an_error() {
        let buf = page(20, &[]);
        match find_content_end(&buf, 4, 2) {
            Err(StitchError::BlankPage { page }) => assert_eq!(page, 3),
            other => panic!("expected BlankPage, got {other:?}"),
        }
    }

    #[test]
    fn footer_must_fit_page() {
        let buf = page(8, &[1]);
        assert!(matches!(
            find_content_end(&buf, 8, 0),
            Err(StitchError::Geometry { .. })
        ));
        assert!(matches!(
            find_content_end(&buf, 0, 0),
            Err(StitchError::Geometry { .. })
        ));
    }

    #[test]
    fn padding_bytes_take_part_in_comparison() {
        // Identical pixels, but the padding of row 2 differs from the reference.
        let stride = 16;
        let mut data = vec![WHITE; stride * 6];
        data[2 * stride + 14] = 0;
        let buf = PixelBuffer::from_raw(4, 6, stride, 3, false, data).unwrap();
        assert_eq!(find_content_end(&buf, 2, 0).unwrap(), 3);
    }
}
