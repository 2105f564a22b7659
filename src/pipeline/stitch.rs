//! Vertical compositing of trimmed page content.
//!
//! Each page contributes the rows between its header and its trailing
//! whitespace. Page 0 carries the report title block, so it loses
//! `report_header_height` rows; every later page only repeats the smaller
//! per-page header. All areas are measured first so the destination is
//! allocated exactly once.

use super::buffer::PixelBuffer;
use super::trim::find_content_end;
use crate::config::PageGeometry;
use crate::error::StitchError;
use tracing::debug;

/// The slice of one page that survives stitching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageArea {
    /// Leading rows to skip.
    pub header_offset: u32,
    /// Rows of content to keep, starting at `header_offset`.
    pub content_length: u32,
}

/// Measure the content area of every page.
///
/// # Errors
/// [`StitchError::BlankPage`] from the trimmer, or [`StitchError::Geometry`]
/// when a header reaches past the detected content.
pub fn page_areas(
    pages: &[PixelBuffer],
    geometry: &PageGeometry,
) -> Result<Vec<PageArea>, StitchError> {
    pages
        .iter()
        .enumerate()
        .map(|(idx, page)| {
            let header_offset = if idx == 0 {
                geometry.report_header_height
            } else {
                geometry.page_header_height
            };
            let content_end = find_content_end(page, geometry.footer_height, idx)?;
            if content_end <= header_offset {
                return Err(StitchError::geometry(
                    idx,
                    format!(
                        "header of {header_offset} rows covers all detected content \
                         (content ends at row {content_end})"
                    ),
                ));
            }
            let area = PageArea {
                header_offset,
                content_length: content_end - header_offset,
            };
            debug!(
                "Page {}: skip {} header rows, keep {} rows",
                idx + 1,
                area.header_offset,
                area.content_length
            );
            Ok(area)
        })
        .collect()
}

/// Composite the content of `pages` into one tall buffer.
///
/// The result has the width, channel layout and DPI of page 0 and a height
/// equal to the sum of all [`PageArea::content_length`]s.
///
/// # Errors
/// [`StitchError::Geometry`] for an empty page list or for a page whose width
/// or channel layout differs from page 0, plus everything
/// [`page_areas`] can return.
pub fn stitch(pages: &[PixelBuffer], geometry: &PageGeometry) -> Result<PixelBuffer, StitchError> {
    let first = pages
        .first()
        .ok_or_else(|| StitchError::geometry(0, "document has no pages"))?;

    if let Some((idx, page)) = pages
        .iter()
        .enumerate()
        .find(|(_, p)| !p.same_row_layout(first))
    {
        return Err(StitchError::geometry(
            idx,
            format!(
                "page is {}px × {} channels but page 1 is {}px × {} channels",
                page.width(),
                page.channels(),
                first.width(),
                first.channels()
            ),
        ));
    }

    let areas = page_areas(pages, geometry)?;
    let total_height = areas
        .iter()
        .try_fold(0u32, |acc, a| acc.checked_add(a.content_length))
        .ok_or_else(|| StitchError::geometry(0, "stitched height overflows u32"))?;

    let mut stitched = PixelBuffer::blank_like(first, total_height);
    let mut dest_offset = 0;
    for (page, area) in pages.iter().zip(&areas) {
        stitched.copy_rows_from(page, area.header_offset, area.content_length, dest_offset)?;
        dest_offset += area.content_length;
    }

    debug!(
        "Stitched {} pages → {}x{} px",
        pages.len(),
        stitched.width(),
        stitched.height()
    );
    Ok(stitched)
}
