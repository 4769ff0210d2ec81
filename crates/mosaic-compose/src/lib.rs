#![warn(missing_docs)]
//! # mosaic-compose
//!
//! ## Purpose
//! Owns the output drawing surface and performs the two-layer cell reveal.
//!
//! ## Responsibilities
//! - Maintain the canvas the embedding application displays.
//! - Draw the matched cell's base-image patch, cropped and scaled, at full
//!   opacity.
//! - Blend the uploaded image over that patch at the configured opacity.
//!
//! ## Data flow
//! [`mosaic_core::MatchedCell`] + base image + uploaded image ->
//! [`composite_cell`] -> in-place canvas mutation. There is no separate
//! exported artifact here; export belongs to the embedding application.
//!
//! ## Ownership and lifetimes
//! The canvas owns its RGBA buffer and is mutated in place by a single
//! owner. Source images are only borrowed.
//!
//! ## Error model
//! Zero-area cell rectangles and out-of-range opacity fail with
//! [`ComposeError`]; a missing match never reaches this crate (the caller
//! simply does not draw).

use mosaic_core::{GridGeometry, MatchedCell, PixelImage, PixelRect, cell_metrics, sample_rect};
use thiserror::Error;

/// Owned output surface in RGBA row-major layout.
///
/// A fresh canvas is fully transparent, like an untouched 2-D context: the
/// base image is never pre-rendered, cells appear only as matches land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    /// Canvas width in pixels, frozen at construction.
    pub width: u32,
    /// Canvas height in pixels, frozen at construction.
    pub height: u32,
    /// Raw RGBA bytes (`width * height * 4`).
    pub rgba: Vec<u8>,
}

impl Canvas {
    /// Creates a transparent canvas of the given dimensions.
    ///
    /// # Errors
    /// Returns [`ComposeError::InvalidCanvas`] for a zero-area surface.
    pub fn new(width: u32, height: u32) -> Result<Self, ComposeError> {
        if width == 0 || height == 0 {
            return Err(ComposeError::InvalidCanvas { width, height });
        }

        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or(ComposeError::InvalidCanvas { width, height })?;

        Ok(Self {
            width,
            height,
            rgba: vec![0_u8; len],
        })
    }

    fn pixel_offset(&self, x: u32, y: u32) -> usize {
        ((y as usize * self.width as usize) + x as usize) * 4
    }
}

/// Reveals one matched cell on the canvas.
///
/// Draw order is fixed and load-bearing:
/// 1. The base image's patch for `cell`, cropped from the base image's own
///    coordinate space and scaled (nearest-neighbor) to the cell rectangle,
///    at full opacity.
/// 2. The uploaded image scaled to the same rectangle, blended at
///    `opacity`. Opacity is a per-call argument, so subsequent draws are
///    unaffected (no sticky alpha state to restore).
///
/// The cell rectangle is recomputed here from the canvas's own dimensions,
/// never reused from index-build time, so a canvas sized differently from
/// the base image still places cells correctly.
///
/// # Errors
/// Returns [`ComposeError::DegenerateCell`] when the cell rectangle floors
/// to zero area on either surface, [`ComposeError::EmptyUpload`] for a
/// zero-area upload, and [`ComposeError::InvalidOpacity`] for opacity
/// outside `[0.0, 1.0]`.
pub fn composite_cell(
    canvas: &mut Canvas,
    base: &PixelImage,
    upload: &PixelImage,
    cell: MatchedCell,
    geometry: GridGeometry,
    opacity: f32,
) -> Result<(), ComposeError> {
    if !(0.0..=1.0).contains(&opacity) {
        return Err(ComposeError::InvalidOpacity(opacity));
    }
    if upload.width == 0 || upload.height == 0 {
        return Err(ComposeError::EmptyUpload);
    }

    let dest_metrics = cell_metrics(canvas.width, canvas.height, geometry);
    let dest = sample_rect(dest_metrics, cell.col, cell.row);

    let base_metrics = cell_metrics(base.width, base.height, geometry);
    let source = sample_rect(base_metrics, cell.col, cell.row);

    if dest.pixel_count() == 0 || source.pixel_count() == 0 {
        return Err(ComposeError::DegenerateCell {
            col: cell.col,
            row: cell.row,
        });
    }

    draw_base_patch(canvas, base, source, dest);
    blend_upload(canvas, upload, dest, opacity);
    Ok(())
}

/// Layer 1: copy the base image's cell patch onto the canvas.
fn draw_base_patch(canvas: &mut Canvas, base: &PixelImage, source: PixelRect, dest: PixelRect) {
    for dy in 0..dest.height {
        let src_y = source.y + (dy as u64 * source.height as u64 / dest.height as u64) as u32;
        for dx in 0..dest.width {
            let src_x = source.x + (dx as u64 * source.width as u64 / dest.width as u64) as u32;
            let src_offset = base.pixel_offset(src_x, src_y);
            let dst_offset = canvas.pixel_offset(dest.x + dx, dest.y + dy);

            canvas.rgba[dst_offset] = base.rgba[src_offset];
            canvas.rgba[dst_offset + 1] = base.rgba[src_offset + 1];
            canvas.rgba[dst_offset + 2] = base.rgba[src_offset + 2];
            canvas.rgba[dst_offset + 3] = 255;
        }
    }
}

/// Layer 2: blend the scaled upload over the revealed patch.
fn blend_upload(canvas: &mut Canvas, upload: &PixelImage, dest: PixelRect, opacity: f32) {
    for dy in 0..dest.height {
        let src_y = (dy as u64 * upload.height as u64 / dest.height as u64) as u32;
        for dx in 0..dest.width {
            let src_x = (dx as u64 * upload.width as u64 / dest.width as u64) as u32;
            let src_offset = upload.pixel_offset(src_x, src_y);
            let dst_offset = canvas.pixel_offset(dest.x + dx, dest.y + dy);

            for channel in 0..3 {
                let src = upload.rgba[src_offset + channel] as f32;
                let dst = canvas.rgba[dst_offset + channel] as f32;
                canvas.rgba[dst_offset + channel] =
                    (dst * (1.0 - opacity) + src * opacity).round() as u8;
            }
            canvas.rgba[dst_offset + 3] = 255;
        }
    }
}

/// Error type for canvas construction and cell compositing.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// Canvas must have non-zero, addressable area.
    #[error("invalid canvas dimensions: {width}x{height}")]
    InvalidCanvas {
        /// Requested canvas width.
        width: u32,
        /// Requested canvas height.
        height: u32,
    },
    /// Cell rectangle floors to zero area on canvas or base image.
    #[error("cell ({col}, {row}) has a zero-area rectangle")]
    DegenerateCell {
        /// Column of the degenerate cell.
        col: u32,
        /// Row of the degenerate cell.
        row: u32,
    },
    /// Uploaded image has no pixels to draw.
    #[error("uploaded image has zero area")]
    EmptyUpload,
    /// Overlay opacity outside the unit interval.
    #[error("overlay opacity {0} is outside [0.0, 1.0]")]
    InvalidOpacity(f32),
}
