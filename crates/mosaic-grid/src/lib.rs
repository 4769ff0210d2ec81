#![warn(missing_docs)]
//! # mosaic-grid
//!
//! ## Purpose
//! Samples mean colors from pixel buffers and builds the grid color index.
//!
//! ## Responsibilities
//! - Average R, G, B over an arbitrary rectangle of a decoded image.
//! - Partition a base image into the configured grid and index each cell's
//!   mean color.
//! - Reject degenerate geometries before any division happens.
//!
//! ## Data flow
//! Base image -> [`build_index`] -> [`mosaic_core::GridIndex`] consumed by
//! matching. Uploaded image -> [`mean_color`] over its full rect -> target
//! color for matching.
//!
//! ## Ownership and lifetimes
//! Sampling only reads borrowed buffers; the produced index owns its cells.
//! Nothing here touches the user-visible canvas: indexing is a pure read of
//! the base image, never a pre-render.
//!
//! ## Error model
//! Zero-pixel regions and zero-area cell rectangles fail with [`GridError`]
//! variants; index construction surfaces them to the caller instead of
//! producing undefined means.

use mosaic_core::{
    GridCell, GridGeometry, GridIndex, PixelImage, PixelRect, Rgb, cell_metrics, sample_rect,
};
use thiserror::Error;

/// Computes the mean RGB color over `rect` within `image`.
///
/// Sums each of R, G, B across every pixel of the rectangle, stepping over
/// the alpha byte, then divides by the pixel count with integer floor
/// division per channel.
///
/// # Errors
/// Returns [`GridError::EmptyRegion`] when the rectangle contains zero
/// pixels and [`GridError::RegionOutOfBounds`] when it extends past the
/// image.
pub fn mean_color(image: &PixelImage, rect: PixelRect) -> Result<Rgb, GridError> {
    let pixel_count = rect.pixel_count();
    if pixel_count == 0 {
        return Err(GridError::EmptyRegion { rect });
    }

    let right = rect.x.checked_add(rect.width);
    let bottom = rect.y.checked_add(rect.height);
    match (right, bottom) {
        (Some(right), Some(bottom)) if right <= image.width && bottom <= image.height => {}
        _ => return Err(GridError::RegionOutOfBounds { rect }),
    }

    let mut sum_r = 0u64;
    let mut sum_g = 0u64;
    let mut sum_b = 0u64;

    for y in rect.y..rect.y + rect.height {
        let row_start = image.pixel_offset(rect.x, y);
        let row = &image.rgba[row_start..row_start + rect.width as usize * 4];
        for pixel in row.chunks_exact(4) {
            sum_r += pixel[0] as u64;
            sum_g += pixel[1] as u64;
            sum_b += pixel[2] as u64;
        }
    }

    Ok(Rgb {
        r: (sum_r / pixel_count as u64) as u8,
        g: (sum_g / pixel_count as u64) as u8,
        b: (sum_b / pixel_count as u64) as u8,
    })
}

/// Mean color of an entire decoded image.
///
/// This is the per-upload target color: the upload is averaged whole, not
/// sub-gridded.
///
/// # Errors
/// Returns [`GridError::EmptyRegion`] for a zero-area image.
pub fn image_mean_color(image: &PixelImage) -> Result<Rgb, GridError> {
    mean_color(image, PixelRect::full(image))
}

/// Partitions `base` into `geometry` and indexes each cell's mean color.
///
/// Cells are emitted row-major (row outer, column inner) with `used=false`,
/// matching the stable iteration order matching relies on. Sample
/// rectangles floor both origin and size (see [`mosaic_core::sample_rect`]).
///
/// # Errors
/// Returns [`GridError::DegenerateGrid`] when the geometry floors any cell
/// to zero area (for example a grid finer than 1px per cell), before any
/// sampling division takes place.
pub fn build_index(base: &PixelImage, geometry: GridGeometry) -> Result<GridIndex, GridError> {
    let metrics = cell_metrics(base.width, base.height, geometry);
    let probe = sample_rect(metrics, 0, 0);
    if probe.width == 0 || probe.height == 0 {
        return Err(GridError::DegenerateGrid {
            cols: geometry.cols(),
            rows: geometry.rows(),
            image_width: base.width,
            image_height: base.height,
        });
    }

    let mut cells = Vec::with_capacity(geometry.cell_count());
    for row in 0..geometry.rows() {
        for col in 0..geometry.cols() {
            let rect = sample_rect(metrics, col, row);
            let mean = mean_color(base, rect)?;
            cells.push(GridCell {
                col,
                row,
                mean_color: mean,
                used: false,
            });
        }
    }

    GridIndex::from_cells(geometry, cells).map_err(GridError::Core)
}

/// Error type for sampling and index construction.
#[derive(Debug, Error)]
pub enum GridError {
    /// Region contains zero pixels; a mean is undefined.
    #[error("cannot average an empty region ({rect:?})")]
    EmptyRegion {
        /// Offending rectangle.
        rect: PixelRect,
    },
    /// Region extends past the image bounds.
    #[error("sample region exceeds image bounds ({rect:?})")]
    RegionOutOfBounds {
        /// Offending rectangle.
        rect: PixelRect,
    },
    /// Grid geometry floors a cell to zero area for this image.
    #[error(
        "grid {cols}x{rows} is degenerate for a {image_width}x{image_height} image (zero-area cell)"
    )]
    DegenerateGrid {
        /// Configured column count.
        cols: u32,
        /// Configured row count.
        rows: u32,
        /// Base image width.
        image_width: u32,
        /// Base image height.
        image_height: u32,
    },
    /// Core model validation failure while assembling the index.
    #[error("index assembly failure: {0}")]
    Core(#[from] mosaic_core::CoreError),
}

#[cfg(test)]
mod tests {
    //! Unit tests for sampling and index construction.

    use super::*;

    fn quadrant_image() -> PixelImage {
        // 4x4 image: quadrants pure red, green, blue, black (row-major).
        let colors = [
            Rgb::new(255, 0, 0),
            Rgb::new(0, 255, 0),
            Rgb::new(0, 0, 255),
            Rgb::new(0, 0, 0),
        ];
        let mut rgba = Vec::with_capacity(4 * 4 * 4);
        for y in 0..4u32 {
            for x in 0..4u32 {
                let quadrant = (y / 2) * 2 + (x / 2);
                let color = colors[quadrant as usize];
                rgba.extend_from_slice(&[color.r, color.g, color.b, 255]);
            }
        }
        PixelImage::new(4, 4, rgba).expect("quadrant image should be valid")
    }

    #[test]
    fn mean_color_ignores_alpha() {
        let mut image = PixelImage::filled(2, 2, Rgb::new(10, 20, 30)).expect("image should build");
        for pixel in image.rgba.chunks_exact_mut(4) {
            pixel[3] = 0;
        }

        let mean = image_mean_color(&image).expect("mean should compute");
        assert_eq!(mean, Rgb::new(10, 20, 30));
    }

    #[test]
    fn mean_color_floors_per_channel() {
        // Two pixels: (0,0,0) and (255,255,255) -> floor(255/2) = 127.
        let rgba = vec![0, 0, 0, 255, 255, 255, 255, 255];
        let image = PixelImage::new(2, 1, rgba).expect("image should build");
        let mean = image_mean_color(&image).expect("mean should compute");
        assert_eq!(mean, Rgb::new(127, 127, 127));
    }

    #[test]
    fn mean_color_rejects_out_of_bounds_rect() {
        let image = PixelImage::filled(2, 2, Rgb::new(0, 0, 0)).expect("image should build");
        let rect = PixelRect {
            x: 1,
            y: 1,
            width: 2,
            height: 2,
        };
        assert!(matches!(
            mean_color(&image, rect),
            Err(GridError::RegionOutOfBounds { .. })
        ));
    }

    #[test]
    fn build_index_emits_row_major_quadrant_means() {
        let image = quadrant_image();
        let geometry = GridGeometry::new(2, 2).expect("geometry should be valid");
        let index = build_index(&image, geometry).expect("index should build");

        let cells = index.cells();
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0].mean_color, Rgb::new(255, 0, 0));
        assert_eq!(cells[1].mean_color, Rgb::new(0, 255, 0));
        assert_eq!(cells[2].mean_color, Rgb::new(0, 0, 255));
        assert_eq!(cells[3].mean_color, Rgb::new(0, 0, 0));
        assert!(cells.iter().all(|cell| !cell.used));
    }

    #[test]
    fn build_index_rejects_sub_pixel_cells() {
        let image = PixelImage::filled(8, 8, Rgb::new(1, 1, 1)).expect("image should build");
        let geometry = GridGeometry::new(16, 16).expect("geometry should be valid");
        assert!(matches!(
            build_index(&image, geometry),
            Err(GridError::DegenerateGrid { .. })
        ));
    }

    #[test]
    fn build_index_cell_count_matches_geometry() {
        let image = PixelImage::filled(40, 25, Rgb::new(9, 9, 9)).expect("image should build");
        let geometry = GridGeometry::new(8, 5).expect("geometry should be valid");
        let index = build_index(&image, geometry).expect("index should build");
        assert_eq!(index.len(), 40);
    }
}
