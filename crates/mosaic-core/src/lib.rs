#![warn(missing_docs)]
//! # mosaic-core
//!
//! ## Purpose
//! Defines the pure data model used across the `mosaic-reveal` workspace.
//!
//! ## Responsibilities
//! - Represent decoded pixel buffers, RGB colors, and pixel rectangles.
//! - Derive grid geometry (cell metrics and floored sample rectangles).
//! - Own the grid index and enforce its single-claim cell discipline.
//! - Carry validated runtime configuration with serde defaults.
//!
//! ## Data flow
//! Decode code emits [`PixelImage`] objects. Grid construction derives
//! [`CellMetrics`] and populates a row-major [`GridIndex`] of [`GridCell`]
//! entries. Matching claims cells through [`GridIndex::claim`] and hands a
//! [`MatchedCell`] snapshot to compositing.
//!
//! ## Ownership and lifetimes
//! Images and the grid index own their backing storage (`Vec<u8>`,
//! `Vec<GridCell>`) to avoid hidden borrow/lifetime coupling between
//! pipeline stages.
//!
//! ## Error model
//! Validation failures (shape mismatch, degenerate geometry, double claim,
//! out-of-range config) return [`CoreError`] variants with caller-actionable
//! categorization.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One color sample with 8-bit channels. Alpha is never part of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Constructs a color from channel values.
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Squared Euclidean distance to `other` in RGB space.
    ///
    /// # Semantics
    /// Squaring is monotonic in the true Euclidean norm, so ordering and
    /// strict-`<` tie-break comparisons are identical to comparing real
    /// distances, while staying exact in integer arithmetic. Maximum value
    /// is `3 * 255^2 = 195_075`, well inside `u32`.
    pub fn distance_squared(self, other: Rgb) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }
}

/// Owned decoded image buffer in RGBA row-major layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Raw RGBA bytes (`width * height * 4`).
    pub rgba: Vec<u8>,
}

impl PixelImage {
    /// Constructs a validated image.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidImageShape`] when the buffer length is
    /// not exactly `width * height * 4`.
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, CoreError> {
        let expected_len = required_rgba_len(width, height)?;
        if rgba.len() != expected_len {
            return Err(CoreError::InvalidImageShape {
                expected: expected_len,
                actual: rgba.len(),
            });
        }

        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// Constructs an image filled with one opaque color.
    ///
    /// # Errors
    /// Returns [`CoreError::DimensionOverflow`] when `width * height * 4`
    /// does not fit in `usize`.
    pub fn filled(width: u32, height: u32, color: Rgb) -> Result<Self, CoreError> {
        let len = required_rgba_len(width, height)?;
        let mut rgba = Vec::with_capacity(len);
        for _ in 0..len / 4 {
            rgba.extend_from_slice(&[color.r, color.g, color.b, 255]);
        }

        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// Byte offset of pixel `(x, y)` within the RGBA buffer.
    ///
    /// Callers must keep `x < width` and `y < height`.
    pub fn pixel_offset(&self, x: u32, y: u32) -> usize {
        ((y as usize * self.width as usize) + x as usize) * 4
    }
}

/// Rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelRect {
    /// Rectangle covering a whole image.
    pub fn full(image: &PixelImage) -> Self {
        Self {
            x: 0,
            y: 0,
            width: image.width,
            height: image.height,
        }
    }

    /// Pixel count inside the rectangle.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Validated grid shape (columns and rows).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    cols: u32,
    rows: u32,
}

impl GridGeometry {
    /// Creates validated grid geometry.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidGridGeometry`] when either dimension is
    /// zero.
    pub fn new(cols: u32, rows: u32) -> Result<Self, CoreError> {
        if cols == 0 || rows == 0 {
            return Err(CoreError::InvalidGridGeometry { cols, rows });
        }
        Ok(Self { cols, rows })
    }

    /// Column count.
    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Row count.
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Total cell count.
    pub fn cell_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }
}

/// Real-valued cell dimensions for one surface.
///
/// Always recomputed from the surface actually being read or drawn;
/// never cached across surfaces so metrics cannot desync from the
/// dimensions they describe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    /// Cell width in (fractional) pixels.
    pub cell_width: f64,
    /// Cell height in (fractional) pixels.
    pub cell_height: f64,
}

/// Computes per-cell metrics for a surface of the given pixel dimensions.
pub fn cell_metrics(surface_width: u32, surface_height: u32, geometry: GridGeometry) -> CellMetrics {
    CellMetrics {
        cell_width: surface_width as f64 / geometry.cols() as f64,
        cell_height: surface_height as f64 / geometry.rows() as f64,
    }
}

/// Floored sample rectangle for grid coordinate `(col, row)`.
///
/// # Semantics
/// Both the origin and the size are floored. This guarantees the rectangle
/// never reads past the surface bounds under floating-point rounding, at
/// the cost of up-to-1px gaps between sampled regions. Gaps are acceptable:
/// sampling feeds averaging, not coverage.
pub fn sample_rect(metrics: CellMetrics, col: u32, row: u32) -> PixelRect {
    PixelRect {
        x: (col as f64 * metrics.cell_width).floor() as u32,
        y: (row as f64 * metrics.cell_height).floor() as u32,
        width: metrics.cell_width.floor() as u32,
        height: metrics.cell_height.floor() as u32,
    }
}

/// One grid cell with its sampled mean color and claim state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    /// Column coordinate (`0..cols`).
    pub col: u32,
    /// Row coordinate (`0..rows`).
    pub row: u32,
    /// Mean color sampled from the base image at index-build time.
    pub mean_color: Rgb,
    /// Whether an upload has claimed this cell. Flips false -> true exactly
    /// once per session; never reverts.
    pub used: bool,
}

/// Snapshot of a freshly claimed cell, handed from matching to compositing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedCell {
    /// Column coordinate of the claimed cell.
    pub col: u32,
    /// Row coordinate of the claimed cell.
    pub row: u32,
    /// Mean color of the claimed cell.
    pub mean_color: Rgb,
}

/// Row-major sequence of grid cells with single-claim discipline.
///
/// Iteration order is row-major (row outer, column inner) and stable for
/// the life of the index; tie-breaks in matching rely on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridIndex {
    geometry: GridGeometry,
    cells: Vec<GridCell>,
}

impl GridIndex {
    /// Builds an index from a complete row-major cell sequence.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidIndexLength`] when `cells.len()` does not
    /// equal `geometry.cell_count()`.
    pub fn from_cells(geometry: GridGeometry, cells: Vec<GridCell>) -> Result<Self, CoreError> {
        if cells.len() != geometry.cell_count() {
            return Err(CoreError::InvalidIndexLength {
                expected: geometry.cell_count(),
                actual: cells.len(),
            });
        }

        Ok(Self { geometry, cells })
    }

    /// Grid geometry this index was built for.
    pub fn geometry(&self) -> GridGeometry {
        self.geometry
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    /// Total cell count.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` when the index holds no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Count of cells not yet claimed.
    pub fn unused_remaining(&self) -> usize {
        self.cells.iter().filter(|cell| !cell.used).count()
    }

    /// Claims the cell at `position` (row-major), flipping its `used` flag.
    ///
    /// This is the only writer of `used` in the workspace. Callers must
    /// hold the exclusive borrow across their scan-then-claim sequence so
    /// no other observer can see the cell unused after selection.
    ///
    /// # Errors
    /// Returns [`CoreError::CellOutOfRange`] for an invalid position and
    /// [`CoreError::CellAlreadyUsed`] when the cell was claimed before.
    pub fn claim(&mut self, position: usize) -> Result<MatchedCell, CoreError> {
        let cell = self
            .cells
            .get_mut(position)
            .ok_or(CoreError::CellOutOfRange { position })?;

        if cell.used {
            return Err(CoreError::CellAlreadyUsed {
                col: cell.col,
                row: cell.row,
            });
        }

        cell.used = true;
        Ok(MatchedCell {
            col: cell.col,
            row: cell.row,
            mean_color: cell.mean_color,
        })
    }
}

/// Runtime configuration with serde-backed defaults.
///
/// Mirrors the recognized options of the embedding application: grid shape,
/// overlay opacity, and output canvas dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MosaicConfig {
    /// Grid column count.
    #[serde(default = "default_grid_cols")]
    pub grid_cols: u32,
    /// Grid row count.
    #[serde(default = "default_grid_rows")]
    pub grid_rows: u32,
    /// Uploaded-image opacity when composited, in `[0.0, 1.0]`.
    #[serde(default = "default_overlay_opacity")]
    pub overlay_opacity: f32,
    /// Output canvas width in pixels.
    #[serde(default = "default_canvas_width")]
    pub canvas_width: u32,
    /// Output canvas height in pixels.
    #[serde(default = "default_canvas_height")]
    pub canvas_height: u32,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            grid_cols: default_grid_cols(),
            grid_rows: default_grid_rows(),
            overlay_opacity: default_overlay_opacity(),
            canvas_width: default_canvas_width(),
            canvas_height: default_canvas_height(),
        }
    }
}

impl MosaicConfig {
    /// Validates field ranges.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidGridGeometry`] for zero grid dimensions,
    /// [`CoreError::InvalidOpacity`] for opacity outside `[0.0, 1.0]`, and
    /// [`CoreError::InvalidCanvas`] for a zero-area canvas.
    pub fn validate(&self) -> Result<(), CoreError> {
        GridGeometry::new(self.grid_cols, self.grid_rows)?;
        if !(0.0..=1.0).contains(&self.overlay_opacity) {
            return Err(CoreError::InvalidOpacity(self.overlay_opacity));
        }
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(CoreError::InvalidCanvas {
                width: self.canvas_width,
                height: self.canvas_height,
            });
        }
        Ok(())
    }

    /// Grid geometry derived from the configured shape.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidGridGeometry`] for zero dimensions.
    pub fn geometry(&self) -> Result<GridGeometry, CoreError> {
        GridGeometry::new(self.grid_cols, self.grid_rows)
    }
}

fn default_grid_cols() -> u32 {
    40
}

fn default_grid_rows() -> u32 {
    25
}

fn default_overlay_opacity() -> f32 {
    0.6
}

fn default_canvas_width() -> u32 {
    800
}

fn default_canvas_height() -> u32 {
    500
}

/// Error type for core model validation failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Image buffer shape does not match declared dimensions.
    #[error("invalid image shape: expected {expected} bytes, got {actual}")]
    InvalidImageShape {
        /// Expected RGBA byte count.
        expected: usize,
        /// Actual RGBA byte count.
        actual: usize,
    },
    /// Image dimensions overflow addressable byte range.
    #[error("image dimension overflow")]
    DimensionOverflow,
    /// Grid dimensions must be strictly positive.
    #[error("invalid grid geometry: {cols}x{rows} (both dimensions must be >= 1)")]
    InvalidGridGeometry {
        /// Requested column count.
        cols: u32,
        /// Requested row count.
        rows: u32,
    },
    /// Cell sequence length does not match geometry.
    #[error("invalid index length: expected {expected} cells, got {actual}")]
    InvalidIndexLength {
        /// Expected cell count from geometry.
        expected: usize,
        /// Actual cell count supplied.
        actual: usize,
    },
    /// Claim position is outside the index.
    #[error("cell position {position} is out of range")]
    CellOutOfRange {
        /// Offending row-major position.
        position: usize,
    },
    /// Cell was already claimed; `used` never reverts.
    #[error("cell ({col}, {row}) was already claimed")]
    CellAlreadyUsed {
        /// Column of the contested cell.
        col: u32,
        /// Row of the contested cell.
        row: u32,
    },
    /// Overlay opacity outside the unit interval.
    #[error("overlay opacity {0} is outside [0.0, 1.0]")]
    InvalidOpacity(f32),
    /// Canvas must have non-zero area.
    #[error("invalid canvas dimensions: {width}x{height}")]
    InvalidCanvas {
        /// Requested canvas width.
        width: u32,
        /// Requested canvas height.
        height: u32,
    },
}

fn required_rgba_len(width: u32, height: u32) -> Result<usize, CoreError> {
    let pixels = (width as usize)
        .checked_mul(height as usize)
        .ok_or(CoreError::DimensionOverflow)?;

    pixels.checked_mul(4).ok_or(CoreError::DimensionOverflow)
}
