#![warn(missing_docs)]
//! # mosaic-upload
//!
//! ## Purpose
//! Orchestrates the per-upload decode -> sample -> match -> composite flow.
//!
//! ## Responsibilities
//! - Decode each uploaded file on its own worker thread.
//! - Drain decode completions in arrival order, which is deliberately
//!   unordered across files.
//! - Run the synchronous sample/match/composite sequence as the single
//!   owner of the grid index and canvas.
//! - Report one outcome per upload, isolating decode failures.
//!
//! ## Data flow
//! `Vec<UploadSource>` -> worker threads (`image` decode) -> mpsc channel ->
//! [`MosaicPipeline::process_uploads`] consumer -> canvas mutation +
//! [`PipelineReport`].
//!
//! ## Ownership and lifetimes
//! The pipeline owns the base image, grid index, and canvas. Workers own
//! only the bytes they decode; decoded images are moved to the consumer and
//! dropped right after compositing. The consumer is the sole writer of the
//! index and canvas, so the scan-then-claim critical section never runs
//! concurrently (actor-style single ownership instead of a mutex).
//!
//! ## Error model
//! Construction failures (degenerate grid or canvas) are fatal and surface
//! as [`PipelineError`]. Per-upload failures never escape their
//! [`UploadStatus`] entry and never touch the grid index.

use std::sync::mpsc;
use std::thread::JoinHandle;

use mosaic_compose::{Canvas, ComposeError, composite_cell};
use mosaic_core::{CoreError, GridGeometry, GridIndex, MosaicConfig, PixelImage, cell_metrics, sample_rect};
use mosaic_grid::{GridError, build_index, image_mean_color};
use mosaic_match::find_nearest_unused;
use serde::Serialize;
use thiserror::Error;

/// One user-selected file, named for reporting and carrying its raw bytes.
#[derive(Debug, Clone)]
pub struct UploadSource {
    /// Display name used in reports and logs.
    pub name: String,
    /// Undecoded file contents.
    pub bytes: Vec<u8>,
}

impl UploadSource {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Final status of one upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadStatus {
    /// Upload was matched and drawn onto the canvas.
    Composited {
        /// Column of the claimed cell.
        col: u32,
        /// Row of the claimed cell.
        row: u32,
    },
    /// Every cell was already claimed; nothing was drawn.
    Exhausted,
    /// The file's bytes could not be decoded; other uploads are unaffected.
    DecodeFailed {
        /// Human-readable decode failure.
        reason: String,
    },
    /// Decoded fine but could not be sampled or drawn.
    Rejected {
        /// Human-readable rejection cause.
        reason: String,
    },
}

/// Per-upload outcome in completion (arrival) order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    /// Name carried over from the [`UploadSource`].
    pub name: String,
    /// Final status of this upload.
    #[serde(flatten)]
    pub status: UploadStatus,
}

/// Summary of one `process_uploads` batch.
///
/// Outcomes appear in decode-completion order, which is not guaranteed to
/// match submission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    /// One entry per dispatched upload.
    pub outcomes: Vec<UploadOutcome>,
}

impl PipelineReport {
    /// Count of uploads drawn onto the canvas.
    pub fn composited(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome.status, UploadStatus::Composited { .. }))
            .count()
    }

    /// Count of uploads that found no unused cell.
    pub fn exhausted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status == UploadStatus::Exhausted)
            .count()
    }

    /// Count of uploads that failed to decode or draw.
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| {
                matches!(
                    outcome.status,
                    UploadStatus::DecodeFailed { .. } | UploadStatus::Rejected { .. }
                )
            })
            .count()
    }

    /// Total dispatched uploads.
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

/// Decodes one upload's bytes into an owned RGBA image.
///
/// # Errors
/// Returns [`DecodeError::Decode`] for undecodable bytes and
/// [`DecodeError::Shape`] when the decoded buffer fails model validation.
pub fn decode_upload(bytes: &[u8]) -> Result<PixelImage, DecodeError> {
    let decoded = image::load_from_memory(bytes)?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    PixelImage::new(width, height, rgba.into_raw()).map_err(DecodeError::Shape)
}

struct DecodeEvent {
    name: String,
    result: Result<PixelImage, DecodeError>,
}

/// Session-long photomosaic state: base image, grid index, and canvas.
#[derive(Debug)]
pub struct MosaicPipeline {
    base: PixelImage,
    geometry: GridGeometry,
    index: GridIndex,
    canvas: Canvas,
    overlay_opacity: f32,
}

impl MosaicPipeline {
    /// Builds the grid index from `base` and prepares a fresh canvas.
    ///
    /// Canvas dimensions come from `config` and are frozen here for the
    /// session; cell rectangles are recomputed from this canvas on every
    /// composite, so geometry cannot desync from the surface being drawn.
    ///
    /// # Errors
    /// Returns [`PipelineError`] when the config is invalid, the grid is
    /// degenerate for the base image, or the canvas cannot hold one cell
    /// per grid coordinate.
    pub fn new(base: PixelImage, config: MosaicConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let geometry = config.geometry()?;
        let index = build_index(&base, geometry)?;
        let canvas = Canvas::new(config.canvas_width, config.canvas_height)?;

        // The grid must also be drawable on the configured canvas, not
        // just sampleable from the base image.
        let canvas_probe = sample_rect(cell_metrics(canvas.width, canvas.height, geometry), 0, 0);
        if canvas_probe.pixel_count() == 0 {
            return Err(PipelineError::Compose(ComposeError::DegenerateCell {
                col: 0,
                row: 0,
            }));
        }

        Ok(Self {
            base,
            geometry,
            index,
            canvas,
            overlay_opacity: config.overlay_opacity,
        })
    }

    /// The output surface, mutated in place as matches land.
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// The grid index (cells plus claim state).
    pub fn index(&self) -> &GridIndex {
        &self.index
    }

    /// Count of cells still available for matching.
    pub fn unused_remaining(&self) -> usize {
        self.index.unused_remaining()
    }

    /// Decodes and composites one batch of uploads.
    ///
    /// Ownership of `uploads` transfers here: dispatching consumes the
    /// selection, leaving the caller with fresh state for the next batch.
    /// Every file gets a worker thread immediately (no backpressure, no
    /// cancellation); completions are drained in arrival order and each
    /// decoded image runs its sample/match/composite sequence to completion
    /// before the next event is taken, so the claim invariant holds without
    /// locking.
    pub fn process_uploads(&mut self, uploads: Vec<UploadSource>) -> PipelineReport {
        let (sender, receiver) = mpsc::channel::<DecodeEvent>();
        let mut workers: Vec<JoinHandle<()>> = Vec::with_capacity(uploads.len());

        for upload in uploads {
            let worker_sender = sender.clone();
            workers.push(std::thread::spawn(move || {
                let result = decode_upload(&upload.bytes);
                // Receiver may already be gone if the consumer panicked;
                // nothing useful to do with the error then.
                let _ = worker_sender.send(DecodeEvent {
                    name: upload.name,
                    result,
                });
            }));
        }
        drop(sender);

        let mut outcomes = Vec::with_capacity(workers.len());
        for event in receiver {
            let status = match event.result {
                Ok(decoded) => self.apply_decoded(&decoded),
                Err(error) => UploadStatus::DecodeFailed {
                    reason: error.to_string(),
                },
            };
            outcomes.push(UploadOutcome {
                name: event.name,
                status,
            });
        }

        for worker in workers {
            let _ = worker.join();
        }

        PipelineReport { outcomes }
    }

    /// Synchronous sample -> match -> composite for one decoded upload.
    ///
    /// No suspension point exists between the index scan and the claim;
    /// `&mut self` keeps this the sole accessor for the whole sequence.
    fn apply_decoded(&mut self, decoded: &PixelImage) -> UploadStatus {
        let target = match image_mean_color(decoded) {
            Ok(color) => color,
            Err(error) => {
                return UploadStatus::Rejected {
                    reason: error.to_string(),
                };
            }
        };

        let Some(cell) = find_nearest_unused(&mut self.index, target) else {
            return UploadStatus::Exhausted;
        };

        match composite_cell(
            &mut self.canvas,
            &self.base,
            decoded,
            cell,
            self.geometry,
            self.overlay_opacity,
        ) {
            Ok(()) => UploadStatus::Composited {
                col: cell.col,
                row: cell.row,
            },
            Err(error) => UploadStatus::Rejected {
                reason: error.to_string(),
            },
        }
    }
}

/// Error type for per-file decoding.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Bytes are not a decodable image.
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
    /// Decoded buffer failed model validation.
    #[error("decoded image rejected: {0}")]
    Shape(CoreError),
}

/// Error type for pipeline construction.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration or model validation failure.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    /// Grid construction failure (fatal; no matching can proceed).
    #[error("grid error: {0}")]
    Grid(#[from] GridError),
    /// Canvas construction or geometry failure.
    #[error("compose error: {0}")]
    Compose(#[from] ComposeError),
}

#[cfg(test)]
mod tests {
    //! Unit tests for the upload pipeline over in-memory images.

    use std::io::Cursor;

    use image::{ImageFormat, RgbaImage};
    use mosaic_core::Rgb;

    use super::*;

    fn png_bytes(width: u32, height: u32, color: Rgb) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, image::Rgba([color.r, color.g, color.b, 255]));
        let mut bytes = Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, ImageFormat::Png)
            .expect("png encode should succeed");
        bytes.into_inner()
    }

    fn quadrant_base() -> PixelImage {
        let colors = [
            Rgb::new(255, 0, 0),
            Rgb::new(0, 255, 0),
            Rgb::new(0, 0, 255),
            Rgb::new(0, 0, 0),
        ];
        let mut rgba = Vec::new();
        for y in 0..4u32 {
            for x in 0..4u32 {
                let color = colors[((y / 2) * 2 + (x / 2)) as usize];
                rgba.extend_from_slice(&[color.r, color.g, color.b, 255]);
            }
        }
        PixelImage::new(4, 4, rgba).expect("base should build")
    }

    fn small_config() -> MosaicConfig {
        MosaicConfig {
            grid_cols: 2,
            grid_rows: 2,
            overlay_opacity: 0.6,
            canvas_width: 4,
            canvas_height: 4,
        }
    }

    #[test]
    fn valid_upload_is_decoded_matched_and_drawn() {
        let mut pipeline =
            MosaicPipeline::new(quadrant_base(), small_config()).expect("pipeline should build");
        let report = pipeline.process_uploads(vec![UploadSource::new(
            "red.png",
            png_bytes(1, 1, Rgb::new(255, 0, 0)),
        )]);

        assert_eq!(report.total(), 1);
        assert_eq!(report.composited(), 1);
        assert_eq!(
            report.outcomes[0].status,
            UploadStatus::Composited { col: 0, row: 0 }
        );
        assert_eq!(pipeline.unused_remaining(), 3);
    }

    #[test]
    fn decode_failure_is_isolated_from_other_uploads() {
        let mut pipeline =
            MosaicPipeline::new(quadrant_base(), small_config()).expect("pipeline should build");
        let report = pipeline.process_uploads(vec![
            UploadSource::new("broken.bin", vec![0xde, 0xad, 0xbe, 0xef]),
            UploadSource::new("green.png", png_bytes(1, 1, Rgb::new(0, 255, 0))),
        ]);

        assert_eq!(report.total(), 2);
        assert_eq!(report.composited(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(pipeline.unused_remaining(), 3, "failure must not claim a cell");
    }

    #[test]
    fn uploads_beyond_cell_count_report_exhausted() {
        let config = MosaicConfig {
            grid_cols: 1,
            grid_rows: 1,
            ..small_config()
        };
        let mut pipeline =
            MosaicPipeline::new(quadrant_base(), config).expect("pipeline should build");

        let uploads = (0..2)
            .map(|index| {
                UploadSource::new(format!("upload-{index}.png"), png_bytes(1, 1, Rgb::new(9, 9, 9)))
            })
            .collect();
        let report = pipeline.process_uploads(uploads);

        assert_eq!(report.composited(), 1);
        assert_eq!(report.exhausted(), 1);
        assert_eq!(pipeline.unused_remaining(), 0);
    }

    #[test]
    fn empty_selection_yields_empty_report() {
        let mut pipeline =
            MosaicPipeline::new(quadrant_base(), small_config()).expect("pipeline should build");
        let report = pipeline.process_uploads(Vec::new());
        assert!(report.outcomes.is_empty());
    }

    #[test]
    fn degenerate_grid_is_fatal_at_construction() {
        let config = MosaicConfig {
            grid_cols: 16,
            grid_rows: 16,
            ..small_config()
        };
        assert!(matches!(
            MosaicPipeline::new(quadrant_base(), config),
            Err(PipelineError::Grid(GridError::DegenerateGrid { .. }))
        ));
    }

    #[test]
    fn report_serializes_with_flat_status() {
        let report = PipelineReport {
            outcomes: vec![UploadOutcome {
                name: "a.png".to_string(),
                status: UploadStatus::Composited { col: 3, row: 1 },
            }],
        };
        let json = serde_json::to_value(&report).expect("report should serialize");
        assert_eq!(json["outcomes"][0]["status"], "composited");
        assert_eq!(json["outcomes"][0]["col"], 3);
    }
}
