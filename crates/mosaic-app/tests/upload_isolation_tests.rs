//! Integration tests for per-upload failure isolation.

mod common;

use std::path::Path;

use mosaic_app::read_upload_source;
use mosaic_core::{MosaicConfig, Rgb};
use mosaic_upload::{MosaicPipeline, UploadSource, UploadStatus};

#[test]
fn unreadable_upload_path_errors_without_panic() {
    assert!(read_upload_source(Path::new("/nonexistent/upload.png")).is_err());
}

#[test]
fn broken_bytes_do_not_disturb_sibling_uploads() {
    let config = MosaicConfig {
        grid_cols: 2,
        grid_rows: 2,
        overlay_opacity: 0.6,
        canvas_width: 4,
        canvas_height: 4,
    };
    let mut pipeline =
        MosaicPipeline::new(common::quadrant_base(), config).expect("pipeline should build");

    let report = pipeline.process_uploads(vec![
        UploadSource::new("broken.png", vec![1, 2, 3]),
        UploadSource::new("blue.png", common::png_bytes(2, 2, Rgb::new(0, 0, 255))),
    ]);

    assert_eq!(report.total(), 2);
    assert_eq!(report.failed(), 1);
    let composited = report
        .outcomes
        .iter()
        .find(|outcome| matches!(outcome.status, UploadStatus::Composited { .. }))
        .expect("blue upload should composite");
    assert_eq!(composited.name, "blue.png");
    assert_eq!(pipeline.unused_remaining(), 3);
}
