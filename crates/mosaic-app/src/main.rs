#![warn(missing_docs)]
//! # mosaic-app binary
//!
//! Command-line entry point: builds the grid index from a base image,
//! matches and composites the given upload files, and writes the canvas
//! as a PNG.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use mosaic_app::{
    AppError, RunLogger, app_version, load_base_image, load_config, read_upload_source,
    render_summary, save_canvas_png,
};
use mosaic_upload::{MosaicPipeline, UploadStatus};

/// Photomosaic reveal: match uploaded images to grid cells of a base image.
#[derive(Debug, Parser)]
#[command(name = "mosaic-app", version = mosaic_app::APP_VERSION)]
struct Cli {
    /// Base image whose grid cells get revealed by matching uploads.
    base: PathBuf,

    /// Uploaded image files to match, in any number.
    uploads: Vec<PathBuf>,

    /// Optional JSON config file (grid shape, opacity, canvas size).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output PNG path for the composited canvas.
    #[arg(long, default_value = "mosaic.png")]
    output: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("mosaic-app failed: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let log_dir = cli
        .output
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let logger = RunLogger::new(&log_dir)?;
    logger.info("startup", "version", app_version());

    let config = load_config(cli.config.as_deref()).inspect_err(|error| {
        logger.error("config", "load_failed", &error.to_string());
    })?;
    logger.info(
        "config",
        "loaded",
        &format!(
            "grid={}x{} opacity={} canvas={}x{}",
            config.grid_cols,
            config.grid_rows,
            config.overlay_opacity,
            config.canvas_width,
            config.canvas_height
        ),
    );

    let base = load_base_image(&cli.base).inspect_err(|error| {
        logger.error("index", "base_load_failed", &error.to_string());
    })?;

    // Grid construction failures are fatal: no matching can proceed
    // without a valid index.
    let mut pipeline = MosaicPipeline::new(base, config).inspect_err(|error| {
        logger.error("index", "build_failed", &error.to_string());
    })?;
    logger.info(
        "index",
        "built",
        &format!("cells={}", pipeline.index().len()),
    );

    // Unreadable upload files are isolated: log, skip, continue others.
    let mut sources = Vec::with_capacity(cli.uploads.len());
    for path in &cli.uploads {
        match read_upload_source(path) {
            Ok(source) => sources.push(source),
            Err(error) => logger.error("uploads", "read_failed", &error.to_string()),
        }
    }

    let report = pipeline.process_uploads(sources);
    for outcome in &report.outcomes {
        match &outcome.status {
            UploadStatus::Composited { col, row } => logger.info(
                "uploads",
                "composited",
                &format!("name={} cell=({col},{row})", outcome.name),
            ),
            UploadStatus::Exhausted => {
                logger.info("uploads", "exhausted", &format!("name={}", outcome.name));
            }
            UploadStatus::DecodeFailed { reason } => logger.error(
                "uploads",
                "decode_failed",
                &format!("name={} reason={reason}", outcome.name),
            ),
            UploadStatus::Rejected { reason } => logger.error(
                "uploads",
                "rejected",
                &format!("name={} reason={reason}", outcome.name),
            ),
        }
    }

    save_canvas_png(pipeline.canvas(), &cli.output).inspect_err(|error| {
        logger.error("encode", "save_failed", &error.to_string());
    })?;
    logger.info("encode", "saved", &cli.output.display().to_string());

    println!("{}", render_summary(&report));
    println!(
        "canvas written to {} ({} cells unused)",
        cli.output.display(),
        pipeline.unused_remaining()
    );
    Ok(())
}
