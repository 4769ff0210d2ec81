#![warn(missing_docs)]
//! # mosaic-app
//!
//! ## Purpose
//! Wires configuration, file I/O, logging, and the pipeline into the
//! `mosaic-app` binary.
//!
//! ## Responsibilities
//! - Load and validate JSON configuration (defaults for missing fields).
//! - Read the base image and upload files into owned byte buffers.
//! - Provide the per-run file logger used by the binary.
//! - Encode the finished canvas as PNG.
//!
//! ## Data flow
//! CLI args -> config + base image -> [`mosaic_upload::MosaicPipeline`] ->
//! canvas PNG + human-readable summary + run log.
//!
//! ## Error model
//! Subsystem failures are wrapped in [`AppError`]. Grid construction
//! failures are fatal; per-upload read failures are isolated by the binary
//! (logged and skipped) rather than surfaced here.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::ImageFormat;
use mosaic_compose::Canvas;
use mosaic_core::{CoreError, MosaicConfig, PixelImage};
use mosaic_upload::{
    DecodeError, PipelineError, PipelineReport, UploadSource, UploadStatus, decode_upload,
};
use thiserror::Error;
use time::OffsetDateTime;

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("MOSAIC_REVEAL_VERSION");

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Loads configuration from an optional JSON file.
///
/// `None` yields the built-in defaults (40x25 grid, 0.6 opacity, 800x500
/// canvas). A present file may name any subset of fields; the rest fall
/// back to defaults.
///
/// # Errors
/// Returns [`AppError::ConfigRead`]/[`AppError::ConfigParse`] for I/O and
/// JSON failures and [`AppError::Core`] when the loaded values fail range
/// validation.
pub fn load_config(path: Option<&Path>) -> Result<MosaicConfig, AppError> {
    let config = match path {
        None => MosaicConfig::default(),
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
                path: path.display().to_string(),
                source,
            })?;
            serde_json::from_str(&raw)?
        }
    };

    config.validate()?;
    Ok(config)
}

/// Reads and decodes the base image.
///
/// # Errors
/// Returns [`AppError::FileRead`] or [`AppError::Decode`].
pub fn load_base_image(path: &Path) -> Result<PixelImage, AppError> {
    let bytes = std::fs::read(path).map_err(|source| AppError::FileRead {
        path: path.display().to_string(),
        source,
    })?;
    Ok(decode_upload(&bytes)?)
}

/// Reads one upload file into an [`UploadSource`].
///
/// Decoding stays deferred to the pipeline's worker threads; this only
/// captures the bytes and a display name.
///
/// # Errors
/// Returns [`AppError::FileRead`] when the file cannot be read.
pub fn read_upload_source(path: &Path) -> Result<UploadSource, AppError> {
    let bytes = std::fs::read(path).map_err(|source| AppError::FileRead {
        path: path.display().to_string(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(UploadSource::new(name, bytes))
}

/// Encodes the canvas as a PNG file.
///
/// # Errors
/// Returns [`AppError::CanvasBuffer`] when the canvas buffer does not match
/// its declared dimensions and [`AppError::Encode`] on encoder failure.
pub fn save_canvas_png(canvas: &Canvas, path: &Path) -> Result<(), AppError> {
    let image = image::RgbaImage::from_raw(canvas.width, canvas.height, canvas.rgba.clone())
        .ok_or(AppError::CanvasBuffer)?;
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Renders a one-screen batch summary for stdout.
pub fn render_summary(report: &PipelineReport) -> String {
    let mut lines = vec![format!(
        "{} uploads: {} composited, {} exhausted, {} failed",
        report.total(),
        report.composited(),
        report.exhausted(),
        report.failed()
    )];

    for outcome in &report.outcomes {
        let line = match &outcome.status {
            UploadStatus::Composited { col, row } => {
                format!("  {} -> cell ({col}, {row})", outcome.name)
            }
            UploadStatus::Exhausted => {
                format!("  {} -> no unused cell left, skipped", outcome.name)
            }
            UploadStatus::DecodeFailed { reason } => {
                format!("  {} -> decode failed: {reason}", outcome.name)
            }
            UploadStatus::Rejected { reason } => {
                format!("  {} -> rejected: {reason}", outcome.name)
            }
        };
        lines.push(line);
    }

    lines.join("\n")
}

/// Per-run file logger writing `LEVEL | stage | action | detail` lines.
#[derive(Debug)]
pub struct RunLogger {
    file: Mutex<File>,
    path: PathBuf,
}

impl RunLogger {
    /// Creates a timestamped log file inside `dir`.
    ///
    /// # Errors
    /// Returns [`AppError::Logger`] when the file cannot be created.
    pub fn new(dir: &Path) -> Result<Self, AppError> {
        let timestamp = timestamp_compact_utc();
        let path = dir.join(format!("{timestamp}_log.txt"));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|error| {
                AppError::Logger(format!(
                    "unable to create log file '{}': {error}",
                    path.display()
                ))
            })?;

        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    /// Path of the backing log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one log line; ERROR lines are flushed immediately.
    pub fn write_line(&self, level: &str, stage: &str, action: &str, detail: &str) {
        let timestamp = timestamp_compact_utc();
        let line = format!("{timestamp} | {level} | {stage} | {action} | {detail}\n");

        if let Ok(mut file) = self.file.lock() {
            let _ = file.write_all(line.as_bytes());
            if level == "ERROR" {
                let _ = file.flush();
            }
        }
    }

    /// Appends one INFO line.
    pub fn info(&self, stage: &str, action: &str, detail: &str) {
        self.write_line("INFO", stage, action, detail);
    }

    /// Appends one ERROR line.
    pub fn error(&self, stage: &str, action: &str, detail: &str) {
        self.write_line("ERROR", stage, action, detail);
    }
}

fn timestamp_compact_utc() -> String {
    let now = OffsetDateTime::now_utc();
    format!(
        "{:04}{:02}{:02}_{:02}{:02}{:02}",
        now.year(),
        now.month() as u8,
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Config file could not be read.
    #[error("config read failed for '{path}': {source}")]
    ConfigRead {
        /// Offending path.
        path: String,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// Config file is not valid JSON for [`MosaicConfig`].
    #[error("config parse failed: {0}")]
    ConfigParse(#[from] serde_json::Error),
    /// Core model validation error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    /// Image or upload file could not be read.
    #[error("file read failed for '{path}': {source}")]
    FileRead {
        /// Offending path.
        path: String,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// Base image could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    /// Pipeline construction error (fatal; no matching can proceed).
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
    /// Canvas buffer does not match its declared dimensions.
    #[error("canvas buffer does not match its dimensions")]
    CanvasBuffer,
    /// PNG encoding failure.
    #[error("png encode failed: {0}")]
    Encode(#[from] image::ImageError),
    /// Run logger setup failure.
    #[error("logger setup failed: {0}")]
    Logger(String),
}

#[cfg(test)]
mod tests {
    //! Unit tests for summary rendering and config defaults.

    use mosaic_upload::UploadOutcome;

    use super::*;

    #[test]
    fn missing_config_path_yields_defaults() {
        let config = load_config(None).expect("defaults should load");
        assert_eq!(config, MosaicConfig::default());
    }

    #[test]
    fn summary_lists_each_outcome() {
        let report = PipelineReport {
            outcomes: vec![
                UploadOutcome {
                    name: "a.png".to_string(),
                    status: UploadStatus::Composited { col: 1, row: 2 },
                },
                UploadOutcome {
                    name: "b.png".to_string(),
                    status: UploadStatus::Exhausted,
                },
            ],
        };

        let summary = render_summary(&report);
        assert!(summary.starts_with("2 uploads: 1 composited, 1 exhausted, 0 failed"));
        assert!(summary.contains("a.png -> cell (1, 2)"));
        assert!(summary.contains("b.png -> no unused cell left"));
    }

    #[test]
    fn app_version_is_non_empty() {
        assert!(!app_version().is_empty());
    }
}
