//! Screenshot and icon rendering.
//!
//! Stage 2 of the pipeline. Takes the [`SourceManifest`] from the scan stage
//! and renders every source onto every configured target canvas; separately
//! renders the icon set from the project logo.
//!
//! ## Output Structure
//!
//! ```text
//! store/
//! ├── screenshots/
//! │   ├── appstore/
//! │   │   ├── 01_today_67.png      # 1290x2796
//! │   │   ├── 01_today_65.png      # 1284x2778
//! │   │   └── ...
//! │   └── playstore/
//! │       ├── 01_today.png         # 1080x1920
//! │       └── ...
//! └── icons/
//!     ├── appstore_icon_1024.png
//!     ├── playstore_icon_512.png
//!     ├── ios/Icon-180.png
//!     └── android/mipmap-hdpi/ic_launcher.png
//! ```
//!
//! ## Failure Model
//!
//! Every (source, target) pair is independent. A source that cannot be read
//! is skipped and each of its targets is recorded as failed; the remaining
//! sources still render. The [`ProcessReport`] carries every outcome and
//! [`ProcessReport::ensure_complete`] turns any failure into an error for the
//! exit status.
//!
//! ## Parallel Processing
//!
//! Sources are processed in parallel using [rayon](https://docs.rs/rayon) on
//! the global pool (sized from `processing.max_processes` by the caller).
//! Reports are collected in source order regardless of pool size. Progress
//! events are sent as they happen, so their order across sources is not fixed.

use crate::config::{self, IconsConfig, ScreenshotsConfig};
use crate::imaging::{
    BackendError, Canvas, FitCropParams, IconParams, IconTarget, ImageBackend, OutputFormat,
    OutputResults, Quality, RustBackend, get_dimensions,
};
use crate::naming::output_file_name;
use crate::scan::{SourceImage, SourceManifest};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("{failed} output(s) failed, {skipped} source(s) skipped")]
    Incomplete { failed: usize, skipped: usize },
}

/// Progress events emitted while rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    SourceStarted {
        position: usize,
        total: usize,
        path: PathBuf,
        stem: String,
    },
    OutputWritten {
        label: String,
        path: PathBuf,
    },
    OutputFailed {
        label: String,
        path: PathBuf,
        error: String,
    },
    SourceSkipped {
        path: PathBuf,
        reason: String,
        output_count: usize,
    },
}

/// Outcome of one requested output.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub source: PathBuf,
    /// Target name for screenshots, `<size>px` for icons.
    pub label: String,
    pub path: PathBuf,
    pub error: Option<String>,
}

/// A source no output could be rendered from.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSource {
    pub path: PathBuf,
    pub reason: String,
}

/// Everything a processing run did, in source order.
#[derive(Debug, Clone, Default)]
pub struct ProcessReport {
    pub outputs: Vec<OutputRecord>,
    pub skipped: Vec<SkippedSource>,
}

impl ProcessReport {
    pub fn written(&self) -> impl Iterator<Item = &OutputRecord> {
        self.outputs.iter().filter(|o| o.error.is_none())
    }

    pub fn failed(&self) -> impl Iterator<Item = &OutputRecord> {
        self.outputs.iter().filter(|o| o.error.is_some())
    }

    pub fn written_count(&self) -> usize {
        self.written().count()
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    /// Combine reports of consecutive runs (e.g. screenshots then icons).
    pub fn merge(&mut self, other: ProcessReport) {
        self.outputs.extend(other.outputs);
        self.skipped.extend(other.skipped);
    }

    /// `Err` when any output failed or any source was skipped.
    pub fn ensure_complete(&self) -> Result<(), ProcessError> {
        let failed = self.failed_count();
        let skipped = self.skipped.len();
        if failed > 0 || skipped > 0 {
            return Err(ProcessError::Incomplete { failed, skipped });
        }
        Ok(())
    }
}

/// One source and the canvases it is rendered onto.
#[derive(Debug, Clone)]
pub struct ScreenshotJob {
    pub source: SourceImage,
    /// Target names, parallel to `params.canvases`.
    pub labels: Vec<String>,
    pub params: FitCropParams,
}

/// Decide every output path for a run, without touching any pixels.
pub fn plan_screenshots(
    config: &ScreenshotsConfig,
    manifest: &SourceManifest,
    root: &Path,
) -> Vec<ScreenshotJob> {
    let output_dir = config::resolve_path(root, &config.output_dir);
    let extension = OutputFormat::from(config.format).extension();
    let quality = Quality::new(config.quality);

    manifest
        .sources
        .iter()
        .map(|source| {
            let canvases = config
                .targets
                .iter()
                .map(|target| Canvas {
                    width: target.width,
                    height: target.height,
                    output: output_dir.join(&target.dir).join(output_file_name(
                        &source.stem,
                        &target.suffix,
                        extension,
                    )),
                })
                .collect();
            ScreenshotJob {
                source: source.clone(),
                labels: config.targets.iter().map(|t| t.name.clone()).collect(),
                params: FitCropParams {
                    source: source.path.clone(),
                    canvases,
                    quality,
                },
            }
        })
        .collect()
}

/// Render every screenshot source with the built-in backend.
pub fn process_screenshots(
    config: &ScreenshotsConfig,
    manifest: &SourceManifest,
    root: &Path,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<ProcessReport, ProcessError> {
    let backend = RustBackend::new();
    process_screenshots_with_backend(&backend, config, manifest, root, progress)
}

/// Render screenshots using a specific backend (allows testing with mock).
pub fn process_screenshots_with_backend(
    backend: &impl ImageBackend,
    config: &ScreenshotsConfig,
    manifest: &SourceManifest,
    root: &Path,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<ProcessReport, ProcessError> {
    let jobs = plan_screenshots(config, manifest, root);
    let total = jobs.len();

    let output_dir = config::resolve_path(root, &config.output_dir);
    for target in &config.targets {
        std::fs::create_dir_all(output_dir.join(&target.dir))?;
    }

    let started = Instant::now();
    let reports: Vec<ProcessReport> = jobs
        .par_iter()
        .map(|job| {
            emit(
                progress.as_ref(),
                ProcessEvent::SourceStarted {
                    position: job.source.position,
                    total,
                    path: job.source.path.clone(),
                    stem: job.source.stem.clone(),
                },
            );
            let source_started = Instant::now();
            let result = backend.fit_crop(&job.params);
            debug!(
                source = %job.source.path.display(),
                elapsed_ms = source_started.elapsed().as_millis() as u64,
                "rendered screenshot source"
            );
            let outputs: Vec<(&str, &Path)> = job
                .labels
                .iter()
                .zip(&job.params.canvases)
                .map(|(label, canvas)| (label.as_str(), canvas.output.as_path()))
                .collect();
            collect_outputs(&job.source.path, &outputs, result, progress.as_ref())
        })
        .collect();

    let mut report = ProcessReport::default();
    for r in reports {
        report.merge(r);
    }
    debug!(
        sources = total,
        written = report.written_count(),
        failed = report.failed_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "screenshot run finished"
    );
    Ok(report)
}

/// Icon render request for the configured logo.
pub fn plan_icons(config: &IconsConfig, root: &Path) -> IconParams {
    let output_dir = config::resolve_path(root, &config.output_dir);
    IconParams {
        source: config::resolve_path(root, &config.source),
        icons: config
            .outputs
            .iter()
            .map(|o| IconTarget {
                size: o.size,
                output: output_dir.join(&o.path),
            })
            .collect(),
        quality: Quality::new(config.quality),
    }
}

/// Render the icon set with the built-in backend.
pub fn process_icons(
    config: &IconsConfig,
    root: &Path,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<ProcessReport, ProcessError> {
    let backend = RustBackend::new();
    process_icons_with_backend(&backend, config, root, progress)
}

/// Render icons using a specific backend (allows testing with mock).
pub fn process_icons_with_backend(
    backend: &impl ImageBackend,
    config: &IconsConfig,
    root: &Path,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<ProcessReport, ProcessError> {
    let params = plan_icons(config, root);
    emit(
        progress.as_ref(),
        ProcessEvent::SourceStarted {
            position: 1,
            total: 1,
            path: params.source.clone(),
            stem: "icons".to_string(),
        },
    );

    let started = Instant::now();
    let result = backend.icons(&params);
    debug!(
        icons = params.icons.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "rendered icon set"
    );

    let labels: Vec<String> = params
        .icons
        .iter()
        .map(|i| format!("{}px", i.size))
        .collect();
    let outputs: Vec<(&str, &Path)> = labels
        .iter()
        .zip(&params.icons)
        .map(|(label, icon)| (label.as_str(), icon.output.as_path()))
        .collect();
    Ok(collect_outputs(
        &params.source,
        &outputs,
        result,
        progress.as_ref(),
    ))
}

/// Header read of one source during `check`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeRecord {
    pub path: PathBuf,
    /// `(width, height)`, or why the file cannot be decoded.
    pub result: Result<(u32, u32), String>,
}

/// Read the header of every present screenshot source and of the logo.
///
/// Listed sources that do not exist are left out; the scan already reports
/// them. Nothing is decoded past the header and nothing is written.
pub fn identify_sources(
    manifest: &SourceManifest,
    icons: &IconsConfig,
    root: &Path,
) -> Vec<DecodeRecord> {
    let backend = RustBackend::new();
    identify_sources_with_backend(&backend, manifest, icons, root)
}

/// Identify sources using a specific backend (allows testing with mock).
pub fn identify_sources_with_backend(
    backend: &impl ImageBackend,
    manifest: &SourceManifest,
    icons: &IconsConfig,
    root: &Path,
) -> Vec<DecodeRecord> {
    let logo = config::resolve_path(root, &icons.source);
    manifest
        .sources
        .iter()
        .filter(|s| s.present)
        .map(|s| s.path.clone())
        .chain(std::iter::once(logo))
        .map(|path| {
            let result = get_dimensions(backend, &path).map_err(|e| e.to_string());
            if let Err(error) = &result {
                warn!(source = %path.display(), error = %error, "source cannot be decoded");
            }
            DecodeRecord { path, result }
        })
        .collect()
}

/// Turn one backend call into report records and progress events.
fn collect_outputs(
    source: &Path,
    outputs: &[(&str, &Path)],
    result: Result<OutputResults, BackendError>,
    progress: Option<&Sender<ProcessEvent>>,
) -> ProcessReport {
    let mut report = ProcessReport::default();

    let results = match result {
        Ok(results) => results,
        Err(e) => {
            let reason = e.to_string();
            warn!(source = %source.display(), error = %reason, "skipping source");
            emit(
                progress,
                ProcessEvent::SourceSkipped {
                    path: source.to_path_buf(),
                    reason: reason.clone(),
                    output_count: outputs.len(),
                },
            );
            report.outputs = outputs
                .iter()
                .map(|(label, path)| OutputRecord {
                    source: source.to_path_buf(),
                    label: label.to_string(),
                    path: path.to_path_buf(),
                    error: Some(reason.clone()),
                })
                .collect();
            report.skipped.push(SkippedSource {
                path: source.to_path_buf(),
                reason,
            });
            return report;
        }
    };

    for ((label, path), result) in outputs.iter().zip(results) {
        let error = match result {
            Ok(()) => {
                emit(
                    progress,
                    ProcessEvent::OutputWritten {
                        label: label.to_string(),
                        path: path.to_path_buf(),
                    },
                );
                None
            }
            Err(e) => {
                let error = e.to_string();
                warn!(output = %path.display(), error = %error, "output failed");
                emit(
                    progress,
                    ProcessEvent::OutputFailed {
                        label: label.to_string(),
                        path: path.to_path_buf(),
                        error: error.clone(),
                    },
                );
                Some(error)
            }
        };
        report.outputs.push(OutputRecord {
            source: source.to_path_buf(),
            label: label.to_string(),
            path: path.to_path_buf(),
            error,
        });
    }
    report
}

fn emit(progress: Option<&Sender<ProcessEvent>>, event: ProcessEvent) {
    if let Some(tx) = progress {
        // A closed receiver only means nobody is listening any more
        let _ = tx.send(event);
    }
}
