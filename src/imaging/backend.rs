//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations every backend must
//! support: identify, fit_crop, and icons.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust and statically
//! linked into the binary.
//!
//! Render calls return two layers of results. The outer `Result` fails when
//! the source itself is unusable (nothing can be rendered from it); the inner
//! `Vec` holds one result per requested output, in request order, so a single
//! failed write never hides the outputs that succeeded.

use super::params::{FitCropParams, IconParams};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source image not found or unreadable: {}: {reason}", path.display())]
    NotFound { path: PathBuf, reason: String },
    #[error("Invalid dimensions {width}x{height}: width and height must be positive")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

impl BackendError {
    pub fn not_found(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self::NotFound {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl From<Dimensions> for (u32, u32) {
    fn from(d: Dimensions) -> Self {
        (d.width, d.height)
    }
}

/// One result per requested output, in request order.
pub type OutputResults = Vec<Result<(), BackendError>>;

/// Trait for image processing backends.
///
/// `Sync` so a single backend can be shared across rayon workers.
pub trait ImageBackend: Sync {
    /// Get image dimensions without a full decode where possible.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Fit-and-crop one source onto every canvas in `params`.
    fn fit_crop(&self, params: &FitCropParams) -> Result<OutputResults, BackendError>;

    /// Square-crop one logo and render it at every icon size in `params`.
    fn icons(&self, params: &IconParams) -> Result<OutputResults, BackendError>;
}
