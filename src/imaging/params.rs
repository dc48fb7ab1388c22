//! Parameter types for image operations.
//!
//! These structs describe *what* to render, not *how*. They are the interface
//! between [`process`](crate::process) (which decides which assets a run needs)
//! and the [`backend`](super::backend) (which does the pixel work), so the
//! pipeline can be exercised against a recording mock.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`OutputFormat`]: Encoder chosen from the output file extension.
//! - [`Canvas`]: One fixed-size target canvas and where its render goes.
//! - [`FitCropParams`]: One source rendered onto any number of canvases.
//! - [`IconParams`]: One logo square-cropped and rendered at several sizes.

use std::path::{Path, PathBuf};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Output encoders storefit writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
}

impl OutputFormat {
    /// Pick the encoder from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::from_extension(&ext)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    /// Canonical file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/// A fixed-size target canvas and the file its render is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub output: PathBuf,
}

/// Parameters for fitting one source onto several canvases.
///
/// The source is decoded once; every canvas is rendered independently.
#[derive(Debug, Clone, PartialEq)]
pub struct FitCropParams {
    pub source: PathBuf,
    pub canvases: Vec<Canvas>,
    pub quality: Quality,
}

/// A single square icon render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconTarget {
    pub size: u32,
    pub output: PathBuf,
}

/// Parameters for an icon set: square center-crop, then one downscale per target.
#[derive(Debug, Clone, PartialEq)]
pub struct IconParams {
    pub source: PathBuf,
    pub icons: Vec<IconTarget>,
    pub quality: Quality,
}
