//! Image processing: pure Rust, statically linked.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Fit-and-crop** | exact cover geometry + `resize_exact` (Lanczos3) + `crop_imm` |
//! | **Icon set** | square `crop_imm` + one Lanczos3 downscale per size |
//! | **Encode** | PNG / JPEG via `image::codecs`, written atomically |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for cover/crop geometry (unit testable)
//! - **Parameters**: Data structures describing renders
//! - **Operations**: The transform on decoded rasters
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, OutputResults};
pub use calculations::{
    FitPlan, calculate_crop_offsets, calculate_fill_dimensions, calculate_square_crop, plan_fit,
};
pub use operations::{fit_crop, get_dimensions, render_icon, square_crop};
pub use params::{Canvas, FitCropParams, IconParams, IconTarget, OutputFormat, Quality};
pub use rust_backend::{RustBackend, is_supported_input, supported_input_extensions};
