//! The fit-and-crop transform on decoded rasters.
//!
//! These functions combine the pure geometry in
//! [`calculations`](super::calculations) with the `image` crate's resampling.
//! They never touch the filesystem; decoding and encoding belong to the
//! backend.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{calculate_square_crop, plan_fit};
use image::DynamicImage;
use image::imageops::FilterType;
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Resampling filter for every resize storefit performs.
pub const RESAMPLE_FILTER: FilterType = FilterType::Lanczos3;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    Ok(backend.identify(path)?.into())
}

fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(BackendError::InvalidDimensions { width, height });
    }
    Ok(())
}

/// Resize `source` to cover a `target_width`×`target_height` canvas, then
/// center-crop the overflow.
///
/// The output is exactly the target size. The intermediate resize keeps the
/// source aspect ratio; when it would keep the source size too, no
/// resampling happens and the crop works on the original pixels. Color
/// channels are preserved.
pub fn fit_crop(
    source: &DynamicImage,
    target_width: u32,
    target_height: u32,
) -> Result<DynamicImage> {
    check_dimensions(target_width, target_height)?;
    check_dimensions(source.width(), source.height())?;

    let source_dims = (source.width(), source.height());
    let plan = plan_fit(source_dims, (target_width, target_height));

    if plan.is_noop_scale(source_dims) {
        return Ok(source.crop_imm(plan.left, plan.top, target_width, target_height));
    }

    let (resized_w, resized_h) = plan.resized;
    let resized = source.resize_exact(resized_w, resized_h, RESAMPLE_FILTER);
    Ok(resized.crop_imm(plan.left, plan.top, target_width, target_height))
}

/// Center-crop the largest square out of `source`, without resampling.
pub fn square_crop(source: &DynamicImage) -> Result<DynamicImage> {
    check_dimensions(source.width(), source.height())?;
    let (left, top, side) = calculate_square_crop((source.width(), source.height()));
    Ok(source.crop_imm(left, top, side, side))
}

/// Render one icon from an already-square image, flattened to RGB.
///
/// Store icons must not carry an alpha channel; it is dropped here.
pub fn render_icon(square: &DynamicImage, size: u32) -> Result<DynamicImage> {
    let icon = fit_crop(square, size, size)?;
    Ok(DynamicImage::ImageRgb8(icon.to_rgb8()))
}
