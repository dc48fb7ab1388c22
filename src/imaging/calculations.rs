//! Pure calculation functions for fit-and-crop geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! Every size is computed with exact integer arithmetic: ratios are compared
//! by cross-multiplication and scaled lengths are floored by integer division.
//! This is the same rule as flooring the real-valued product, minus the
//! floating-point drift that could leave a resized edge one pixel short of
//! the target canvas.

/// Geometry of one fit-and-crop: the intermediate resize and the crop window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitPlan {
    /// Intermediate size after the aspect-preserving resize.
    pub resized: (u32, u32),
    /// Left edge of the crop window inside the resized image.
    pub left: u32,
    /// Top edge of the crop window inside the resized image.
    pub top: u32,
    /// Final canvas size.
    pub target: (u32, u32),
}

impl FitPlan {
    /// True when the resize step keeps the source size (no resampling needed).
    pub fn is_noop_scale(&self, source: (u32, u32)) -> bool {
        self.resized == source
    }
}

/// Calculate dimensions needed to cover a target canvas (resize before crop).
///
/// Returns dimensions that completely cover the target while keeping the
/// source aspect ratio. One dimension matches the target exactly, the other
/// is floored and never smaller than the target.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height), both non-zero
/// * `target` - Target canvas dimensions (width, height), both non-zero
///
/// # Examples
/// ```
/// # use storefit::imaging::calculate_fill_dimensions;
/// // 1920x1080 onto a 1290x2796 canvas: match height, width = floor(2796 * 16/9)
/// assert_eq!(calculate_fill_dimensions((1920, 1080), (1290, 2796)), (4970, 2796));
/// ```
pub fn calculate_fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = (source.0 as u64, source.1 as u64);
    let (tgt_w, tgt_h) = (target.0 as u64, target.1 as u64);

    if src_w * tgt_h > tgt_w * src_h {
        // Source is wider: height matches, width overflows
        let w = tgt_h * src_w / src_h;
        (clamp_u32(w), target.1)
    } else {
        // Source is taller or equal: width matches, height overflows
        let h = tgt_w * src_h / src_w;
        (target.0, clamp_u32(h))
    }
}

/// Offsets of a centered crop window; odd overflow biases toward top/left.
pub fn calculate_crop_offsets(resized: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    (
        resized.0.saturating_sub(target.0) / 2,
        resized.1.saturating_sub(target.1) / 2,
    )
}

/// Plan the full fit-and-crop of `source` onto `target`.
pub fn plan_fit(source: (u32, u32), target: (u32, u32)) -> FitPlan {
    let resized = calculate_fill_dimensions(source, target);
    let (left, top) = calculate_crop_offsets(resized, target);
    FitPlan {
        resized,
        left,
        top,
        target,
    }
}

/// Largest centered square inside `source`, as `(left, top, side)`.
///
/// ```
/// # use storefit::imaging::calculate_square_crop;
/// assert_eq!(calculate_square_crop((3000, 4000)), (0, 500, 3000));
/// ```
pub fn calculate_square_crop(source: (u32, u32)) -> (u32, u32, u32) {
    let side = source.0.min(source.1);
    let (left, top) = calculate_crop_offsets(source, (side, side));
    (left, top, side)
}

fn clamp_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
