// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dimension math for aspect-preserving resizes and the allocation budget
// every pixel buffer is checked against. Pure functions, no pixels.

use mediawand_core::error::{MediaError, Result};

/// Bytes per pixel of the `f32` RGBA buffers the resampler works in.
pub const RESAMPLE_BYTES_PER_PIXEL: u64 = 16;

/// Bytes per pixel of an 8-bit RGBA canvas.
pub const CANVAS_BYTES_PER_PIXEL: u64 = 4;

/// Largest single buffer a transform may allocate: the `image` crate's
/// default decoding limit.
pub fn allocation_budget() -> u64 {
    image::Limits::default().max_alloc.unwrap_or(u64::MAX)
}

/// Reject a `width` x `height` buffer of `bytes_per_pixel` that would not fit
/// in [`allocation_budget`]. `context` prefixes the error message.
pub fn check_allocation(
    width: u32,
    height: u32,
    bytes_per_pixel: u64,
    context: &str,
) -> Result<()> {
    let needed = u64::from(width)
        .saturating_mul(u64::from(height))
        .saturating_mul(bytes_per_pixel);
    let budget = allocation_budget();
    if needed > budget {
        return Err(MediaError::processing(format!(
            "{context}: {width}x{height} needs {needed} bytes, limit is {budget}"
        )));
    }
    Ok(())
}

/// Dimensions for scaling `source` to `target_height` while keeping its aspect
/// ratio. The computed width is rounded to the nearest pixel and never drops
/// below 1.
pub fn scale_to_height(source: (u32, u32), target_height: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return (1, target_height);
    }
    let width = (src_w as f64 * target_height as f64 / src_h as f64).round() as u32;
    (width.max(1), target_height)
}

/// Dimensions for scaling `source` to `target_width` while keeping its aspect
/// ratio. Mirror of [`scale_to_height`].
pub fn scale_to_width(source: (u32, u32), target_width: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return (target_width, 1);
    }
    let height = (src_h as f64 * target_width as f64 / src_w as f64).round() as u32;
    (target_width, height.max(1))
}
