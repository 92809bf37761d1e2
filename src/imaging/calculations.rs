//! Pure calculation functions for image dimensions.

/// Largest width or height a baseline JPEG can carry.
pub const MAX_JPEG_DIMENSION: u32 = 65_535;

/// Calculate output dimensions for a fixed target width, keeping the aspect
/// ratio of `original`.
///
/// The width is always `target_width`, even when that enlarges the image:
/// the gallery relies on every variant existing at its nominal width. Height
/// is rounded and never drops below 1.
pub fn scale_to_width(original: (u32, u32), target_width: u32) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    if orig_w == 0 {
        return (target_width, orig_h.max(1));
    }
    let height = (orig_h as f64 * target_width as f64 / orig_w as f64).round() as u32;
    (target_width, height.max(1))
}
