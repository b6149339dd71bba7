//! Conversion between physical sizes and canvas pixels.

const CM_PER_INCH: f64 = 2.54;

/// Converts centimetres to whole pixels at the given resolution (truncating).
pub fn centimeters_to_pixels(cm: f64, dpi: u32) -> u32 {
    let px = cm * dpi as f64 / CM_PER_INCH;
    if px <= 0.0 {
        0
    } else {
        px as u32
    }
}

/// Converts pixels to centimetres at the given resolution.
pub fn pixels_to_centimeters(px: u32, dpi: u32) -> f64 {
    if dpi == 0 {
        return 0.0;
    }
    px as f64 * CM_PER_INCH / dpi as f64
}
