use super::Image;

// ============================================================================
// Brightness
// ============================================================================

/// Adds `delta` to every pixel and clips to `[0, 1]`.
///
/// # Example
/// ```ignore
/// let brighter = brightness_shift(&image, 0.05);
/// ```
pub fn brightness_shift(image: &Image, delta: f32) -> Image {
    image.mapv(|v| (v + delta).clamp(0.0, 1.0))
}

/// Multiplies every pixel by `factor` and clips to `[0, 1]`.
pub fn brightness_multiply(image: &Image, factor: f32) -> Image {
    image.mapv(|v| (v * factor).clamp(0.0, 1.0))
}
