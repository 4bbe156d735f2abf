use super::Image;
use crate::transforms::Transform;
use anyhow::Result;
use ndarray::{Array3, Axis};

// ============================================================================
// Depth channels
// ============================================================================

/// Expands a single-channel `[H, W]` plane into a `[3, H, W]` tensor.
///
/// Channel Layout
/// | Channel | Content                                   |
/// |---------|-------------------------------------------|
/// | 0       | input unchanged                           |
/// | 1       | row position, `r / (H - 1)` (0 top, 1 bottom) |
/// | 2       | channel 0 * channel 1                     |
///
/// A single-row input gets a row position of 0.
pub fn add_depth_channels(image: &Image) -> Array3<f32> {
    let (h, w) = image.dim();
    let denom = h.saturating_sub(1).max(1) as f32;
    let mut out = Array3::zeros((3, h, w));
    for ((y, x), &v) in image.indexed_iter() {
        let depth = y as f32 / denom;
        out[[0, y, x]] = v;
        out[[1, y, x]] = depth;
        out[[2, y, x]] = v * depth;
    }
    out
}

/// Adds the leading channel axis: `[H, W]` -> `[1, H, W]`.
pub fn to_chw(plane: Image) -> Array3<f32> {
    plane.insert_axis(Axis(0))
}

/// [`add_depth_channels`] as a pipeline step.
///
/// # Example
/// ```ignore
/// let pipeline = Resize::new(101, 101)?.then(CenterPad::new(13, 14)).then(DepthChannels);
/// let tensor = pipeline.apply(image)?; // [3, 128, 128]
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DepthChannels;

impl Transform<Image, Array3<f32>> for DepthChannels {
    fn apply(&self, image: Image) -> Result<Array3<f32>> {
        Ok(add_depth_channels(&image))
    }
}
