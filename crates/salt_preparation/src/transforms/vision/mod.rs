//! Paired image/mask transforms for single-channel planes.
//!
//! ```text
//! transforms/vision/
//! ├── border.rs        → Out-of-bounds sampling policy
//! ├── geometric.rs     → Flip, affine warp, shear, crop-rescale, resize, pad
//! ├── photometric.rs   → Brightness shift and multiply (image only)
//! ├── conversion.rs    → [H, W] → [C, H, W] tensors, depth channels
//! └── augmentation.rs  → Gated random composition of the above
//! ```
//!
//! Images are grayscale intensities in `[0, 1]`; masks are binary `{0, 1}`.
//! Every paired transform applies the same spatial mapping to both planes,
//! resamples images bilinearly and masks by nearest neighbour, and
//! re-binarizes the mask afterwards.
//!
//! ```ignore
//! use crate::transforms::Transform;
//! use crate::transforms::vision::{CenterPad, DepthChannels, Resize};
//!
//! let pipeline = Resize::new(101, 101)?.then(CenterPad::new(13, 14)).then(DepthChannels);
//! ```

use ndarray::Array2;

pub mod augmentation;
pub mod border;
pub mod conversion;
pub mod geometric;
pub mod photometric;

/// Grayscale plane, `[H, W]`, values in `[0, 1]`.
pub type Image = Array2<f32>;
/// Binary segmentation plane, `[H, W]`, values in `{0, 1}`.
pub type Mask = Array2<f32>;

pub use augmentation::{AugmentKind, AugmentationPolicy, Choice, Gate, ParamSampler};
pub use border::BorderMode;
pub use conversion::{add_depth_channels, to_chw, DepthChannels};
pub use geometric::{
    binarize, center_pad, center_pad_pair, horizontal_flip, horizontal_flip_pair,
    horizontal_shear_pair, random_shift_scale_crop_pad_pair, resize_image, resize_pair,
    shift_scale_crop_pair, shift_scale_rotate_pair, warp_affine, Affine2, CenterPad, CropBox,
    HorizontalFlip, Interpolation, Resize, ShiftScaleRotate,
};
pub use photometric::{brightness_multiply, brightness_shift};
