//! Paired spatial transforms.
//!
//! Every `*_pair` function takes an image and its mask of identical shape
//! and returns both transformed with the same geometry. The image is
//! resampled bilinearly; the mask is resampled nearest-neighbour and then
//! re-binarized at 0.5 so no fractional labels appear. Shape disagreement
//! is a `DataError::ShapeMismatch`. Zero-magnitude or degenerate parameters
//! are treated as the identity.

use super::border::{map_index, BorderMode};
use super::{Image, Mask};
use crate::error::DataError;
use crate::transforms::Transform;
use anyhow::{anyhow, ensure, Result};
use image::{imageops, imageops::FilterType, ImageBuffer, Luma};
use ndarray::{s, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};

const MASK_THRESHOLD: f32 = 0.5;

pub(crate) fn ensure_same_shape(context: &str, image: &Image, mask: &Mask) -> Result<()> {
    if image.shape() != mask.shape() {
        return Err(DataError::shape_mismatch(context, image.shape(), mask.shape()).into());
    }
    Ok(())
}

/// Maps every mask value to `{0.0, 1.0}` with threshold 0.5.
pub fn binarize(mask: &Mask) -> Mask {
    mask.mapv(|v| if v > MASK_THRESHOLD { 1.0 } else { 0.0 })
}

// ============================================================================
// Flip
// ============================================================================

/// Mirrors an array along the width axis.
pub fn horizontal_flip(image: &Image) -> Image {
    image.slice(s![.., ..;-1]).to_owned()
}

pub fn horizontal_flip_pair(image: &Image, mask: &Mask) -> Result<(Image, Mask)> {
    ensure_same_shape("horizontal_flip", image, mask)?;
    Ok((horizontal_flip(image), horizontal_flip(mask)))
}

/// Unconditional horizontal mirror of an image/mask pair.
#[derive(Debug, Clone, Copy)]
pub struct HorizontalFlip;

impl Transform<(Image, Mask), (Image, Mask)> for HorizontalFlip {
    fn apply(&self, (image, mask): (Image, Mask)) -> Result<(Image, Mask)> {
        horizontal_flip_pair(&image, &mask)
    }
}

impl Transform<Image, Image> for HorizontalFlip {
    fn apply(&self, image: Image) -> Result<Image> {
        Ok(horizontal_flip(&image))
    }
}

// ============================================================================
// Affine warp
// ============================================================================

/// Forward 2x3 affine map in pixel-index coordinates:
/// `x' = a*x + b*y + c`, `y' = d*x + e*y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine2 {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Affine2 {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 0.0,
        e: 1.0,
        f: 0.0,
    };

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.b * y + self.c,
            self.d * x + self.e * y + self.f,
        )
    }

    /// Inverse map, or `None` when the linear part is singular.
    pub fn invert(&self) -> Option<Self> {
        let det = self.a * self.e - self.b * self.d;
        if !det.is_finite() || det.abs() < 1e-10 {
            return None;
        }
        let a = self.e / det;
        let b = -self.b / det;
        let d = -self.d / det;
        let e = self.a / det;
        Some(Self {
            a,
            b,
            c: -(a * self.c + b * self.f),
            d,
            e,
            f: -(d * self.c + e * self.f),
        })
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

/// Sampling kernel used by [`warp_affine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Nearest,
    Bilinear,
}

fn sample_at(src: &Array2<f32>, x: isize, y: isize, border: BorderMode) -> f32 {
    let (h, w) = src.dim();
    match (map_index(x, w, border), map_index(y, h, border)) {
        (Some(xi), Some(yi)) => src[[yi, xi]],
        _ => border.fill_value(),
    }
}

fn sample(src: &Array2<f32>, x: f32, y: f32, interp: Interpolation, border: BorderMode) -> f32 {
    match interp {
        Interpolation::Nearest => sample_at(src, x.round() as isize, y.round() as isize, border),
        Interpolation::Bilinear => {
            let x0 = x.floor();
            let y0 = y.floor();
            let fx = x - x0;
            let fy = y - y0;
            let (x0, y0) = (x0 as isize, y0 as isize);

            let p00 = sample_at(src, x0, y0, border);
            let p10 = sample_at(src, x0 + 1, y0, border);
            let p01 = sample_at(src, x0, y0 + 1, border);
            let p11 = sample_at(src, x0 + 1, y0 + 1, border);

            let top = p00 * (1.0 - fx) + p10 * fx;
            let bottom = p01 * (1.0 - fx) + p11 * fx;
            top * (1.0 - fy) + bottom * fy
        }
    }
}

/// Warps `src` by the forward map `forward`, producing an array of the
/// same shape. Each output pixel reads the source at the inverse-mapped
/// location. A singular map leaves the input unchanged.
pub fn warp_affine(
    src: &Array2<f32>,
    forward: &Affine2,
    interp: Interpolation,
    border: BorderMode,
) -> Array2<f32> {
    let Some(inverse) = forward.invert() else {
        tracing::debug!(?forward, "singular affine map, leaving array unchanged");
        return src.clone();
    };
    let (h, w) = src.dim();
    Array2::from_shape_fn((h, w), |(y, x)| {
        let (sx, sy) = inverse.apply(x as f32, y as f32);
        sample(src, sx, sy, interp, border)
    })
}

fn warp_pair(image: &Image, mask: &Mask, forward: &Affine2) -> (Image, Mask) {
    if forward.is_identity() {
        return (image.clone(), mask.clone());
    }
    let image = warp_affine(image, forward, Interpolation::Bilinear, BorderMode::Replicate);
    let mask = warp_affine(mask, forward, Interpolation::Nearest, BorderMode::Replicate);
    (image, binarize(&mask))
}

// ============================================================================
// Shift / scale / rotate
// ============================================================================

/// Explicit shift-scale-rotate parameters.
///
/// `dx`/`dy` are in pixels, `angle` in degrees (counter-clockwise in image
/// coordinates), `scale` is uniform around the image centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShiftScaleRotate {
    pub dx: f32,
    pub dy: f32,
    pub scale: f32,
    pub angle: f32,
}

impl Default for ShiftScaleRotate {
    fn default() -> Self {
        Self {
            dx: 0.0,
            dy: 0.0,
            scale: 1.0,
            angle: 0.0,
        }
    }
}

impl ShiftScaleRotate {
    pub fn rotation(angle: f32) -> Self {
        Self {
            angle,
            ..Self::default()
        }
    }

    /// Samples a random translation within `±magnitude` of each extent and a
    /// scale within `1 ± magnitude`, without rotation.
    pub fn random<R: Rng + ?Sized>(magnitude: f32, height: usize, width: usize, rng: &mut R) -> Self {
        let magnitude = magnitude.abs();
        if magnitude == 0.0 || !magnitude.is_finite() {
            return Self::default();
        }
        let dx = rng.random_range(-magnitude..=magnitude) * width as f32;
        let dy = rng.random_range(-magnitude..=magnitude) * height as f32;
        let scale = rng.random_range(1.0 - magnitude..=1.0 + magnitude);
        Self {
            dx,
            dy,
            scale,
            angle: 0.0,
        }
    }

    /// Forward affine map about the centre of an `height x width` array.
    pub fn to_affine(&self, height: usize, width: usize) -> Affine2 {
        let cx = (width as f32 - 1.0) / 2.0;
        let cy = (height as f32 - 1.0) / 2.0;
        let (sin, cos) = self.angle.to_radians().sin_cos();
        let a = self.scale * cos;
        let b = -self.scale * sin;
        let d = self.scale * sin;
        let e = self.scale * cos;
        Affine2 {
            a,
            b,
            c: cx - a * cx - b * cy + self.dx,
            d,
            e,
            f: cy - d * cx - e * cy + self.dy,
        }
    }
}

pub fn shift_scale_rotate_pair(
    image: &Image,
    mask: &Mask,
    params: ShiftScaleRotate,
) -> Result<(Image, Mask)> {
    ensure_same_shape("shift_scale_rotate", image, mask)?;
    let finite = [params.dx, params.dy, params.scale, params.angle]
        .iter()
        .all(|v| v.is_finite());
    if !finite || params.scale <= 0.0 {
        tracing::debug!(?params, "degenerate shift-scale-rotate, using identity");
        return Ok((image.clone(), mask.clone()));
    }
    let (h, w) = image.dim();
    Ok(warp_pair(image, mask, &params.to_affine(h, w)))
}

// ============================================================================
// Shear
// ============================================================================

/// Horizontal shear: the top row moves right by `dx * width` pixels, the
/// bottom row moves left by the same amount, rows in between interpolate
/// linearly.
pub fn horizontal_shear_pair(image: &Image, mask: &Mask, dx: f32) -> Result<(Image, Mask)> {
    ensure_same_shape("horizontal_shear", image, mask)?;
    if dx == 0.0 || !dx.is_finite() {
        return Ok((image.clone(), mask.clone()));
    }
    let (h, w) = image.dim();
    let shift = dx * w as f32;
    let slope = if h > 1 { 2.0 * shift / (h as f32 - 1.0) } else { 0.0 };
    let forward = Affine2 {
        b: -slope,
        c: shift,
        ..Affine2::IDENTITY
    };
    Ok(warp_pair(image, mask, &forward))
}

// ============================================================================
// Crop-and-rescale
// ============================================================================

/// Half-open crop rectangle `[x0, x1) x [y0, y1)` in pixel indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl CropBox {
    fn is_valid_for(&self, height: usize, width: usize) -> bool {
        self.x0 < self.x1 && self.y0 < self.y1 && self.x1 <= width && self.y1 <= height
    }

    fn is_full(&self, height: usize, width: usize) -> bool {
        self.x0 == 0 && self.y0 == 0 && self.x1 == width && self.y1 == height
    }
}

/// Crops `crop` out of both arrays and scales it back to the original size.
/// An empty or out-of-bounds box is treated as the identity.
pub fn shift_scale_crop_pair(image: &Image, mask: &Mask, crop: CropBox) -> Result<(Image, Mask)> {
    ensure_same_shape("shift_scale_crop", image, mask)?;
    let (h, w) = image.dim();
    if !crop.is_valid_for(h, w) {
        tracing::debug!(?crop, h, w, "degenerate crop box, using identity");
        return Ok((image.clone(), mask.clone()));
    }
    if crop.is_full(h, w) {
        return Ok((image.clone(), mask.clone()));
    }
    let region = s![crop.y0..crop.y1, crop.x0..crop.x1];
    let image_crop = image.slice(region).to_owned();
    let mask_crop = mask.slice(region).to_owned();
    resize_pair(&image_crop, &mask_crop, h, w)
}

/// Random crop with per-side margins drawn from `[0, floor(extent * limit))`,
/// rescaled back to the input size.
pub fn random_shift_scale_crop_pad_pair<R: Rng + ?Sized>(
    image: &Image,
    mask: &Mask,
    limit: f32,
    rng: &mut R,
) -> Result<(Image, Mask)> {
    ensure_same_shape("random_shift_scale_crop_pad", image, mask)?;
    let (h, w) = image.dim();
    let limit = limit.clamp(0.0, 0.5);
    let max_dy = (h as f32 * limit) as usize;
    let max_dx = (w as f32 * limit) as usize;

    let mut margin = |bound: usize| if bound > 0 { rng.random_range(0..bound) } else { 0 };
    let y0 = margin(max_dy);
    let y1 = h - margin(max_dy);
    let x0 = margin(max_dx);
    let x1 = w - margin(max_dx);

    shift_scale_crop_pair(image, mask, CropBox { x0, y0, x1, y1 })
}

// ============================================================================
// Resize
// ============================================================================

fn resize_plane(src: &Array2<f32>, height: usize, width: usize, filter: FilterType) -> Result<Array2<f32>> {
    let (h, w) = src.dim();
    let buffer: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_raw(w as u32, h as u32, src.iter().copied().collect())
            .ok_or_else(|| anyhow!("Failed to build {}x{} resampling buffer", w, h))?;
    let resized = imageops::resize(&buffer, width as u32, height as u32, filter);
    Ok(Array2::from_shape_vec((height, width), resized.into_raw())?)
}

/// Resizes an image bilinearly to `(height, width)`.
/// A zero-sized target or an unchanged size returns a copy.
pub fn resize_image(image: &Image, height: usize, width: usize) -> Result<Image> {
    if height == 0 || width == 0 || image.dim() == (height, width) || image.is_empty() {
        return Ok(image.clone());
    }
    resize_plane(image, height, width, FilterType::Triangle)
}

/// Resizes an image (bilinear) and its mask (nearest + binarize) to
/// `(height, width)`.
pub fn resize_pair(image: &Image, mask: &Mask, height: usize, width: usize) -> Result<(Image, Mask)> {
    ensure_same_shape("resize", image, mask)?;
    if height == 0 || width == 0 {
        tracing::debug!(height, width, "zero-sized resize target, using identity");
        return Ok((image.clone(), mask.clone()));
    }
    if image.dim() == (height, width) || image.is_empty() {
        return Ok((image.clone(), mask.clone()));
    }
    let image = resize_plane(image, height, width, FilterType::Triangle)?;
    let mask = resize_plane(mask, height, width, FilterType::Nearest)?;
    Ok((image, binarize(&mask)))
}

/// Resizes to a fixed `(height, width)`; a no-op when the size already matches.
#[derive(Debug, Clone, Copy)]
pub struct Resize {
    height: usize,
    width: usize,
}

impl Resize {
    pub fn new(height: usize, width: usize) -> Result<Self> {
        ensure!(
            height > 0 && width > 0,
            "Resize target must be positive (got {}x{})",
            height,
            width
        );
        Ok(Self { height, width })
    }
}

impl Transform<(Image, Mask), (Image, Mask)> for Resize {
    fn apply(&self, (image, mask): (Image, Mask)) -> Result<(Image, Mask)> {
        if image.dim() == (self.height, self.width) {
            ensure_same_shape("resize", &image, &mask)?;
            return Ok((image, mask));
        }
        resize_pair(&image, &mask, self.height, self.width)
    }
}

impl Transform<Image, Image> for Resize {
    fn apply(&self, image: Image) -> Result<Image> {
        if image.dim() == (self.height, self.width) {
            return Ok(image);
        }
        resize_image(&image, self.height, self.width)
    }
}

// ============================================================================
// Center pad
// ============================================================================

/// Pads `pad_left` cells before and `pad_right` cells after each spatial
/// axis, filling according to `border`.
pub fn center_pad(image: &Image, pad_left: usize, pad_right: usize, border: BorderMode) -> Image {
    if pad_left == 0 && pad_right == 0 {
        return image.clone();
    }
    let (h, w) = image.dim();
    let out_h = h + pad_left + pad_right;
    let out_w = w + pad_left + pad_right;
    let offset = pad_left as isize;
    Array2::from_shape_fn((out_h, out_w), |(y, x)| {
        sample_at(image, x as isize - offset, y as isize - offset, border)
    })
}

pub fn center_pad_pair(
    image: &Image,
    mask: &Mask,
    pad_left: usize,
    pad_right: usize,
    border: BorderMode,
) -> Result<(Image, Mask)> {
    ensure_same_shape("center_pad", image, mask)?;
    Ok((
        center_pad(image, pad_left, pad_right, border),
        center_pad(mask, pad_left, pad_right, border),
    ))
}

/// Symmetric spatial padding; applies to a pair or to an image alone.
#[derive(Debug, Clone, Copy)]
pub struct CenterPad {
    pad_left: usize,
    pad_right: usize,
    border: BorderMode,
}

impl CenterPad {
    pub fn new(pad_left: usize, pad_right: usize) -> Self {
        Self {
            pad_left,
            pad_right,
            border: BorderMode::Replicate,
        }
    }

    pub fn with_border(mut self, border: BorderMode) -> Self {
        self.border = border;
        self
    }
}

impl Transform<(Image, Mask), (Image, Mask)> for CenterPad {
    fn apply(&self, (image, mask): (Image, Mask)) -> Result<(Image, Mask)> {
        center_pad_pair(&image, &mask, self.pad_left, self.pad_right, self.border)
    }
}

impl Transform<Image, Image> for CenterPad {
    fn apply(&self, image: Image) -> Result<Image> {
        Ok(center_pad(&image, self.pad_left, self.pad_right, self.border))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn gradient(h: usize, w: usize) -> Image {
        Array2::from_shape_fn((h, w), |(y, x)| (y * w + x) as f32 / (h * w) as f32)
    }

    fn blob_mask(h: usize, w: usize) -> Mask {
        Array2::from_shape_fn((h, w), |(y, x)| {
            if (h / 4..3 * h / 4).contains(&y) && (w / 3..2 * w / 3).contains(&x) {
                1.0
            } else {
                0.0
            }
        })
    }

    fn is_binary(mask: &Mask) -> bool {
        mask.iter().all(|&v| v == 0.0 || v == 1.0)
    }

    #[test]
    fn test_flip_is_an_involution() -> Result<()> {
        let image = gradient(5, 7);
        let mask = blob_mask(5, 7);
        let (fi, fm) = horizontal_flip_pair(&image, &mask)?;
        assert_eq!(fi[[0, 0]], image[[0, 6]]);
        let (ii, im) = horizontal_flip_pair(&fi, &fm)?;
        assert_eq!(ii, image);
        assert_eq!(im, mask);
        Ok(())
    }

    #[test]
    fn test_shape_mismatch_is_reported() {
        let err = horizontal_flip_pair(&gradient(4, 4), &blob_mask(4, 5)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::ShapeMismatch { .. })
        ));
        assert!(resize_pair(&gradient(4, 4), &blob_mask(5, 4), 8, 8).is_err());
        assert!(center_pad_pair(&gradient(4, 4), &blob_mask(3, 4), 1, 1, BorderMode::Replicate).is_err());
    }

    #[test]
    fn test_zero_parameters_are_identity() -> Result<()> {
        let image = gradient(9, 9);
        let mask = blob_mask(9, 9);

        let (i, m) = shift_scale_rotate_pair(&image, &mask, ShiftScaleRotate::default())?;
        assert_eq!((&i, &m), (&image, &mask));

        let (i, m) = horizontal_shear_pair(&image, &mask, 0.0)?;
        assert_eq!((&i, &m), (&image, &mask));

        let (i, m) = center_pad_pair(&image, &mask, 0, 0, BorderMode::Replicate)?;
        assert_eq!((&i, &m), (&image, &mask));

        let mut rng = StdRng::seed_from_u64(3);
        let (i, m) = random_shift_scale_crop_pad_pair(&image, &mask, 0.0, &mut rng)?;
        assert_eq!((&i, &m), (&image, &mask));
        Ok(())
    }

    #[test]
    fn test_degenerate_parameters_clamp_to_identity() -> Result<()> {
        let image = gradient(6, 6);
        let mask = blob_mask(6, 6);

        let params = ShiftScaleRotate {
            scale: -1.0,
            ..ShiftScaleRotate::default()
        };
        let (i, _) = shift_scale_rotate_pair(&image, &mask, params)?;
        assert_eq!(i, image);

        let empty = CropBox { x0: 3, y0: 0, x1: 3, y1: 6 };
        let (i, _) = shift_scale_crop_pair(&image, &mask, empty)?;
        assert_eq!(i, image);

        let (i, _) = resize_pair(&image, &mask, 0, 4)?;
        assert_eq!(i, image);
        Ok(())
    }

    #[test]
    fn test_warps_keep_shape_and_mask_binary() -> Result<()> {
        let image = gradient(101, 101);
        let mask = blob_mask(101, 101);
        let mut rng = StdRng::seed_from_u64(11);

        let outputs = vec![
            shift_scale_rotate_pair(&image, &mask, ShiftScaleRotate::rotation(12.5))?,
            shift_scale_rotate_pair(&image, &mask, ShiftScaleRotate::random(0.2, 101, 101, &mut rng))?,
            horizontal_shear_pair(&image, &mask, 0.05)?,
            random_shift_scale_crop_pad_pair(&image, &mask, 0.2, &mut rng)?,
        ];
        for (i, m) in outputs {
            assert_eq!(i.dim(), (101, 101));
            assert_eq!(m.dim(), (101, 101));
            assert!(is_binary(&m));
            assert!(i.iter().all(|v| (0.0..=1.0).contains(v)));
        }
        Ok(())
    }

    #[test]
    fn test_translation_moves_image_and_mask_together() -> Result<()> {
        let mut image = Array2::zeros((8, 8));
        let mut mask = Array2::zeros((8, 8));
        image[[2, 2]] = 1.0;
        mask[[2, 2]] = 1.0;
        let params = ShiftScaleRotate {
            dx: 3.0,
            dy: 1.0,
            ..ShiftScaleRotate::default()
        };
        let (i, m) = shift_scale_rotate_pair(&image, &mask, params)?;
        assert_eq!(i[[3, 5]], 1.0);
        assert_eq!(m[[3, 5]], 1.0);
        assert_eq!(m.sum(), 1.0);
        Ok(())
    }

    #[test]
    fn test_shear_shifts_top_and_bottom_in_opposite_directions() -> Result<()> {
        let image = Array2::from_shape_fn((11, 20), |(_, x)| if x == 10 { 1.0 } else { 0.0 });
        let mask = image.clone();
        // 0.1 * 20 = 2 px
        let (_, m) = horizontal_shear_pair(&image, &mask, 0.1)?;
        assert_eq!(m[[0, 12]], 1.0);
        assert_eq!(m[[5, 10]], 1.0);
        assert_eq!(m[[10, 8]], 1.0);
        Ok(())
    }

    #[test]
    fn test_affine_inverse_round_trip() {
        let forward = ShiftScaleRotate {
            dx: 2.0,
            dy: -1.0,
            scale: 1.1,
            angle: 30.0,
        }
        .to_affine(10, 10);
        let inverse = forward.invert().expect("invertible");
        let (x, y) = forward.apply(3.0, 7.0);
        let (bx, by) = inverse.apply(x, y);
        assert!((bx - 3.0).abs() < 1e-4 && (by - 7.0).abs() < 1e-4);

        let singular = Affine2 { a: 0.0, e: 0.0, ..Affine2::IDENTITY };
        assert!(singular.invert().is_none());
    }

    #[test]
    fn test_resize_pair_targets_requested_shape() -> Result<()> {
        let (i, m) = resize_pair(&gradient(101, 101), &blob_mask(101, 101), 202, 202)?;
        assert_eq!(i.dim(), (202, 202));
        assert_eq!(m.dim(), (202, 202));
        assert!(is_binary(&m));
        assert!(m.sum() > 0.0);

        let small = resize_image(&gradient(10, 10), 5, 4)?;
        assert_eq!(small.dim(), (5, 4));
        Ok(())
    }

    #[test]
    fn test_center_pad_replicates_edges() -> Result<()> {
        let image = gradient(3, 3);
        let mask = blob_mask(3, 3);
        let (i, m) = center_pad_pair(&image, &mask, 2, 1, BorderMode::Replicate)?;
        assert_eq!(i.dim(), (6, 6));
        assert_eq!(m.dim(), (6, 6));
        assert_eq!(i[[0, 0]], image[[0, 0]]);
        assert_eq!(i[[5, 5]], image[[2, 2]]);
        assert_eq!(i.slice(s![2..5, 2..5]), image);

        let constant = center_pad(&image, 1, 1, BorderMode::Constant(0.0));
        assert_eq!(constant[[0, 0]], 0.0);
        assert_eq!(constant.sum(), image.sum());
        Ok(())
    }

    #[test]
    fn test_crop_box_rescales_region() -> Result<()> {
        let image = gradient(8, 8);
        let mask = blob_mask(8, 8);
        let crop = CropBox { x0: 0, y0: 0, x1: 4, y1: 4 };
        let (i, m) = shift_scale_crop_pair(&image, &mask, crop)?;
        assert_eq!(i.dim(), (8, 8));
        assert_eq!(m.dim(), (8, 8));
        assert!(i[[7, 7]] <= image[[3, 3]] + 1e-6);
        Ok(())
    }
}
