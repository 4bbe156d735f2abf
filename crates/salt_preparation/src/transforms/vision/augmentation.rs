//! Training-time augmentation policy.
//!
//! The policy is plain data: an ordered list of [`Gate`]s. Each gate is
//! entered independently with its own probability; when entered, exactly
//! one of its weighted [`Choice`]s is drawn, its parameter is sampled and
//! the corresponding [`AugmentKind`] is applied. Gates are evaluated in
//! order and are not mutually exclusive.
//!
//! The default table:
//!
//! ```text
//! gate  p    choices (equal weight)
//! A     0.5  horizontal flip
//! B     0.5  crop-rescale (limit 0.2) | shear dx~U(-0.07,0.07) | rotate angle~U(0,15)
//! C     0.5  brightness shift ~U(-0.1,0.1) | brightness multiply ~U(0.92,1.08)
//! ```

use super::geometric::{
    ensure_same_shape, horizontal_flip_pair, horizontal_shear_pair,
    random_shift_scale_crop_pad_pair, shift_scale_rotate_pair, ShiftScaleRotate,
};
use super::photometric::{brightness_multiply, brightness_shift};
use super::{Image, Mask};
use crate::dataloader::with_worker_rng;
use crate::error::DataError;
use crate::transforms::Transform;
use anyhow::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The transforms a policy can dispatch to.
///
/// The sampled parameter is interpreted per kind:
/// | Kind                 | Parameter                         |
/// |----------------------|-----------------------------------|
/// | `HorizontalFlip`     | ignored                           |
/// | `ShiftScaleCropPad`  | per-side crop limit (fraction)    |
/// | `HorizontalShear`    | shear `dx` (fraction of width)    |
/// | `ShiftRotate`        | rotation angle in degrees         |
/// | `BrightnessShift`    | additive delta                    |
/// | `BrightnessMultiply` | multiplicative factor             |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AugmentKind {
    HorizontalFlip,
    ShiftScaleCropPad,
    HorizontalShear,
    ShiftRotate,
    BrightnessShift,
    BrightnessMultiply,
}

impl AugmentKind {
    /// Applies this transform with parameter `value`. Photometric kinds
    /// leave the mask untouched.
    pub fn apply<R: Rng + ?Sized>(
        self,
        image: &Image,
        mask: &Mask,
        value: f32,
        rng: &mut R,
    ) -> Result<(Image, Mask)> {
        match self {
            AugmentKind::HorizontalFlip => horizontal_flip_pair(image, mask),
            AugmentKind::ShiftScaleCropPad => {
                random_shift_scale_crop_pad_pair(image, mask, value, rng)
            }
            AugmentKind::HorizontalShear => horizontal_shear_pair(image, mask, value),
            AugmentKind::ShiftRotate => {
                shift_scale_rotate_pair(image, mask, ShiftScaleRotate::rotation(value))
            }
            AugmentKind::BrightnessShift => Ok((brightness_shift(image, value), mask.clone())),
            AugmentKind::BrightnessMultiply => {
                Ok((brightness_multiply(image, value), mask.clone()))
            }
        }
    }
}

/// Source of a transform parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamSampler {
    /// Always the same value.
    Fixed(f32),
    /// Uniform on `[low, high)`; collapses to `low` when the range is empty.
    Uniform { low: f32, high: f32 },
}

impl ParamSampler {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        match *self {
            ParamSampler::Fixed(v) => v,
            ParamSampler::Uniform { low, high } if high > low => rng.random_range(low..high),
            ParamSampler::Uniform { low, .. } => low,
        }
    }
}

/// One weighted branch of a gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub weight: f64,
    pub kind: AugmentKind,
    pub param: ParamSampler,
}

impl Choice {
    pub fn new(kind: AugmentKind, param: ParamSampler) -> Self {
        Self {
            weight: 1.0,
            kind,
            param,
        }
    }
}

/// A Bernoulli gate over a set of mutually exclusive choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    pub probability: f64,
    pub choices: Vec<Choice>,
}

impl Gate {
    fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Choice> {
        let total: f64 = self.choices.iter().map(|c| c.weight).sum();
        if self.choices.is_empty() || total <= 0.0 {
            return None;
        }
        let mut target = rng.random_range(0.0..total);
        for choice in &self.choices {
            if target < choice.weight {
                return Some(choice);
            }
            target -= choice.weight;
        }
        self.choices.iter().rev().find(|c| c.weight > 0.0)
    }
}

/// Randomized composition of paired geometric and photometric transforms.
///
/// # Example
/// ```ignore
/// let policy = AugmentationPolicy::default();
/// let mut rng = StdRng::seed_from_u64(7);
/// let (image, mask) = policy.apply_with(&image, &mask, &mut rng)?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentationPolicy {
    pub gates: Vec<Gate>,
}

impl Default for AugmentationPolicy {
    fn default() -> Self {
        use AugmentKind::*;
        use ParamSampler::*;
        Self {
            gates: vec![
                Gate {
                    probability: 0.5,
                    choices: vec![Choice::new(HorizontalFlip, Fixed(0.0))],
                },
                Gate {
                    probability: 0.5,
                    choices: vec![
                        Choice::new(ShiftScaleCropPad, Fixed(0.2)),
                        Choice::new(HorizontalShear, Uniform { low: -0.07, high: 0.07 }),
                        Choice::new(ShiftRotate, Uniform { low: 0.0, high: 15.0 }),
                    ],
                },
                Gate {
                    probability: 0.5,
                    choices: vec![
                        Choice::new(BrightnessShift, Uniform { low: -0.1, high: 0.1 }),
                        Choice::new(BrightnessMultiply, Uniform { low: 0.92, high: 1.08 }),
                    ],
                },
            ],
        }
    }
}

impl AugmentationPolicy {
    pub fn new(gates: Vec<Gate>) -> Result<Self> {
        let policy = Self { gates };
        policy.validate()?;
        Ok(policy)
    }

    /// A policy that never changes its input.
    pub fn identity() -> Self {
        Self { gates: Vec::new() }
    }

    /// Checks that probabilities lie in `[0, 1]` and weights are finite and
    /// non-negative.
    pub fn validate(&self) -> Result<()> {
        for (i, gate) in self.gates.iter().enumerate() {
            if !(0.0..=1.0).contains(&gate.probability) {
                return Err(DataError::InvalidParameter(format!(
                    "gate {i} probability must be in [0, 1] (got {})",
                    gate.probability
                ))
                .into());
            }
            if let Some(c) = gate
                .choices
                .iter()
                .find(|c| !c.weight.is_finite() || c.weight < 0.0)
            {
                return Err(DataError::InvalidParameter(format!(
                    "gate {i} has invalid weight {} for {:?}",
                    c.weight, c.kind
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Runs every gate in order against `rng`.
    pub fn apply_with<R: Rng + ?Sized>(
        &self,
        image: &Image,
        mask: &Mask,
        rng: &mut R,
    ) -> Result<(Image, Mask)> {
        ensure_same_shape("augmentation", image, mask)?;
        let mut image = image.clone();
        let mut mask = mask.clone();

        for (gate_index, gate) in self.gates.iter().enumerate() {
            if rng.random::<f64>() >= gate.probability {
                tracing::trace!(gate_index, "gate skipped");
                continue;
            }
            let Some(choice) = gate.pick(rng) else {
                continue;
            };
            let value = choice.param.sample(rng);
            tracing::trace!(gate_index, kind = ?choice.kind, value, "gate applied");
            (image, mask) = choice.kind.apply(&image, &mask, value, rng)?;
        }
        Ok((image, mask))
    }
}

/// Draws from the calling thread's worker RNG.
impl Transform<(Image, Mask), (Image, Mask)> for AugmentationPolicy {
    fn apply(&self, (image, mask): (Image, Mask)) -> Result<(Image, Mask)> {
        with_worker_rng(|rng| self.apply_with(&image, &mask, rng))
    }
}
