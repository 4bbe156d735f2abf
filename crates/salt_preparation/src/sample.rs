use anyhow::{anyhow, Result};
use ndarray::{ArrayD, IxDyn};
use std::collections::HashMap;

/// Feature name of the assembled image tensor, `[3, H, W]`.
pub const IMAGE: &str = "image";
/// Feature name of the mask tensor, `[1, H, W]`; only TRAIN and VAL samples carry it.
pub const MASK: &str = "mask";
/// Feature name of the emptiness label, a 0-d array (1.0 when the mask has no salt).
pub const LABEL: &str = "label";

/// A single assembled example: a mapping from feature names to owned
/// `f32` arrays.
///
/// Arrays are always fresh copies; mutating a `Sample` never reaches the
/// dataset it came from.
///
/// # Examples:
/// - TRAIN: `{"image": [3, 128, 128], "mask": [1, 128, 128], "label": []}`
/// - INFER: `{"image": [3, 128, 128]}`
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub features: HashMap<String, ArrayD<f32>>,
}

impl Sample {
    pub fn new(features: HashMap<String, ArrayD<f32>>) -> Self {
        Self { features }
    }

    /// Creates a `Sample` from a single `(feature_name, array)` pair.
    ///
    /// Chain with [`with_feature`](Self::with_feature) to add more features.
    pub fn from_single(name: impl Into<String>, array: ArrayD<f32>) -> Self {
        Self {
            features: HashMap::from([(name.into(), array)]),
        }
    }

    /// Adds or overwrites a feature.
    pub fn with_feature(mut self, name: impl Into<String>, array: ArrayD<f32>) -> Self {
        self.features.insert(name.into(), array);
        self
    }

    /// Adds a scalar feature stored as a 0-d array; stacking N of them
    /// gives `[N]`.
    pub fn with_scalar(self, name: impl Into<String>, value: f32) -> Self {
        self.with_feature(name, ArrayD::from_elem(IxDyn(&[]), value))
    }

    pub fn get(&self, feature: &str) -> Result<&ArrayD<f32>> {
        self.features
            .get(feature)
            .ok_or_else(|| anyhow!("Feature {} not found", feature))
    }

    pub fn get_mut(&mut self, feature: &str) -> Result<&mut ArrayD<f32>> {
        self.features
            .get_mut(feature)
            .ok_or_else(|| anyhow!("Feature {} not found", feature))
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.features.contains_key(feature)
    }

    /// Returns an iterator over all feature names in this `Sample`.
    pub fn features(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    /// Copies every feature into a CPU `tch::Tensor` of the same shape.
    #[cfg(feature = "tch")]
    pub fn to_tch(&self) -> Result<HashMap<String, tch::Tensor>> {
        self.features
            .iter()
            .map(|(k, v)| Ok((k.clone(), crate::minibatch::array_to_tensor(v)?)))
            .collect()
    }
}
