use crate::collator::Collator;
use crate::sample::Sample;
use anyhow::{anyhow, Result};
use ndarray::ArrayD;
use std::collections::HashMap;

/// A batch of samples stacked along a new leading axis.
///
/// Each array has shape `[batch_size, ...]`; the trailing dimensions match
/// across all samples that went into the batch.
///
/// # Examples
/// Four TRAIN samples padded to 128x128 become:
/// - `"image"` -> `[4, 3, 128, 128]`
/// - `"mask"` -> `[4, 1, 128, 128]`
/// - `"label"` -> `[4]`
#[derive(Debug, Clone, PartialEq)]
pub struct MiniBatch {
    pub tensors: HashMap<String, ArrayD<f32>>,
}

impl MiniBatch {
    /// Builds a `MiniBatch` by handing `samples` to `collator`.
    ///
    /// Example:
    /// let batch = MiniBatch::collate(samples, StackCollator);
    pub fn collate(samples: Vec<Sample>, collator: impl Collator) -> Result<Self> {
        collator.collate(&samples)
    }

    pub fn batch_size(&self) -> Result<usize> {
        self.tensors
            .values()
            .next()
            .map(|t| t.shape()[0])
            .ok_or(anyhow!("Empty mini-batch"))
    }

    pub fn get(&self, feature: &str) -> Result<&ArrayD<f32>> {
        self.tensors
            .get(feature)
            .ok_or_else(|| anyhow!("Feature '{}' not found in mini-batch", feature))
    }

    /// Returns an iterator over all feature keys in the batch.
    pub fn features(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(String::as_str)
    }

    /// Copies every array into a `tch::Tensor` on `device`.
    #[cfg(feature = "tch")]
    pub fn to_tch(&self, device: tch::Device) -> Result<HashMap<String, tch::Tensor>> {
        self.tensors
            .iter()
            .map(|(k, v)| Ok((k.clone(), array_to_tensor(v)?.to_device(device))))
            .collect()
    }
}

#[cfg(feature = "tch")]
pub(crate) fn array_to_tensor(array: &ArrayD<f32>) -> Result<tch::Tensor> {
    let shape: Vec<i64> = array.shape().iter().map(|&d| d as i64).collect();
    let data: Vec<f32> = array.iter().copied().collect();
    Ok(tch::Tensor::from_slice(&data).f_reshape(shape.as_slice())?)
}
