use crate::minibatch::MiniBatch;
use crate::sample::Sample;
use anyhow::{anyhow, bail, Result};
use ndarray::{ArrayViewD, Axis};
use std::collections::{HashMap, HashSet};

/// A `Collator` defines how to combine multiple [`Sample`]s into a [`MiniBatch`].
pub trait Collator {
    fn collate(&self, samples: &[Sample]) -> Result<MiniBatch>;
}

impl<C: Collator + ?Sized> Collator for &C {
    fn collate(&self, samples: &[Sample]) -> Result<MiniBatch> {
        (**self).collate(samples)
    }
}

/// Stacks arrays with identical shapes along a new leading axis.
/// There is no padding; a feature whose shape differs between samples is
/// an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct StackCollator;

impl Collator for StackCollator {
    fn collate(&self, samples: &[Sample]) -> Result<MiniBatch> {
        if samples.is_empty() {
            bail!("Cannot collate empty sample list");
        }

        // Validate feature keys
        let first_keys: HashSet<&String> = samples[0].features.keys().collect();
        for (i, sample) in samples.iter().enumerate().skip(1) {
            let missing_keys: Vec<&String> = first_keys
                .iter()
                .filter(|&&k| !sample.features.contains_key(k))
                .cloned()
                .collect();

            let extra_keys: Vec<&String> = sample
                .features
                .keys()
                .filter(|k| !first_keys.contains(k))
                .collect();

            if !missing_keys.is_empty() || !extra_keys.is_empty() {
                bail!(
                    "Sample #{} has mismatch feature keys:\n -Missing: {:?}\n -Extra: {:?}",
                    i,
                    missing_keys,
                    extra_keys
                )
            }
        }

        let mut tensors = HashMap::with_capacity(first_keys.len());
        for key in first_keys {
            let views = samples
                .iter()
                .map(|s| {
                    s.features
                        .get(key)
                        .map(|a| a.view())
                        .ok_or_else(|| anyhow!("Feature '{}' vanished during collation", key))
                })
                .collect::<Result<Vec<ArrayViewD<f32>>>>()?;

            let reference_shape = views[0].shape();
            for (i, view) in views.iter().enumerate() {
                if view.shape() != reference_shape {
                    bail!(
                        "Shape mismatch in sample {} for feature '{}': expected {:?}, got {:?}",
                        i,
                        key,
                        reference_shape,
                        view.shape()
                    );
                }
            }

            let stacked = ndarray::stack(Axis(0), &views)?;
            tensors.insert(key.clone(), stacked);
        }
        Ok(MiniBatch { tensors })
    }
}
