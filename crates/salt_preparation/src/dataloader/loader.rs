//! src/dataloader/loader.rs
//!
//! DataLoader constructors and epoch bookkeeping.
//!
//! The loader owns the dataset behind an `Arc`, a batch sampler built from
//! `config.shuffle` (sequential or seeded random) and a collator. Each call
//! to [`DataLoader::iter`] starts a new epoch.
//!
//! # Seed Coordination
//!
//! A single seed drives both the epoch order (`seed + epoch`) and the
//! augmentation RNG of each worker (`seed + (epoch << 32) + worker_id`).
//! Without `config.seed` the loader draws one from entropy at construction.

use crate::collator::{Collator, StackCollator};
use crate::dataset::Dataset;
use crate::sampler::{BatchSampler, RandomSampler, Sampler, SequentialSampler};
use anyhow::{Context, Result};
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::config::DataLoaderConfig;
use super::iterator::DataLoaderIter;

/// Batches samples from a [`Dataset`] into [`MiniBatch`](crate::minibatch::MiniBatch)es.
///
/// # Thread safety:
/// - `DataLoader` is `Send + Sync` and can be shared across threads.
/// - Iterators borrow the loader and run on one thread.
///
/// # Type parameters:
/// - `D`: Dataset type
/// - `C`: Collator type (defaults to StackCollator)
///
/// # Example
/// ```ignore
/// let config = DataLoaderConfig::builder()
///     .batch_size(32)
///     .shuffle(true)
///     .seed(42)
///     .num_workers(4)
///     .build();
/// let loader = DataLoader::new(dataset, config)?;
/// for batch in loader.iter()? {
///     let batch = batch?;
///     let images = batch.get("image")?; // [32, 3, 128, 128]
/// }
/// ```
pub struct DataLoader<D, C = StackCollator> {
    pub(crate) dataset: Arc<D>,
    pub(crate) collator: C,
    pub(crate) config: DataLoaderConfig,
    pub(crate) batch_sampler: Box<dyn Sampler<Item = Vec<usize>>>,
    pub(crate) seed: u64,
    current_epoch: AtomicUsize,
}

impl<D: Dataset + 'static> DataLoader<D, StackCollator> {
    pub fn new(dataset: D, config: DataLoaderConfig) -> Result<Self> {
        Self::new_with_collator(dataset, config, StackCollator)
    }
}

impl<D, C> DataLoader<D, C>
where
    D: Dataset + 'static,
    C: Collator + Clone + Send + Sync + 'static,
{
    /// # Errors
    /// - `batch_size` is 0
    /// - `prefetch_factor` is 0 while using workers
    pub fn new_with_collator(dataset: D, config: DataLoaderConfig, collator: C) -> Result<Self> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());

        let sampler: Box<dyn Sampler<Item = usize>> = if config.shuffle {
            Box::new(RandomSampler::new(dataset.len(), seed))
        } else {
            Box::new(SequentialSampler::new(dataset.len()))
        };
        let batch_sampler = BatchSampler::new(sampler, config.batch_size, config.drop_last)
            .context("Failed to wrap sampler with BatchSampler")?;

        tracing::info!(
            samples = dataset.len(),
            batch_size = config.batch_size,
            num_workers = config.num_workers,
            shuffle = config.shuffle,
            "built data loader"
        );

        Ok(Self {
            dataset: Arc::new(dataset),
            collator,
            config,
            batch_sampler: Box::new(batch_sampler),
            seed,
            current_epoch: AtomicUsize::new(0),
        })
    }

    /// Starts the next epoch and returns an iterator over its batches.
    pub fn iter(&self) -> Result<DataLoaderIter<'_, D, C>> {
        let epoch = self.current_epoch.fetch_add(1, Ordering::Relaxed);
        DataLoaderIter::new(self, epoch)
    }

    /// Sets the epoch the next [`iter`](Self::iter) call will use.
    pub fn set_epoch(&self, epoch: usize) {
        self.current_epoch.store(epoch, Ordering::Relaxed);
    }

    /// The epoch the next [`iter`](Self::iter) call will use.
    pub fn epoch(&self) -> usize {
        self.current_epoch.load(Ordering::Relaxed)
    }

    /// Number of batches per epoch.
    pub fn len(&self) -> usize {
        let n = self.dataset.len();
        let bs = self.config.batch_size;
        if self.config.drop_last {
            n / bs
        } else {
            n.div_ceil(bs)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dataset(&self) -> &D {
        &self.dataset
    }

    pub fn config(&self) -> &DataLoaderConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}
