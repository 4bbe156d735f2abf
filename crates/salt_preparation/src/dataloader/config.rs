//! Configuration for DataLoader behaviour
//!
//! Example:
//! ```ignore
//! let config = DataLoaderConfig::builder()
//!     .batch_size(16)
//!     .shuffle(true)
//!     .seed(42)
//!     .num_workers(4)
//!     .build();
//! ```
//!
//! # Performance considerations:
//! - `num_workers`: more workers raise throughput and memory use
//! - `prefetch_factor`: batches queued per worker ahead of the consumer

use anyhow::{ensure, Result};
use std::time::Duration;

/// Configuration for DataLoader
#[derive(Debug, Clone)]
pub struct DataLoaderConfig {
    /// Number of samples per batch (must be > 0)
    pub batch_size: usize,
    /// Number of parallel workers (0 = assemble on the calling thread)
    pub num_workers: usize,
    /// Whether to drop the last incomplete batch
    pub drop_last: bool,
    /// Whether to reshuffle the index order every epoch
    pub shuffle: bool,
    /// Random seed for shuffling and augmentation. Drawn from entropy if unset.
    pub seed: Option<u64>,
    /// Number of batches queued per worker (must be > 0 when using workers)
    pub prefetch_factor: usize,
    /// Maximum time to wait for the next batch from workers.
    pub timeout: Duration,
    /// How often idle workers check for the shutdown signal.
    pub worker_timeout: Duration,
}

impl Default for DataLoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 1,
            num_workers: 0,
            drop_last: false,
            shuffle: false,
            seed: None,
            prefetch_factor: 2,
            timeout: Duration::from_secs(30),
            worker_timeout: Duration::from_millis(100),
        }
    }
}

impl DataLoaderConfig {
    pub fn builder() -> DataLoaderConfigBuilder {
        DataLoaderConfigBuilder::default()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        ensure!(self.batch_size > 0, "Batch size must be greater than 0");
        ensure!(
            self.prefetch_factor > 0 || self.num_workers == 0,
            "Prefetch factor must be > 0 when using {} workers",
            self.num_workers
        );
        Ok(())
    }
}

/// Builder for DataLoaderConfig with method chaining
#[derive(Debug, Default)]
pub struct DataLoaderConfigBuilder {
    config: DataLoaderConfig,
}

impl DataLoaderConfigBuilder {
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    pub fn num_workers(mut self, workers: usize) -> Self {
        self.config.num_workers = workers;
        self
    }

    pub fn drop_last(mut self, drop: bool) -> Self {
        self.config.drop_last = drop;
        self
    }

    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.config.shuffle = shuffle;
        self
    }

    /// Set the random seed for reproducible data loading.
    ///
    /// When set, this seed controls both the shuffle order and the
    /// augmentation draws made inside workers.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn prefetch_factor(mut self, factor: usize) -> Self {
        self.config.prefetch_factor = factor;
        self
    }

    /// Set the timeout for waiting on worker batches.
    ///
    /// Too low cancels legitimate slow batches; too high delays detection
    /// of stuck workers.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn worker_timeout(mut self, worker_timeout: Duration) -> Self {
        self.config.worker_timeout = worker_timeout;
        self
    }

    pub fn build(self) -> DataLoaderConfig {
        self.config
    }
}
