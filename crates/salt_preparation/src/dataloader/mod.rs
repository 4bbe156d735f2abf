//! src/dataloader/mod.rs
//!
//! The `DataLoader` turns a [`Dataset`](crate::dataset::Dataset) into a
//! stream of [`MiniBatch`](crate::minibatch::MiniBatch)es.
//!
//! ```text
//!   ┌─────────────┐
//!   │ SaltDataset │  get(i) → Sample (augment, resize, pad, depth)
//!   └──────┬──────┘
//!          │
//!   ┌──────┴──────┐
//!   │   Sampler   │  sequential or seeded shuffle, grouped into batches
//!   └──────┬──────┘
//!          │
//!   [Worker Threads]  optional; batch i → worker i % num_workers
//!          │
//!   ┌──────┴──────┐
//!   │  Collator   │  stacks samples along a new leading axis
//!   └──────┬──────┘
//!          ↓
//!      MiniBatch
//! ```
//!
//! # Module Structure
//!
//! ```text
//! src/dataloader/
//! ├── mod.rs        # Public API exports
//! ├── config.rs     # DataLoaderConfig and builder
//! ├── loader.rs     # DataLoader struct and constructors
//! ├── iterator.rs   # Per-epoch iterator, in-order reassembly
//! ├── workers/
//! │   ├── mod.rs    # Batch task and worker body
//! │   └── pool.rs   # Generic `WorkerPool<Task, Output>`
//! └── common/
//!     ├── mod.rs
//!     └── thread.rs # Thread-local worker ID and RNG
//! ```
//!
//! # Memory Usage
//! - Single-threaded: O(batch_size)
//! - Multi-threaded: O(num_workers x prefetch_factor x batch_size)

mod common;
mod config;
mod iterator;
mod loader;
mod workers;

pub use config::{DataLoaderConfig, DataLoaderConfigBuilder};
pub use iterator::DataLoaderIter;
pub use loader::DataLoader;

pub use common::thread::{init_worker_rng, with_worker_rng, WORKER_ID, WORKER_RNG};
