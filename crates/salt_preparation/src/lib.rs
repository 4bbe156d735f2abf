pub mod collator;
pub mod dataloader;
pub mod dataset;
pub mod error;
pub mod minibatch;
pub mod readers;
pub mod sample;
pub mod sampler;
pub mod transforms;

pub use collator::{Collator, StackCollator};
pub use dataloader::{DataLoader, DataLoaderConfig};
pub use dataset::{Dataset, Mode, SaltDataset, SaltDatasetConfig};
pub use error::DataError;
pub use minibatch::MiniBatch;
pub use readers::IdUniverse;
pub use sample::Sample;
pub use transforms::vision::{AugmentationPolicy, Image, Mask};
pub use transforms::Transform;
