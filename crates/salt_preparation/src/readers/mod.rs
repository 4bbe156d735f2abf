//! Disk collaborators that materialize raw planes ahead of assembly.
//!
//! Everything here runs once, before a [`SaltDataset`](crate::dataset::SaltDataset)
//! is built; retrieval itself never touches the filesystem.

pub mod ids;
pub mod png;

pub use ids::{read_id_column, IdUniverse};
pub use png::{
    fetch_pseudo_labeled_data, fetch_test_data, fetch_training_data, load_grayscale, RAW_SIZE,
};
