#![allow(dead_code)]

use anyhow::Result;
use image::{GrayImage, Luma};
use ndarray::Array2;
use salt_preparation::{Image, Mask};
use std::fs;
use std::path::Path;

/// Installs a test-friendly subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Horizontal gradient image with a salt block in the lower-left corner.
pub fn salt_pair(side: usize) -> (Image, Mask) {
    let image = Array2::from_shape_fn((side, side), |(y, x)| {
        (x as f32 / side as f32) * 0.5 + (y as f32 / side as f32) * 0.25
    });
    let mask = Array2::from_shape_fn((side, side), |(y, x)| {
        if y > side / 2 && x < side / 3 {
            1.0
        } else {
            0.0
        }
    });
    (image, mask)
}

/// Writes `root/images/<id>.png` and `root/masks/<id>.png` for each id.
/// Id `k` gets a constant image of `10 * k` and, for odd `k`, a full mask.
pub fn write_training_fixture(root: &Path, ids: &[String]) -> Result<()> {
    fs::create_dir_all(root.join("images"))?;
    fs::create_dir_all(root.join("masks"))?;
    for (k, id) in ids.iter().enumerate() {
        let side = salt_preparation::readers::RAW_SIZE as u32;
        GrayImage::from_pixel(side, side, Luma([10 * k as u8]))
            .save(root.join("images").join(format!("{id}.png")))?;
        let fill = if k % 2 == 1 { 255 } else { 0 };
        GrayImage::from_pixel(side, side, Luma([fill]))
            .save(root.join("masks").join(format!("{id}.png")))?;
    }
    Ok(())
}

pub fn is_binary(values: impl IntoIterator<Item = f32>) -> bool {
    values.into_iter().all(|v| v == 0.0 || v == 1.0)
}
