use crate::error::DataError;
use crate::transforms::vision::{Image, Mask};
use anyhow::{Context, Result};
use ndarray::Array2;
use std::fs;
use std::path::{Path, PathBuf};

/// Side length of every raw image and mask on disk.
pub const RAW_SIZE: usize = 101;

/// Reads a PNG as 8-bit grayscale and scales it to `[0, 1]`.
///
/// Fails with [`DataError::ShapeMismatch`] if the file is not
/// `RAW_SIZE x RAW_SIZE`.
pub fn load_grayscale(path: &Path) -> Result<Image> {
    let gray = image::open(path)
        .with_context(|| format!("Failed to decode image: {}", path.display()))?
        .to_luma8();
    let (width, height) = gray.dimensions();
    let (height, width) = (height as usize, width as usize);
    if (height, width) != (RAW_SIZE, RAW_SIZE) {
        return Err(DataError::shape_mismatch(
            path.display().to_string(),
            &[height, width],
            &[RAW_SIZE, RAW_SIZE],
        )
        .into());
    }
    let pixels = gray.into_raw().into_iter().map(|v| v as f32 / 255.0).collect();
    Ok(Array2::from_shape_vec((height, width), pixels)?)
}

fn load_all(paths: impl Iterator<Item = PathBuf>) -> Result<Vec<Image>> {
    paths.map(|p| load_grayscale(&p)).collect()
}

/// Loads `root/images/<id>.png` and `root/masks/<id>.png` for every id.
///
/// # Example
/// ```ignore
/// let ids = IdUniverse::from_csv("data/train.csv", "data/depths.csv")?;
/// let (images, masks) = fetch_training_data("data/train", &ids.train)?;
/// ```
pub fn fetch_training_data(
    root: impl AsRef<Path>,
    ids: &[String],
) -> Result<(Vec<Image>, Vec<Mask>)> {
    let root = root.as_ref();
    let images = load_all(ids.iter().map(|id| root.join("images").join(format!("{id}.png"))))?;
    let masks = load_all(ids.iter().map(|id| root.join("masks").join(format!("{id}.png"))))?;
    tracing::info!(count = ids.len(), root = %root.display(), "fetched training data");
    Ok((images, masks))
}

/// Loads test images paired with pseudo-label masks.
///
/// `names` are file names (extension included) looked up in both
/// directories. When `None`, every `.png` in `mask_dir` is used, in sorted
/// order.
pub fn fetch_pseudo_labeled_data(
    image_dir: impl AsRef<Path>,
    mask_dir: impl AsRef<Path>,
    names: Option<&[String]>,
) -> Result<(Vec<Image>, Vec<Mask>)> {
    let (image_dir, mask_dir) = (image_dir.as_ref(), mask_dir.as_ref());
    let names = match names {
        Some(names) => names.to_vec(),
        None => list_png_names(mask_dir)?,
    };
    let images = load_all(names.iter().map(|n| image_dir.join(n)))?;
    let masks = load_all(names.iter().map(|n| mask_dir.join(n)))?;
    tracing::info!(
        count = names.len(),
        mask_dir = %mask_dir.display(),
        "fetched pseudo-labeled data"
    );
    Ok((images, masks))
}

/// Loads `image_dir/<id>.png` for every id.
pub fn fetch_test_data(image_dir: impl AsRef<Path>, ids: &[String]) -> Result<Vec<Image>> {
    let image_dir = image_dir.as_ref();
    let images = load_all(ids.iter().map(|id| image_dir.join(format!("{id}.png"))))?;
    tracing::info!(count = ids.len(), dir = %image_dir.display(), "fetched test data");
    Ok(images)
}

fn list_png_names(dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to access directory: {}", dir.display()))?;
    let mut names = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to read directory entry in {}", dir.display()))?
            .path();
        let is_png = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("png"));
        if !is_png || !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.push(name.to_string());
        }
    }
    names.sort_unstable();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;
    use std::fs::File;
    use tempfile::tempdir;

    fn write_png(path: &Path, side: u32, value: u8) -> Result<()> {
        GrayImage::from_pixel(side, side, image::Luma([value])).save(path)?;
        Ok(())
    }

    #[test]
    fn test_fetch_training_data_scales_to_unit_range() -> Result<()> {
        let dir = tempdir()?;
        fs::create_dir_all(dir.path().join("images"))?;
        fs::create_dir_all(dir.path().join("masks"))?;
        write_png(&dir.path().join("images/a1.png"), 101, 255)?;
        write_png(&dir.path().join("masks/a1.png"), 101, 0)?;
        write_png(&dir.path().join("images/b2.png"), 101, 51)?;
        write_png(&dir.path().join("masks/b2.png"), 101, 255)?;

        let ids = vec!["a1".to_string(), "b2".to_string()];
        let (images, masks) = fetch_training_data(dir.path(), &ids)?;

        assert_eq!(images.len(), 2);
        assert_eq!(images[0].dim(), (RAW_SIZE, RAW_SIZE));
        assert!(images[0].iter().all(|&v| v == 1.0));
        assert!(images[1].iter().all(|&v| (v - 0.2).abs() < 1e-6));
        assert!(masks[0].iter().all(|&v| v == 0.0));
        assert!(masks[1].iter().all(|&v| v == 1.0));
        Ok(())
    }

    #[test]
    fn test_wrong_size_is_shape_mismatch() -> Result<()> {
        let dir = tempdir()?;
        write_png(&dir.path().join("small.png"), 64, 10)?;
        let err = fetch_test_data(dir.path(), &["small".to_string()]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::ShapeMismatch { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_missing_file_has_context() -> Result<()> {
        let dir = tempdir()?;
        let err = fetch_test_data(dir.path(), &["ghost".to_string()]).unwrap_err();
        assert!(format!("{err:#}").contains("ghost.png"));
        Ok(())
    }

    #[test]
    fn test_pseudo_labels_use_sorted_mask_listing() -> Result<()> {
        let images = tempdir()?;
        let masks = tempdir()?;
        for (name, value) in [("c.png", 30u8), ("a.png", 10), ("b.png", 20)] {
            write_png(&images.path().join(name), 101, value)?;
            write_png(&masks.path().join(name), 101, 255)?;
        }
        File::create(masks.path().join("notes.txt"))?;

        let (imgs, msks) = fetch_pseudo_labeled_data(images.path(), masks.path(), None)?;
        assert_eq!(imgs.len(), 3);
        assert_eq!(msks.len(), 3);
        let firsts: Vec<f32> = imgs.iter().map(|i| i[[0, 0]]).collect();
        assert_eq!(firsts, vec![10.0 / 255.0, 20.0 / 255.0, 30.0 / 255.0]);

        let only_b = vec!["b.png".to_string()];
        let (imgs, _) = fetch_pseudo_labeled_data(images.path(), masks.path(), Some(&only_b))?;
        assert_eq!(imgs.len(), 1);
        assert_eq!(imgs[0][[0, 0]], 20.0 / 255.0);
        Ok(())
    }
}
