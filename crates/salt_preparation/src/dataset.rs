use crate::dataloader::with_worker_rng;
use crate::error::DataError;
use crate::sample::{Sample, IMAGE, LABEL, MASK};
use crate::transforms::vision::{
    add_depth_channels, horizontal_flip, to_chw, AugmentationPolicy, BorderMode, CenterPad,
    Image, Mask, Resize,
};
use crate::transforms::Transform;
use anyhow::{Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A `Dataset` provides indexed access to assembled samples.
///
/// Implementations must be `Send + Sync` so loader workers can share one
/// instance behind an `Arc`.
pub trait Dataset: Send + Sync {
    /// Assembles the sample at `index`.
    fn get(&self, index: usize) -> Result<Sample>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates every sample in index order.
    fn iter(&self) -> DatasetIter<'_, Self>
    where
        Self: Sized,
    {
        DatasetIter {
            dataset: self,
            next: 0,
        }
    }
}

/// Sequential iterator returned by [`Dataset::iter`].
#[derive(Debug)]
pub struct DatasetIter<'a, D> {
    dataset: &'a D,
    next: usize,
}

impl<D: Dataset> Iterator for DatasetIter<'_, D> {
    type Item = Result<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.dataset.len() {
            return None;
        }
        let item = self.dataset.get(self.next);
        self.next += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.dataset.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Retrieval mode, fixed when the dataset is built.
///
/// | Mode    | Augment | Image out        | Mask out          | Label |
/// |---------|---------|------------------|-------------------|-------|
/// | `Train` | yes     | `[3, Hp, Wp]`    | `[1, Hp, Wp]`     | `[]`  |
/// | `Val`   | no      | `[3, Hp, Wp]`    | `[1, fine, fine]` |       |
/// | `Tta`   | mirror  | `[3, Hp, Wp]`    |                   |       |
/// | `Infer` | no      | `[3, Hp, Wp]`    |                   |       |
///
/// `Hp = Wp = fine_size + pad_left + pad_right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Train,
    Val,
    /// Test-time augmentation; `mirror` flips the image horizontally.
    Tta { mirror: bool },
    #[default]
    Infer,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Train => "train",
            Mode::Val => "val",
            Mode::Tta { .. } => "tta",
            Mode::Infer => "infer",
        }
    }

    pub fn requires_masks(&self) -> bool {
        matches!(self, Mode::Train | Mode::Val)
    }
}

/// Assembly parameters for a [`SaltDataset`].
///
/// Example:
/// ```ignore
/// let config = SaltDatasetConfig::builder()
///     .mode(Mode::Train)
///     .fine_size(101)
///     .pad(13, 14)
///     .build()?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaltDatasetConfig {
    pub mode: Mode,
    /// Square side every image (and mask) is resized to before padding.
    pub fine_size: usize,
    pub pad_left: usize,
    pub pad_right: usize,
    /// Fill policy for the padded border.
    pub pad_border: BorderMode,
}

impl Default for SaltDatasetConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Infer,
            fine_size: crate::readers::RAW_SIZE,
            pad_left: 0,
            pad_right: 0,
            pad_border: BorderMode::Replicate,
        }
    }
}

impl SaltDatasetConfig {
    pub fn builder() -> SaltDatasetConfigBuilder {
        SaltDatasetConfigBuilder::default()
    }

    /// Parses a JSON object; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).context("Failed to parse dataset config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fine_size == 0 {
            return Err(DataError::InvalidParameter("fine_size must be > 0".into()).into());
        }
        Ok(())
    }

    /// Spatial side of emitted images.
    pub fn padded_size(&self) -> usize {
        self.fine_size + self.pad_left + self.pad_right
    }

    fn needs_padding(&self) -> bool {
        self.pad_left != 0 || self.pad_right != 0
    }
}

/// Builder for [`SaltDatasetConfig`] with method chaining.
#[derive(Debug, Default)]
pub struct SaltDatasetConfigBuilder {
    config: SaltDatasetConfig,
}

impl SaltDatasetConfigBuilder {
    pub fn mode(mut self, mode: Mode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn fine_size(mut self, size: usize) -> Self {
        self.config.fine_size = size;
        self
    }

    /// Sets both pad amounts.
    pub fn pad(mut self, pad_left: usize, pad_right: usize) -> Self {
        self.config.pad_left = pad_left;
        self.config.pad_right = pad_right;
        self
    }

    pub fn pad_border(mut self, border: BorderMode) -> Self {
        self.config.pad_border = border;
        self
    }

    pub fn build(self) -> Result<SaltDatasetConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// ============================================================================
// SaltDataset
// ============================================================================

/// Mode-dependent sample assembler over in-memory image and mask planes.
///
/// The backing planes live in `Arc<[_]>`, so cloning the dataset is cheap
/// and every retrieval works on its own copy of the indexed planes.
///
/// Per-mode pipeline for index `i`:
/// ```text
/// TRAIN  copy (img, mask) → augment → label = (sum(mask) == 0), 0-d
///        → resize → pad both → [1,H,W] → depth(img)
/// VAL    copy (img, mask) → resize → pad img only → [1,H,W] → depth(img)
/// TTA    copy img → mirror? → resize → pad → [1,H,W] → depth
/// INFER  copy img → resize → pad → [1,H,W] → depth
/// ```
///
/// The VAL mask stays at `fine_size` while the image is padded; callers
/// crop predictions back before comparing.
#[derive(Debug, Clone)]
pub struct SaltDataset {
    images: Arc<[Image]>,
    masks: Option<Arc<[Mask]>>,
    config: SaltDatasetConfig,
    policy: AugmentationPolicy,
    resize: Resize,
    pad: CenterPad,
}

impl SaltDataset {
    /// Builds the assembler.
    ///
    /// Fails with [`DataError::MissingMasks`] when TRAIN or VAL gets no
    /// masks, and with [`DataError::ShapeMismatch`] when mask count or any
    /// image/mask pair shape disagrees. Masks passed to TTA or INFER are
    /// still validated but otherwise ignored.
    pub fn new(
        images: Vec<Image>,
        masks: Option<Vec<Mask>>,
        config: SaltDatasetConfig,
    ) -> Result<Self> {
        config.validate()?;
        if config.mode.requires_masks() && masks.is_none() {
            return Err(DataError::MissingMasks(config.mode.name()).into());
        }
        if let Some(masks) = &masks {
            if masks.len() != images.len() {
                return Err(DataError::shape_mismatch(
                    "image/mask count",
                    &[images.len()],
                    &[masks.len()],
                )
                .into());
            }
            for (i, (image, mask)) in images.iter().zip(masks).enumerate() {
                if image.dim() != mask.dim() {
                    return Err(DataError::shape_mismatch(
                        format!("sample {i}"),
                        image.shape(),
                        mask.shape(),
                    )
                    .into());
                }
            }
        }

        tracing::info!(
            mode = config.mode.name(),
            count = images.len(),
            fine_size = config.fine_size,
            pad_left = config.pad_left,
            pad_right = config.pad_right,
            "built salt dataset"
        );

        Ok(Self {
            images: images.into(),
            masks: masks.map(Into::into),
            resize: Resize::new(config.fine_size, config.fine_size)?,
            pad: CenterPad::new(config.pad_left, config.pad_right).with_border(config.pad_border),
            config,
            policy: AugmentationPolicy::default(),
        })
    }

    /// Replaces the TRAIN augmentation policy.
    pub fn with_policy(mut self, policy: AugmentationPolicy) -> Result<Self> {
        policy.validate()?;
        self.policy = policy;
        Ok(self)
    }

    pub fn config(&self) -> &SaltDatasetConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    pub fn policy(&self) -> &AugmentationPolicy {
        &self.policy
    }

    /// Assembles sample `index`, drawing augmentation randomness from `rng`.
    pub fn get_with<R: Rng + ?Sized>(&self, index: usize, rng: &mut R) -> Result<Sample> {
        let len = self.images.len();
        let image = self
            .images
            .get(index)
            .ok_or(DataError::OutOfRange { index, len })?
            .clone();

        match self.config.mode {
            Mode::Train => {
                let mask = self.mask_at(index)?;
                let (image, mask) = self.policy.apply_with(&image, &mask, rng)?;
                let is_empty = if mask.sum() == 0.0 { 1.0 } else { 0.0 };
                let (image, mask) = self.resize.apply((image, mask))?;
                let (image, mask) = if self.config.needs_padding() {
                    self.pad.apply((image, mask))?
                } else {
                    (image, mask)
                };
                Ok(Sample::from_single(IMAGE, add_depth_channels(&image).into_dyn())
                    .with_feature(MASK, to_chw(mask).into_dyn())
                    .with_scalar(LABEL, is_empty))
            }
            Mode::Val => {
                let mask = self.mask_at(index)?;
                let (image, mask) = self.resize.apply((image, mask))?;
                Ok(Sample::from_single(IMAGE, self.finish_image(image)?.into_dyn())
                    .with_feature(MASK, to_chw(mask).into_dyn()))
            }
            Mode::Tta { mirror } => {
                let image = if mirror { horizontal_flip(&image) } else { image };
                let image = self.resize.apply(image)?;
                Ok(Sample::from_single(IMAGE, self.finish_image(image)?.into_dyn()))
            }
            Mode::Infer => {
                let image = self.resize.apply(image)?;
                Ok(Sample::from_single(IMAGE, self.finish_image(image)?.into_dyn()))
            }
        }
    }

    fn mask_at(&self, index: usize) -> Result<Mask> {
        let masks = self
            .masks
            .as_ref()
            .ok_or(DataError::MissingMasks(self.config.mode.name()))?;
        let mask = masks.get(index).ok_or(DataError::OutOfRange {
            index,
            len: masks.len(),
        })?;
        Ok(mask.clone())
    }

    /// Pads (when configured) and expands to depth channels.
    fn finish_image(&self, image: Image) -> Result<ndarray::Array3<f32>> {
        let image = if self.config.needs_padding() {
            self.pad.apply(image)?
        } else {
            image
        };
        Ok(add_depth_channels(&image))
    }
}

impl Dataset for SaltDataset {
    /// Uses the calling thread's worker RNG for TRAIN augmentation.
    fn get(&self, index: usize) -> Result<Sample> {
        with_worker_rng(|rng| self.get_with(index, rng))
            .with_context(|| format!("Failed to assemble {} sample {}", self.mode().name(), index))
    }

    fn len(&self) -> usize {
        self.images.len()
    }
}

#[cfg(test)]
mod salt_dataset_tests {
    use super::*;
    use ndarray::{s, Array2, Axis, Ix3};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn constant_pairs(n: usize, side: usize) -> (Vec<Image>, Vec<Mask>) {
        let images = (0..n).map(|_| Array2::from_elem((side, side), 0.5)).collect();
        let masks = (0..n).map(|_| Array2::zeros((side, side))).collect();
        (images, masks)
    }

    fn config(mode: Mode) -> SaltDatasetConfig {
        SaltDatasetConfig::builder()
            .mode(mode)
            .fine_size(101)
            .pad(13, 14)
            .build()
            .unwrap()
    }

    fn no_augment() -> AugmentationPolicy {
        AugmentationPolicy::identity()
    }

    #[test]
    fn test_train_sample_layout() -> Result<()> {
        let (images, masks) = constant_pairs(2, 101);
        let dataset = SaltDataset::new(images, Some(masks), config(Mode::Train))?;

        let mut rng = StdRng::seed_from_u64(3);
        let sample = dataset.get_with(0, &mut rng)?;
        assert_eq!(sample.get(IMAGE)?.shape(), &[3, 128, 128]);
        assert_eq!(sample.get(MASK)?.shape(), &[1, 128, 128]);
        assert_eq!(sample.get(LABEL)?.ndim(), 0);
        assert_eq!(sample.get(LABEL)?.first(), Some(&1.0));
        Ok(())
    }

    #[test]
    fn test_val_sample_keeps_mask_unpadded() -> Result<()> {
        let (images, masks) = constant_pairs(1, 101);
        let dataset = SaltDataset::new(images, Some(masks), config(Mode::Val))?;

        let sample = dataset.get(0)?;
        assert_eq!(sample.get(IMAGE)?.shape(), &[3, 128, 128]);
        assert_eq!(sample.get(MASK)?.shape(), &[1, 101, 101]);
        assert!(!sample.contains(LABEL));
        Ok(())
    }

    #[test]
    fn test_label_tracks_mask_emptiness() -> Result<()> {
        let (images, mut masks) = constant_pairs(2, 101);
        masks[1][[50, 50]] = 1.0;
        let dataset = SaltDataset::new(images, Some(masks), config(Mode::Train))?
            .with_policy(no_augment())?;

        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(dataset.get_with(0, &mut rng)?.get(LABEL)?.first(), Some(&1.0));
        assert_eq!(dataset.get_with(1, &mut rng)?.get(LABEL)?.first(), Some(&0.0));
        Ok(())
    }

    #[test]
    fn test_label_is_computed_after_augmentation() -> Result<()> {
        // A single salt pixel near the border: crops and warps sometimes
        // remove it, and the label must follow the augmented mask.
        let image = Array2::from_elem((20, 20), 0.5);
        let mut mask = Array2::zeros((20, 20));
        mask[[1, 1]] = 1.0;
        let cfg = SaltDatasetConfig::builder()
            .mode(Mode::Train)
            .fine_size(20)
            .build()?;
        let dataset = SaltDataset::new(vec![image], Some(vec![mask]), cfg)?;

        for seed in 0..64 {
            let sample = dataset.get_with(0, &mut StdRng::seed_from_u64(seed))?;
            let empty = sample.get(MASK)?.sum() == 0.0;
            assert_eq!(sample.get(LABEL)?.first(), Some(&if empty { 1.0 } else { 0.0 }));
        }
        Ok(())
    }

    #[test]
    fn test_depth_channels_on_emitted_image() -> Result<()> {
        let (images, _) = constant_pairs(1, 101);
        let dataset = SaltDataset::new(images, None, config(Mode::Infer))?;
        let image = dataset.get(0)?.get(IMAGE)?.clone();

        let depth = image.index_axis(Axis(0), 1);
        assert_eq!(depth[[0, 0]], 0.0);
        assert_eq!(depth[[127, 5]], 1.0);
        for r in 0..128 {
            assert!((depth[[r, 64]] - r as f32 / 127.0).abs() < 1e-6);
        }
        Ok(())
    }

    #[test]
    fn test_tta_mirror() -> Result<()> {
        let image = Array2::from_shape_fn((101, 101), |(_, x)| x as f32 / 100.0);
        let cfg = |mirror| {
            SaltDatasetConfig::builder()
                .mode(Mode::Tta { mirror })
                .build()
        };
        let plain = SaltDataset::new(vec![image.clone()], None, cfg(false)?)?;
        let mirrored = SaltDataset::new(vec![image], None, cfg(true)?)?;

        let a = plain.get(0)?.get(IMAGE)?.clone().into_dimensionality::<Ix3>()?;
        let b = mirrored.get(0)?.get(IMAGE)?.clone().into_dimensionality::<Ix3>()?;
        assert_eq!(a.dim(), (3, 101, 101));
        assert!(!mirrored.get(0)?.contains(MASK));
        assert_eq!(mirrored.get(0)?.features().count(), 1);

        let a0 = a.index_axis(Axis(0), 0);
        let b0 = b.index_axis(Axis(0), 0);
        assert_eq!(a0.slice(s![.., ..;-1]), b0);
        assert_eq!(a.index_axis(Axis(0), 1), b.index_axis(Axis(0), 1));
        Ok(())
    }

    #[test]
    fn test_resizes_when_fine_size_differs() -> Result<()> {
        let (images, masks) = constant_pairs(1, 101);
        let cfg = SaltDatasetConfig::builder()
            .mode(Mode::Val)
            .fine_size(202)
            .pad(27, 27)
            .build()?;
        let sample = SaltDataset::new(images, Some(masks), cfg)?.get(0)?;
        assert_eq!(sample.get(IMAGE)?.shape(), &[3, 256, 256]);
        assert_eq!(sample.get(MASK)?.shape(), &[1, 202, 202]);
        Ok(())
    }

    #[test]
    fn test_no_padding_when_pads_are_zero() -> Result<()> {
        let (images, _) = constant_pairs(1, 101);
        let cfg = SaltDatasetConfig::builder().fine_size(101).build()?;
        let sample = SaltDataset::new(images, None, cfg)?.get(0)?;
        assert_eq!(sample.get(IMAGE)?.shape(), &[3, 101, 101]);
        Ok(())
    }

    #[test]
    fn test_out_of_range() -> Result<()> {
        let (images, _) = constant_pairs(3, 101);
        let dataset = SaltDataset::new(images, None, config(Mode::Infer))?;
        let err = dataset.get(3).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DataError>(),
            Some(&DataError::OutOfRange { index: 3, len: 3 })
        );
        Ok(())
    }

    #[test]
    fn test_construction_errors() {
        let (images, masks) = constant_pairs(2, 101);

        let err = SaltDataset::new(images.clone(), None, config(Mode::Train)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::MissingMasks("train"))
        ));

        let err = SaltDataset::new(images.clone(), Some(masks[..1].to_vec()), config(Mode::Val))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::ShapeMismatch { .. })
        ));

        let bad = vec![Array2::zeros((101, 101)), Array2::zeros((100, 101))];
        let err = SaltDataset::new(images, Some(bad), config(Mode::Train)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_mutating_sample_leaves_backing_store() -> Result<()> {
        let (images, masks) = constant_pairs(1, 101);
        let dataset = SaltDataset::new(images, Some(masks), config(Mode::Val))?;

        let mut first = dataset.get(0)?;
        first.get_mut(IMAGE)?.fill(-7.0);
        first.get_mut(MASK)?.fill(1.0);

        let second = dataset.get(0)?;
        assert!(second.get(MASK)?.iter().all(|&v| v == 0.0));
        assert_eq!(second.get(IMAGE)?[[0, 64, 64]], 0.5);
        assert_ne!(first, second);
        Ok(())
    }

    #[test]
    fn test_config_from_json() -> Result<()> {
        let cfg = SaltDatasetConfig::from_json_str(
            r#"{"mode": {"tta": {"mirror": true}}, "pad_left": 13, "pad_right": 14}"#,
        )?;
        assert_eq!(cfg.mode, Mode::Tta { mirror: true });
        assert_eq!(cfg.fine_size, 101);
        assert_eq!(cfg.padded_size(), 128);
        assert_eq!(cfg.pad_border, BorderMode::Replicate);

        assert!(SaltDatasetConfig::from_json_str(r#"{"fine_size": 0}"#).is_err());
        assert!(SaltDatasetConfig::builder().fine_size(0).build().is_err());
        Ok(())
    }

    #[test]
    fn test_iter_visits_every_index() -> Result<()> {
        let (images, _) = constant_pairs(4, 101);
        let dataset = SaltDataset::new(images, None, config(Mode::Infer))?;
        assert_eq!(dataset.iter().size_hint(), (4, Some(4)));
        let samples = dataset.iter().collect::<Result<Vec<_>>>()?;
        assert_eq!(samples.len(), 4);
        Ok(())
    }
}
