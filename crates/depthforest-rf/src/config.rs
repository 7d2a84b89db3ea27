//! Training parameters for depth forest induction.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::error::RfError;

/// An inclusive numeric range `[start, end]` used for random generation.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NumRange {
    /// Lower bound (inclusive).
    pub start: f64,
    /// Upper bound (inclusive).
    pub end: f64,
}

impl NumRange {
    /// Create a range. Validity is checked by [`TrainingParams::validate`].
    #[must_use]
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    fn check(self, name: &'static str) -> Result<(), RfError> {
        if !self.start.is_finite() || !self.end.is_finite() || self.start > self.end {
            return Err(RfError::InvalidRange {
                name,
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }
}

/// Parameters for one forest training run.
///
/// Construct via [`TrainingParams::new`], then chain `with_*` methods.
/// The snapshot is validated once at the start of training and read-only
/// afterwards; every component receives it by reference.
///
/// # Defaults
///
/// | Parameter          | Default         |
/// |--------------------|-----------------|
/// | `label_num`        | 2               |
/// | `img_num`          | 1               |
/// | `img_dir`          | empty           |
/// | `max_depth`        | 20              |
/// | `min_sample_count` | 1               |
/// | `sample_pixel_num` | 2000            |
/// | `train_img_num`    | 1               |
/// | `offset_num`       | 50              |
/// | `threshold_num`    | 50              |
/// | `offset_range`     | [-150.0, 150.0] |
/// | `threshold_range`  | [-1.0, 1.0]     |
/// | `seed`             | 42              |
/// | `search_workers`   | 4               |
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrainingParams {
    pub(crate) tree_num: usize,
    pub(crate) label_num: usize,
    pub(crate) img_num: usize,
    pub(crate) img_dir: PathBuf,
    pub(crate) max_depth: usize,
    pub(crate) min_sample_count: usize,
    pub(crate) sample_pixel_num: usize,
    pub(crate) train_img_num: usize,
    pub(crate) offset_num: usize,
    pub(crate) threshold_num: usize,
    pub(crate) offset_range: NumRange,
    pub(crate) threshold_range: NumRange,
    pub(crate) seed: u64,
    pub(crate) search_workers: usize,
}

impl TrainingParams {
    /// Create parameters for a forest of `tree_num` trees.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidTreeCount`] if `tree_num` is zero.
    pub fn new(tree_num: usize) -> Result<Self, RfError> {
        if tree_num == 0 {
            return Err(RfError::InvalidTreeCount { tree_num });
        }
        Ok(Self {
            tree_num,
            label_num: 2,
            img_num: 1,
            img_dir: PathBuf::new(),
            max_depth: 20,
            min_sample_count: 1,
            sample_pixel_num: 2000,
            train_img_num: 1,
            offset_num: 50,
            threshold_num: 50,
            offset_range: NumRange::new(-150.0, 150.0),
            threshold_range: NumRange::new(-1.0, 1.0),
            seed: 42,
            search_workers: 4,
        })
    }

    // --- Setters ---

    /// Set the number of labels.
    #[must_use]
    pub fn with_label_num(mut self, label_num: usize) -> Self {
        self.label_num = label_num;
        self
    }

    /// Set the total number of images available in the image directory.
    #[must_use]
    pub fn with_img_num(mut self, img_num: usize) -> Self {
        self.img_num = img_num;
        self
    }

    /// Set the directory holding the training images.
    #[must_use]
    pub fn with_img_dir(mut self, img_dir: impl Into<PathBuf>) -> Self {
        self.img_dir = img_dir.into();
        self
    }

    /// Set the maximum tree depth. Zero makes every tree a single leaf.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the sample count at or below which a node becomes a leaf.
    #[must_use]
    pub fn with_min_sample_count(mut self, min_sample_count: usize) -> Self {
        self.min_sample_count = min_sample_count;
        self
    }

    /// Set the number of pixels sampled per training image.
    #[must_use]
    pub fn with_sample_pixel_num(mut self, sample_pixel_num: usize) -> Self {
        self.sample_pixel_num = sample_pixel_num;
        self
    }

    /// Set the number of images drawn for each tree.
    #[must_use]
    pub fn with_train_img_num(mut self, train_img_num: usize) -> Self {
        self.train_img_num = train_img_num;
        self
    }

    /// Set the number of offset pairs generated per node.
    #[must_use]
    pub fn with_offset_num(mut self, offset_num: usize) -> Self {
        self.offset_num = offset_num;
        self
    }

    /// Set the number of thresholds generated per offset pair.
    #[must_use]
    pub fn with_threshold_num(mut self, threshold_num: usize) -> Self {
        self.threshold_num = threshold_num;
        self
    }

    /// Set the range offset components are drawn from.
    #[must_use]
    pub fn with_offset_range(mut self, offset_range: NumRange) -> Self {
        self.offset_range = offset_range;
        self
    }

    /// Set the range thresholds are drawn from.
    #[must_use]
    pub fn with_threshold_range(mut self, threshold_range: NumRange) -> Self {
        self.threshold_range = threshold_range;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of parallel batches per split search.
    #[must_use]
    pub fn with_search_workers(mut self, search_workers: usize) -> Self {
        self.search_workers = search_workers;
        self
    }

    // --- Getters ---

    /// Return the number of trees.
    #[must_use]
    pub fn tree_num(&self) -> usize {
        self.tree_num
    }

    /// Return the number of labels.
    #[must_use]
    pub fn label_num(&self) -> usize {
        self.label_num
    }

    /// Return the total number of images.
    #[must_use]
    pub fn img_num(&self) -> usize {
        self.img_num
    }

    /// Return the image directory.
    #[must_use]
    pub fn img_dir(&self) -> &Path {
        &self.img_dir
    }

    /// Return the maximum depth.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Return the leaf sample-count bound.
    #[must_use]
    pub fn min_sample_count(&self) -> usize {
        self.min_sample_count
    }

    /// Return the number of pixels sampled per image.
    #[must_use]
    pub fn sample_pixel_num(&self) -> usize {
        self.sample_pixel_num
    }

    /// Return the number of images drawn per tree.
    #[must_use]
    pub fn train_img_num(&self) -> usize {
        self.train_img_num
    }

    /// Return the number of offset pairs per node.
    #[must_use]
    pub fn offset_num(&self) -> usize {
        self.offset_num
    }

    /// Return the number of thresholds per offset pair.
    #[must_use]
    pub fn threshold_num(&self) -> usize {
        self.threshold_num
    }

    /// Return the offset generation range.
    #[must_use]
    pub fn offset_range(&self) -> NumRange {
        self.offset_range
    }

    /// Return the threshold generation range.
    #[must_use]
    pub fn threshold_range(&self) -> NumRange {
        self.threshold_range
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return the number of parallel batches per split search.
    #[must_use]
    pub fn search_workers(&self) -> usize {
        self.search_workers
    }

    /// Total number of split candidates generated per node.
    #[must_use]
    pub fn candidates_per_node(&self) -> usize {
        self.offset_num * self.threshold_num
    }

    /// Check every count and range.
    ///
    /// The image directory is not checked here; it only matters when images
    /// are loaded from disk.
    ///
    /// # Errors
    ///
    /// | Variant                        | When                                          |
    /// |--------------------------------|-----------------------------------------------|
    /// | [`RfError::InvalidTreeCount`]  | `tree_num` is zero                            |
    /// | [`RfError::InvalidLabelCount`] | `label_num` is zero                           |
    /// | [`RfError::InvalidImageCount`] | `img_num`/`train_img_num` zero, or too many   |
    /// | [`RfError::ZeroCount`]         | a pixel, offset, threshold, leaf or worker count is zero |
    /// | [`RfError::InvalidRange`]      | a range is inverted or non-finite             |
    pub fn validate(&self) -> Result<(), RfError> {
        if self.tree_num == 0 {
            return Err(RfError::InvalidTreeCount {
                tree_num: self.tree_num,
            });
        }
        if self.label_num == 0 {
            return Err(RfError::InvalidLabelCount {
                label_num: self.label_num,
            });
        }
        if self.img_num == 0 || self.train_img_num == 0 || self.train_img_num > self.img_num {
            return Err(RfError::InvalidImageCount {
                img_num: self.img_num,
                train_img_num: self.train_img_num,
            });
        }
        let counts = [
            ("min_sample_count", self.min_sample_count),
            ("sample_pixel_num", self.sample_pixel_num),
            ("offset_num", self.offset_num),
            ("threshold_num", self.threshold_num),
            ("search_workers", self.search_workers),
        ];
        if let Some(&(name, _)) = counts.iter().find(|(_, v)| *v == 0) {
            return Err(RfError::ZeroCount { name });
        }
        self.offset_range.check("offset_range")?;
        self.threshold_range.check("threshold_range")?;
        Ok(())
    }

    /// Write the parameters as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::ParamsFormat`] | JSON encoding failed |
    /// | [`RfError::ParamsIo`] | file write failed |
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), RfError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| RfError::ParamsFormat {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, json).map_err(|e| RfError::ParamsIo {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!("training parameters saved");
        Ok(())
    }

    /// Read parameters from a JSON file and validate them.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::ParamsIo`] | file read failed |
    /// | [`RfError::ParamsFormat`] | JSON decoding failed |
    /// | any [`TrainingParams::validate`] error | decoded values are invalid |
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, RfError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| RfError::ParamsIo {
            path: path.to_path_buf(),
            source: e,
        })?;
        let params: Self = serde_json::from_str(&text).map_err(|e| RfError::ParamsFormat {
            path: path.to_path_buf(),
            source: e,
        })?;
        params.validate()?;
        Ok(params)
    }
}
