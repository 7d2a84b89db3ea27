use std::path::PathBuf;

use depthforest_image::ImageError;

/// Errors from depth forest training, evaluation, and persistence.
#[derive(Debug, thiserror::Error)]
pub enum RfError {
    /// Returned when tree_num is zero.
    #[error("tree_num must be at least 1, got {tree_num}")]
    InvalidTreeCount {
        /// The invalid tree_num value provided.
        tree_num: usize,
    },

    /// Returned when label_num is zero.
    #[error("label_num must be at least 1, got {label_num}")]
    InvalidLabelCount {
        /// The invalid label_num value provided.
        label_num: usize,
    },

    /// Returned when img_num or train_img_num is zero, or train_img_num exceeds img_num.
    #[error("train_img_num must be in [1, img_num = {img_num}], got {train_img_num}")]
    InvalidImageCount {
        /// Total number of images available.
        img_num: usize,
        /// Number of images requested per tree.
        train_img_num: usize,
    },

    /// Returned when the image directory path is empty.
    #[error("image directory path is empty")]
    EmptyImageDir,

    /// Returned when a per-node or per-image count parameter is zero.
    #[error("{name} must be at least 1, got 0")]
    ZeroCount {
        /// Name of the offending parameter.
        name: &'static str,
    },

    /// Returned when a random generation range is inverted or non-finite.
    #[error("{name} must be a finite range with start <= end, got [{start}, {end}]")]
    InvalidRange {
        /// Name of the offending parameter.
        name: &'static str,
        /// Range start.
        start: f64,
        /// Range end.
        end: f64,
    },

    /// Returned when a training pixel carries a label outside `[0, label_num)`.
    #[error("image {image_id} has label {label}, but label_num is {label_num}")]
    LabelOutOfRange {
        /// Image containing the offending pixel.
        image_id: usize,
        /// The offending label.
        label: usize,
        /// Configured number of labels.
        label_num: usize,
    },

    /// Returned when a tree's sampled training set has no labeled pixel.
    #[error("tree {tree_id} sampled zero labeled pixels")]
    EmptyTrainingSet {
        /// Index of the tree being trained.
        tree_id: usize,
    },

    /// Returned when the image pool has fewer images than img_num.
    #[error("image pool has {available} images, img_num requires {img_num}")]
    PoolTooSmall {
        /// Images in the pool.
        available: usize,
        /// Configured image count.
        img_num: usize,
    },

    /// Returned when an evaluated image has no ground-truth label at all.
    #[error("image has no labeled pixels")]
    NoLabeledPixels,

    /// Returned when an evaluated image carries a label the forest does not know.
    #[error("label {label} is outside [0, {label_num})")]
    UnknownLabel {
        /// The offending label.
        label: usize,
        /// Number of labels the forest was trained with.
        label_num: usize,
    },

    /// Returned when an image cannot be loaded.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Returned when creating the forest directory or writing a tree file fails.
    #[error("failed to write tree to {path}")]
    WriteTree {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading a tree file fails.
    #[error("failed to read tree from {path}")]
    ReadTree {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a tree record cannot be decoded.
    #[error("malformed tree record in {path} at line {line}: {reason}")]
    MalformedTree {
        /// Path to the tree file.
        path: PathBuf,
        /// One-based line number of the offending record.
        line: usize,
        /// Human-readable description of the problem.
        reason: String,
    },

    /// Returned when a tree file ends while split nodes still wait for children.
    #[error("tree file {path} ended with {pending} split node(s) missing children")]
    UnexpectedEndOfTree {
        /// Path to the tree file.
        path: PathBuf,
        /// Number of unfinished split nodes.
        pending: usize,
    },

    /// Returned when a tree file contains no record.
    #[error("tree file {path} is empty")]
    EmptyTree {
        /// Path to the tree file.
        path: PathBuf,
    },

    /// Returned when a training parameter file cannot be read or written.
    #[error("failed to access training parameters at {path}")]
    ParamsIo {
        /// Path to the parameter file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a training parameter file is not valid JSON for [`TrainingParams`](crate::TrainingParams).
    #[error("invalid training parameters in {path}")]
    ParamsFormat {
        /// Path to the parameter file.
        path: PathBuf,
        /// The underlying serde_json error.
        source: serde_json::Error,
    },
}
