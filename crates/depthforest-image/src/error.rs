//! Error types for depthforest-image.

use std::path::PathBuf;

/// Errors from depth image construction, CSV parsing, and pool loading.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// Returned when an image file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when a grid file contains zero rows or a row with zero cells.
    #[error("empty grid in {path}")]
    EmptyGrid {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when a grid row has a different number of cells than the first row.
    #[error("ragged grid in {path}: row {row_index} has {got} cells, expected {expected}")]
    RaggedGrid {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index.
        row_index: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        got: usize,
    },

    /// Returned when a cell cannot be parsed as the expected number type.
    #[error("invalid value in {path}: row {row_index}, column {col_index}, raw value \"{raw}\"")]
    InvalidValue {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index.
        row_index: usize,
        /// Zero-based column index.
        col_index: usize,
        /// The raw string value that failed to parse.
        raw: String,
    },

    /// Returned when the depth and label grids of one image disagree in size.
    #[error("label grid is {label_width}x{label_height}, depth grid is {depth_width}x{depth_height}")]
    DimensionMismatch {
        /// Depth grid width.
        depth_width: usize,
        /// Depth grid height.
        depth_height: usize,
        /// Label grid width.
        label_width: usize,
        /// Label grid height.
        label_height: usize,
    },

    /// Returned when a buffer length does not match `width * height`.
    #[error("{what} buffer has {got} values, expected {expected}")]
    BufferLength {
        /// Which buffer was wrong ("depth" or "label").
        what: &'static str,
        /// `width * height`.
        expected: usize,
        /// Actual buffer length.
        got: usize,
    },

    /// Returned when an image has zero width or zero height.
    #[error("image dimensions must be non-zero, got {width}x{height}")]
    ZeroDimension {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },

    /// Returned when a depth value is NaN or infinite.
    #[error("non-finite depth at pixel ({x}, {y})")]
    NonFiniteDepth {
        /// Column of the offending pixel.
        x: usize,
        /// Row of the offending pixel.
        y: usize,
    },

    /// Returned when an image pool is asked to load zero images.
    #[error("image pool must contain at least one image")]
    EmptyPool,
}
