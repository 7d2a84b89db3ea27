//! CSV depth/label grid reader and writer.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::image::DepthImage;
use crate::ImageError;

/// Reads depth images stored as pairs of headerless CSV grids.
///
/// Image `i` in a directory is made of two files with identical dimensions:
/// - `{i}-depth.csv`: one row per image row, one finite depth per cell
/// - `{i}-labels.csv`: integer labels; an empty cell or a negative value
///   marks the pixel as unlabeled
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ImageError::FileNotFound`] | A grid file doesn't exist or is unreadable |
/// | [`ImageError::CsvParse`] | Malformed CSV record |
/// | [`ImageError::EmptyGrid`] | Zero rows, or a row with zero cells |
/// | [`ImageError::RaggedGrid`] | Rows of different widths |
/// | [`ImageError::InvalidValue`] | Unparseable or non-finite cell |
/// | [`ImageError::DimensionMismatch`] | Depth and label grids differ in size |
pub struct ImageReader {
    dir: PathBuf,
}

impl ImageReader {
    /// Create a reader for the given image directory.
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Path of the depth grid for image `id`.
    #[must_use]
    pub fn depth_path(&self, id: usize) -> PathBuf {
        self.dir.join(format!("{id}-depth.csv"))
    }

    /// Path of the label grid for image `id`.
    #[must_use]
    pub fn label_path(&self, id: usize) -> PathBuf {
        self.dir.join(format!("{id}-labels.csv"))
    }

    /// Read and validate image `id`.
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    pub fn read(&self, id: usize) -> Result<DepthImage, ImageError> {
        let depth_path = self.depth_path(id);
        let (width, height, depth) = read_grid(&depth_path, |raw| {
            raw.parse::<f64>().ok().filter(|d| d.is_finite())
        })?;

        let label_path = self.label_path(id);
        let (label_width, label_height, labels) = read_grid(&label_path, parse_label)?;

        if (label_width, label_height) != (width, height) {
            return Err(ImageError::DimensionMismatch {
                depth_width: width,
                depth_height: height,
                label_width,
                label_height,
            });
        }

        debug!(width, height, "image loaded");
        DepthImage::new(width, height, depth, labels)
    }
}

/// Parse a label cell: empty or negative means unlabeled.
fn parse_label(raw: &str) -> Option<Option<usize>> {
    if raw.is_empty() {
        return Some(None);
    }
    let value: i64 = raw.parse().ok()?;
    Some(usize::try_from(value).ok())
}

/// Read a rectangular, headerless CSV grid, parsing each cell with `parse`.
///
/// Returns `(width, height, row-major values)`.
fn read_grid<T>(
    path: &Path,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<(usize, usize, Vec<T>), ImageError> {
    let file = std::fs::File::open(path).map_err(|e| ImageError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;

    // flexible(true) so that our own RaggedGrid check fires instead of a
    // low-level CsvParse error.
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut width = 0;
    let mut height = 0;
    let mut values = Vec::new();

    for (row_index, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| ImageError::CsvParse {
            path: path.to_path_buf(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        })?;

        if row_index == 0 {
            width = record.len();
            if width == 0 {
                return Err(ImageError::EmptyGrid {
                    path: path.to_path_buf(),
                });
            }
        } else if record.len() != width {
            return Err(ImageError::RaggedGrid {
                path: path.to_path_buf(),
                row_index,
                expected: width,
                got: record.len(),
            });
        }

        for (col_index, raw) in record.iter().enumerate() {
            let value = parse(raw).ok_or_else(|| ImageError::InvalidValue {
                path: path.to_path_buf(),
                row_index,
                col_index,
                raw: raw.to_string(),
            })?;
            values.push(value);
        }
        height += 1;
    }

    if height == 0 {
        return Err(ImageError::EmptyGrid {
            path: path.to_path_buf(),
        });
    }

    Ok((width, height, values))
}

/// Write `image` as `{id}-depth.csv` and `{id}-labels.csv` under `dir`.
///
/// Unlabeled pixels are written as `-1`. The directory must exist.
///
/// # Errors
///
/// Returns [`ImageError::FileNotFound`] when a file cannot be created and
/// [`ImageError::CsvParse`] when the CSV writer fails.
pub fn write_image(dir: &Path, id: usize, image: &DepthImage) -> Result<(), ImageError> {
    let reader = ImageReader::new(dir);
    let width = image.width();
    let height = image.height();

    let depth_rows = (0..height).map(|y| {
        (0..width)
            .map(|x| {
                let p = crate::PixelInfo::new(x as i64, y as i64);
                image.depth_at(p).unwrap_or(0.0).to_string()
            })
            .collect::<Vec<_>>()
    });
    write_grid(&reader.depth_path(id), depth_rows)?;

    let label_rows = (0..height).map(|y| {
        (0..width)
            .map(|x| {
                let p = crate::PixelInfo::new(x as i64, y as i64);
                image.label_at(p).map_or_else(|| "-1".to_string(), |l| l.to_string())
            })
            .collect::<Vec<_>>()
    });
    write_grid(&reader.label_path(id), label_rows)
}

fn write_grid(
    path: &Path,
    rows: impl Iterator<Item = Vec<String>>,
) -> Result<(), ImageError> {
    let csv_err = |e: csv::Error| ImageError::CsvParse {
        path: path.to_path_buf(),
        offset: 0,
        source: e,
    };
    let file = std::fs::File::create(path).map_err(|e| ImageError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    for row in rows {
        wtr.write_record(&row).map_err(csv_err)?;
    }
    wtr.flush().map_err(|e| ImageError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}
