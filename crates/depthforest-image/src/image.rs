//! Depth images with per-pixel ground-truth labels.

use crate::geometry::PixelInfo;
use crate::ImageError;

/// Depth returned for probes outside the image or on missing depth.
///
/// Large and positive so that probes off the subject read as "far away".
pub const BACKGROUND_DEPTH: f64 = 1.0e6;

/// A row-major depth image with optional ground-truth labels.
///
/// `depth[y * width + x]` is the depth of pixel `(x, y)`. A depth `<= 0.0`
/// means the sensor returned no measurement. `labels[y * width + x]` is
/// `None` for pixels without ground truth.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthImage {
    width: usize,
    height: usize,
    depth: Vec<f64>,
    labels: Vec<Option<usize>>,
}

impl DepthImage {
    /// Create a validated depth image.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ImageError::ZeroDimension`] | `width` or `height` is zero |
    /// | [`ImageError::BufferLength`] | a buffer is not `width * height` long |
    /// | [`ImageError::NonFiniteDepth`] | a depth value is NaN or infinite |
    pub fn new(
        width: usize,
        height: usize,
        depth: Vec<f64>,
        labels: Vec<Option<usize>>,
    ) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::ZeroDimension { width, height });
        }
        let expected = width * height;
        if depth.len() != expected {
            return Err(ImageError::BufferLength {
                what: "depth",
                expected,
                got: depth.len(),
            });
        }
        if labels.len() != expected {
            return Err(ImageError::BufferLength {
                what: "label",
                expected,
                got: labels.len(),
            });
        }
        if let Some(i) = depth.iter().position(|d| !d.is_finite()) {
            return Err(ImageError::NonFiniteDepth {
                x: i % width,
                y: i / width,
            });
        }
        Ok(Self {
            width,
            height,
            depth,
            labels,
        })
    }

    /// Image width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, pixel: PixelInfo) -> Option<usize> {
        let x = usize::try_from(pixel.x).ok()?;
        let y = usize::try_from(pixel.y).ok()?;
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Raw depth at `pixel`, or `None` when the pixel is outside the image.
    #[must_use]
    pub fn depth_at(&self, pixel: PixelInfo) -> Option<f64> {
        self.index(pixel).map(|i| self.depth[i])
    }

    /// Depth at `pixel`, with out-of-bounds and missing measurements mapped
    /// to [`BACKGROUND_DEPTH`]. Always strictly positive.
    #[must_use]
    pub fn probe_depth(&self, pixel: PixelInfo) -> f64 {
        match self.depth_at(pixel) {
            Some(d) if d > 0.0 => d,
            _ => BACKGROUND_DEPTH,
        }
    }

    /// Ground-truth label at `pixel`, if any.
    #[must_use]
    pub fn label_at(&self, pixel: PixelInfo) -> Option<usize> {
        self.index(pixel).and_then(|i| self.labels[i])
    }

    /// All pixels carrying a ground-truth label, in row-major order.
    pub fn labeled_pixels(&self) -> impl Iterator<Item = (PixelInfo, usize)> + '_ {
        self.labels.iter().enumerate().filter_map(|(i, label)| {
            label.map(|l| {
                let pixel = PixelInfo::new((i % self.width) as i64, (i / self.width) as i64);
                (pixel, l)
            })
        })
    }

    /// Number of labeled pixels.
    #[must_use]
    pub fn labeled_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_some()).count()
    }

    /// Normalized frequency of each label among labeled pixels.
    ///
    /// Labels `>= label_num` are ignored. Returns all zeros when the image
    /// has no labeled pixels in range.
    #[must_use]
    pub fn label_frequencies(&self, label_num: usize) -> Vec<f64> {
        let mut counts = vec![0usize; label_num];
        for label in self.labels.iter().flatten() {
            if let Some(c) = counts.get_mut(*label) {
                *c += 1;
            }
        }
        let total: usize = counts.iter().sum();
        if total == 0 {
            return vec![0.0; label_num];
        }
        counts.iter().map(|&c| c as f64 / total as f64).collect()
    }

    /// Largest label present, if any pixel is labeled.
    #[must_use]
    pub fn max_label(&self) -> Option<usize> {
        self.labels.iter().flatten().copied().max()
    }
}
