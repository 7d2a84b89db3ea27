use depthforest_image::{DepthImage, ImagePool, Offset, PixelInfo, Sample};

/// Which child a sample is routed to by a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Feature strictly below the threshold.
    Left,
    /// Feature at or above the threshold.
    Right,
}

/// A binary depth-difference test: two probe offsets and a threshold.
///
/// The feature for pixel `x` with depth `d(x)` is
/// `d(x + u / d(x)) - d(x + v / d(x))`. Dividing the offsets by the pixel's
/// own depth makes the test invariant to the subject's distance from the
/// camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitCandidate {
    /// First probe offset.
    pub u: Offset,
    /// Second probe offset.
    pub v: Offset,
    /// Samples with a feature below this value go left.
    pub threshold: f64,
}

impl SplitCandidate {
    /// Create a split candidate.
    #[must_use]
    pub fn new(u: Offset, v: Offset, threshold: f64) -> Self {
        Self { u, v, threshold }
    }

    /// Depth-difference feature of `pixel` in `image`.
    #[must_use]
    pub fn feature_at(&self, image: &DepthImage, pixel: PixelInfo) -> f64 {
        let depth = image.probe_depth(pixel);
        let a = image.probe_depth(pixel.offset_by(self.u, depth));
        let b = image.probe_depth(pixel.offset_by(self.v, depth));
        a - b
    }

    /// Depth-difference feature of a training sample.
    #[must_use]
    pub fn feature(&self, pool: &ImagePool, sample: &Sample) -> f64 {
        self.feature_at(pool.get(sample.image_id), sample.pixel)
    }

    /// Route `pixel` of `image`.
    #[must_use]
    pub fn side_at(&self, image: &DepthImage, pixel: PixelInfo) -> Side {
        if self.feature_at(image, pixel) < self.threshold {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Route a training sample.
    #[must_use]
    pub fn classify(&self, pool: &ImagePool, sample: &Sample) -> Side {
        self.side_at(pool.get(sample.image_id), sample.pixel)
    }
}
