//! Flat, reorderable training-sample store.

use std::ops::Range;

use crate::geometry::PixelInfo;

/// One labeled training pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sample {
    /// Id of the source image in the [`ImagePool`](crate::ImagePool).
    pub image_id: usize,
    /// Pixel location in that image.
    pub pixel: PixelInfo,
    /// Ground-truth label.
    pub label: usize,
}

impl Sample {
    /// Create a sample.
    #[must_use]
    pub fn new(image_id: usize, pixel: PixelInfo, label: usize) -> Self {
        Self {
            image_id,
            pixel,
            label,
        }
    }
}

/// Contiguous sample sequence.
///
/// Tree induction never copies samples: it narrows index ranges and
/// reorders samples inside a range with [`TrainData::swap`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainData {
    samples: Vec<Sample>,
}

impl TrainData {
    /// Create an empty store with room for `capacity` samples.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    /// Append a sample.
    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Sample {
        self.samples[index]
    }

    /// Samples in `range`.
    #[must_use]
    pub fn samples(&self, range: Range<usize>) -> &[Sample] {
        &self.samples[range]
    }

    /// All samples.
    #[must_use]
    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }

    /// Exchange the samples at `i` and `j`.
    pub fn swap(&mut self, i: usize, j: usize) {
        self.samples.swap(i, j);
    }
}

impl From<Vec<Sample>> for TrainData {
    fn from(samples: Vec<Sample>) -> Self {
        Self { samples }
    }
}

impl FromIterator<Sample> for TrainData {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}
