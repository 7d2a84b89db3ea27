//! Pixel prediction for the depth forest.

use depthforest_image::{DepthImage, PixelInfo};
use rayon::prelude::*;

use crate::forest::RandomForest;

/// The most probable label of a pixel and its averaged probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted label.
    pub label: usize,
    /// Averaged probability of `label` over all trees.
    pub probability: f64,
}

impl Prediction {
    /// First label attaining the maximum of `distribution`.
    pub(crate) fn from_distribution(distribution: &[f64]) -> Self {
        let mut best = Prediction {
            label: 0,
            probability: f64::NEG_INFINITY,
        };
        for (label, &probability) in distribution.iter().enumerate() {
            if probability > best.probability {
                best = Prediction { label, probability };
            }
        }
        best
    }
}

impl RandomForest {
    /// Average the leaf distributions reached by `pixel` in every tree.
    #[must_use]
    pub fn predict_distribution(&self, image: &DepthImage, pixel: PixelInfo) -> Vec<f64> {
        let mut avg = vec![0.0f64; self.label_num];
        for tree in &self.trees {
            let distribution = tree.predict_distribution(image, pixel);
            for (i, p) in distribution.iter().enumerate() {
                avg[i] += p;
            }
        }
        let n = self.trees.len() as f64;
        avg.iter_mut().for_each(|v| *v /= n);
        avg
    }

    /// Predict the label of `pixel`.
    ///
    /// Ties between labels go to the lowest label.
    #[must_use]
    pub fn predict(&self, image: &DepthImage, pixel: PixelInfo) -> Prediction {
        Prediction::from_distribution(&self.predict_distribution(image, pixel))
    }

    /// Predict several pixels of one image in parallel, preserving order.
    #[must_use]
    pub fn predict_pixels(&self, image: &DepthImage, pixels: &[PixelInfo]) -> Vec<Prediction> {
        pixels
            .par_iter()
            .map(|&pixel| self.predict(image, pixel))
            .collect()
    }
}
