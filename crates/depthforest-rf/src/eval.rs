//! Scoring a forest against ground-truth labels.

use depthforest_image::DepthImage;
use tracing::{info, instrument};

use crate::confusion::ConfusionMatrix;
use crate::error::RfError;
use crate::forest::RandomForest;

impl RandomForest {
    /// Fraction of the labeled pixels of `image` whose predicted label
    /// matches the ground truth.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::NoLabeledPixels`] when `image` has no labeled pixel.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn test_classification(&self, image: &DepthImage) -> Result<f64, RfError> {
        let mut total = 0usize;
        let mut correct = 0usize;
        for (pixel, truth) in image.labeled_pixels() {
            total += 1;
            if self.predict(image, pixel).label == truth {
                correct += 1;
            }
        }
        if total == 0 {
            return Err(RfError::NoLabeledPixels);
        }
        let accuracy = correct as f64 / total as f64;
        info!(n_pixels = total, correct, accuracy, "image classified");
        Ok(accuracy)
    }

    /// Confusion matrix of the labeled pixels of `image`.
    ///
    /// The matrix accuracy equals [`RandomForest::test_classification`].
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::NoLabeledPixels`] | `image` has no labeled pixel |
    /// | [`RfError::UnknownLabel`] | a ground-truth label is `>= label_num` |
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn evaluate_image(&self, image: &DepthImage) -> Result<ConfusionMatrix, RfError> {
        let pixels: Vec<_> = image.labeled_pixels().collect();
        let positions: Vec<_> = pixels.iter().map(|&(pixel, _)| pixel).collect();
        let predictions = self.predict_pixels(image, &positions);
        ConfusionMatrix::from_pairs(
            pixels
                .iter()
                .zip(&predictions)
                .map(|(&(_, truth), prediction)| (truth, prediction.label)),
            self.label_num,
        )
    }
}
