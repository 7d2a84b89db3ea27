//! Per-pixel confusion matrix and per-label metrics.

use std::fmt;

use crate::error::RfError;

/// Pixel confusion matrix over `label_num` labels.
///
/// `counts[truth][predicted]` counts pixels with ground truth `truth` that
/// were classified as `predicted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    counts: Vec<Vec<usize>>,
    label_num: usize,
}

/// Precision, recall, and F1 for one label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMetrics {
    /// The label.
    pub label: usize,
    /// TP / (TP + FP), or 0.0 when the label was never predicted.
    pub precision: f64,
    /// TP / (TP + FN), or 0.0 when the label never occurs.
    pub recall: f64,
    /// Harmonic mean of precision and recall, or 0.0 when both are zero.
    pub f1: f64,
    /// Ground-truth pixels carrying this label.
    pub support: usize,
}

impl ConfusionMatrix {
    /// Build a matrix from `(truth, predicted)` pairs.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::NoLabeledPixels`] | `pairs` is empty |
    /// | [`RfError::UnknownLabel`] | a label is `>= label_num` |
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (usize, usize)>,
        label_num: usize,
    ) -> Result<Self, RfError> {
        let mut counts = vec![vec![0usize; label_num]; label_num];
        let mut total = 0usize;
        for (truth, predicted) in pairs {
            if let Some(&label) = [truth, predicted].iter().find(|&&l| l >= label_num) {
                return Err(RfError::UnknownLabel { label, label_num });
            }
            counts[truth][predicted] += 1;
            total += 1;
        }
        if total == 0 {
            return Err(RfError::NoLabeledPixels);
        }
        Ok(Self { counts, label_num })
    }

    /// Total number of pixels.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Fraction of pixels whose prediction matches the ground truth.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..self.label_num).map(|l| self.counts[l][l]).sum();
        correct as f64 / self.total() as f64
    }

    /// Per-label precision, recall, F1, and support.
    #[must_use]
    pub fn label_metrics(&self) -> Vec<LabelMetrics> {
        (0..self.label_num)
            .map(|label| {
                let tp = self.counts[label][label];
                let predicted: usize = self.counts.iter().map(|row| row[label]).sum();
                let support: usize = self.counts[label].iter().sum();
                let ratio = |num: usize, den: usize| {
                    if den == 0 { 0.0 } else { num as f64 / den as f64 }
                };
                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };
                LabelMetrics {
                    label,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }

    /// Return the matrix rows, indexed by ground-truth label.
    #[must_use]
    pub fn as_rows(&self) -> &[Vec<usize>] {
        &self.counts
    }

    /// Return the number of labels.
    #[must_use]
    pub fn label_num(&self) -> usize {
        self.label_num
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8}", "")?;
        for j in 0..self.label_num {
            write!(f, " pred_{j:>3}")?;
        }
        writeln!(f)?;

        for (i, row) in self.counts.iter().enumerate() {
            write!(f, "true_{i:>3}")?;
            for val in row {
                write!(f, " {val:>8}")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
