//! Label distributions, Shannon entropy, and information gain.

use depthforest_image::{ImagePool, Sample};

use crate::split::{Side, SplitCandidate};

/// Count label occurrences. Labels must be `< label_num`.
#[must_use]
pub(crate) fn label_counts(samples: &[Sample], label_num: usize) -> Vec<usize> {
    let mut counts = vec![0usize; label_num];
    for s in samples {
        counts[s.label] += 1;
    }
    counts
}

/// Normalize counts into probabilities.
fn normalize(counts: &[usize], total: usize) -> Vec<f64> {
    let n = total as f64;
    counts.iter().map(|&c| c as f64 / n).collect()
}

/// Normalized label distribution of `samples`.
///
/// Callers never request the distribution of an empty range.
#[must_use]
pub fn label_distribution(samples: &[Sample], label_num: usize) -> Vec<f64> {
    debug_assert!(!samples.is_empty(), "label distribution of an empty range");
    normalize(&label_counts(samples, label_num), samples.len())
}

/// Shannon entropy in bits: `-Σ p·log2(p)` over labels with `p > 0`.
///
/// Lies in `[0, log2(distribution.len())]`.
#[must_use]
pub fn entropy(distribution: &[f64]) -> f64 {
    -distribution
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| p * p.log2())
        .sum::<f64>()
}

fn entropy_of_counts(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    entropy(&normalize(counts, total))
}

/// Information gain of splitting `samples` with `candidate`.
///
/// The split is evaluated without moving any sample. Returns exactly `0.0`
/// when either side would be empty, and never a negative value.
#[must_use]
pub fn information_gain(
    candidate: &SplitCandidate,
    parent_entropy: f64,
    samples: &[Sample],
    pool: &ImagePool,
    label_num: usize,
) -> f64 {
    let mut left = vec![0usize; label_num];
    let mut right = vec![0usize; label_num];
    for s in samples {
        match candidate.classify(pool, s) {
            Side::Left => left[s.label] += 1,
            Side::Right => right[s.label] += 1,
        }
    }

    let n_left: usize = left.iter().sum();
    let n_right: usize = right.iter().sum();
    if n_left == 0 || n_right == 0 {
        return 0.0;
    }

    let n = samples.len() as f64;
    let gain = parent_entropy
        - (n_left as f64 / n) * entropy_of_counts(&left, n_left)
        - (n_right as f64 / n) * entropy_of_counts(&right, n_right);
    gain.max(0.0)
}
