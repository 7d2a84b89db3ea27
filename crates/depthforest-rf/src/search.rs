//! Randomized split search with fork-join evaluation.

use std::ops::Range;

use depthforest_image::{ImagePool, Offset, Sample};
use rand::Rng;
use rayon::prelude::*;
use tracing::trace;

use crate::config::{NumRange, TrainingParams};
use crate::gain::information_gain;
use crate::split::SplitCandidate;

/// The best candidate found by a split search, with its information gain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestSplit {
    /// Winning candidate.
    pub candidate: SplitCandidate,
    /// Its information gain over the searched range.
    pub gain: f64,
}

fn draw(range: NumRange, rng: &mut impl Rng) -> f64 {
    rng.gen_range(range.start..=range.end)
}

fn draw_offset(range: NumRange, rng: &mut impl Rng) -> Offset {
    let dx = draw(range, rng);
    let dy = draw(range, rng);
    Offset::new(dx, dy)
}

/// Generate `offset_num × threshold_num` candidates in a fixed order.
///
/// For each offset pair, `threshold_num` thresholds are drawn. All draws come
/// from `rng` sequentially, so the list is reproducible for a given seed.
pub(crate) fn generate_candidates(
    params: &TrainingParams,
    rng: &mut impl Rng,
) -> Vec<SplitCandidate> {
    let mut candidates = Vec::with_capacity(params.candidates_per_node());
    for _ in 0..params.offset_num {
        let u = draw_offset(params.offset_range, rng);
        let v = draw_offset(params.offset_range, rng);
        for _ in 0..params.threshold_num {
            let threshold = draw(params.threshold_range, rng);
            candidates.push(SplitCandidate::new(u, v, threshold));
        }
    }
    candidates
}

/// First maximum of a non-empty batch. Later candidates must be strictly
/// better to win.
fn best_in_batch(
    batch: &[SplitCandidate],
    parent_entropy: f64,
    samples: &[Sample],
    pool: &ImagePool,
    label_num: usize,
) -> Option<BestSplit> {
    let mut best: Option<BestSplit> = None;
    for candidate in batch {
        let gain = information_gain(candidate, parent_entropy, samples, pool, label_num);
        if best.is_none_or(|b| gain > b.gain) {
            best = Some(BestSplit {
                candidate: *candidate,
                gain,
            });
        }
    }
    best
}

/// Cut `0..n` into `min(workers, n)` contiguous, non-empty batches whose
/// sizes differ by at most one. The first `n % batches` batches are larger.
pub(crate) fn batch_ranges(n: usize, workers: usize) -> Vec<Range<usize>> {
    let batches = workers.clamp(1, n.max(1));
    let (base, extra) = (n / batches, n % batches);
    let mut start = 0;
    (0..batches)
        .map(|i| {
            let end = start + base + usize::from(i < extra);
            let range = start..end;
            start = end;
            range
        })
        .collect()
}

/// Evaluate `candidates` over `samples` in `workers` parallel batches and
/// return the candidate with the highest information gain.
///
/// Candidates are cut into `min(workers, candidates.len())` contiguous
/// batches. Each batch reports exactly one local winner; winners are then
/// reduced in batch order, so among equal gains the earliest generated
/// candidate wins regardless of thread scheduling.
///
/// Returns `None` only when `candidates` is empty.
pub fn find_best_split(
    candidates: &[SplitCandidate],
    parent_entropy: f64,
    samples: &[Sample],
    pool: &ImagePool,
    label_num: usize,
    workers: usize,
) -> Option<BestSplit> {
    if candidates.is_empty() {
        return None;
    }
    let winners: Vec<BestSplit> = batch_ranges(candidates.len(), workers)
        .into_par_iter()
        .map(|range| {
            best_in_batch(&candidates[range], parent_entropy, samples, pool, label_num)
                .unwrap_or_else(|| unreachable!("search batches are never empty"))
        })
        .collect();

    trace!(n_batches = winners.len(), "split search batches joined");

    winners.into_iter().reduce(|best, next| if next.gain > best.gain { next } else { best })
}

/// Generate candidates for one node and search them.
pub(crate) fn search_node(
    params: &TrainingParams,
    parent_entropy: f64,
    samples: &[Sample],
    pool: &ImagePool,
    rng: &mut impl Rng,
) -> Option<BestSplit> {
    let candidates = generate_candidates(params, rng);
    find_best_split(
        &candidates,
        parent_entropy,
        samples,
        pool,
        params.label_num,
        params.search_workers,
    )
}
