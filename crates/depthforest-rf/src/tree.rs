use std::ops::Range;

use depthforest_image::{DepthImage, ImagePool, PixelInfo, TrainData};
use rand::Rng;
use tracing::{debug, instrument, trace};

use crate::config::TrainingParams;
use crate::gain::{entropy, label_distribution};
use crate::node::{Node, TreeSummary};
use crate::search::search_node;
use crate::split::{Side, SplitCandidate};

/// A trained depth decision tree.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    pub(crate) root: Node,
    pub(crate) label_num: usize,
}

impl DecisionTree {
    /// Wrap an existing root node.
    #[must_use]
    pub fn from_root(root: Node, label_num: usize) -> Self {
        Self { root, label_num }
    }

    /// Grow a tree over every sample in `data`.
    ///
    /// `data` is reordered in place; after training each leaf's samples are
    /// contiguous. `data` must not be empty.
    #[instrument(skip_all, fields(n_samples = data.len()))]
    pub(crate) fn fit(
        params: &TrainingParams,
        data: &mut TrainData,
        pool: &ImagePool,
        rng: &mut impl Rng,
    ) -> Self {
        debug_assert!(!data.is_empty(), "cannot grow a tree from zero samples");
        let full = 0..data.len();
        let mut builder = TreeBuilder {
            params,
            pool,
            data,
            rng,
        };
        let root = builder.build(full, 0);
        let summary = root.summary();
        debug!(
            n_nodes = summary.n_nodes,
            n_leaves = summary.n_leaves,
            max_depth = summary.max_depth,
            "decision tree built"
        );
        Self {
            root,
            label_num: params.label_num,
        }
    }

    /// Return the root node.
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Return the number of labels.
    #[must_use]
    pub fn label_num(&self) -> usize {
        self.label_num
    }

    /// Descend to the leaf reached by `pixel` of `image` and return its
    /// label distribution.
    #[must_use]
    pub fn predict_distribution(&self, image: &DepthImage, pixel: PixelInfo) -> &[f64] {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { distribution, .. } => return distribution,
                Node::Split {
                    candidate,
                    left,
                    right,
                    ..
                } => {
                    node = match candidate.side_at(image, pixel) {
                        Side::Left => left,
                        Side::Right => right,
                    };
                }
            }
        }
    }

    /// Node count, leaf count, and deepest leaf.
    #[must_use]
    pub fn summary(&self) -> TreeSummary {
        self.root.summary()
    }
}

/// Recursive induction state for one tree.
///
/// Search borrows `data` immutably; partitioning borrows it mutably only
/// after the search has joined.
struct TreeBuilder<'a, R> {
    params: &'a TrainingParams,
    pool: &'a ImagePool,
    data: &'a mut TrainData,
    rng: &'a mut R,
}

impl<R: Rng> TreeBuilder<'_, R> {
    fn build(&mut self, range: Range<usize>, depth: usize) -> Node {
        let samples = self.data.samples(range.clone());
        let distribution = label_distribution(samples, self.params.label_num);
        let parent_entropy = entropy(&distribution);

        if test_node(self.params, range.len(), depth, parent_entropy) {
            return Node::Leaf {
                depth,
                distribution,
            };
        }

        let Some(best) = search_node(self.params, parent_entropy, samples, self.pool, self.rng)
        else {
            return Node::Leaf {
                depth,
                distribution,
            };
        };

        let mid = partition(self.data, range.clone(), &best.candidate, self.pool);
        if mid == range.start || mid == range.end {
            trace!(depth, n_samples = range.len(), "degenerate split, making leaf");
            return Node::Leaf {
                depth,
                distribution,
            };
        }

        trace!(
            depth,
            n_left = mid - range.start,
            n_right = range.end - mid,
            gain = best.gain,
            "node split"
        );

        let left = self.build(range.start..mid, depth + 1);
        let right = self.build(mid..range.end, depth + 1);
        Node::Split {
            depth,
            candidate: best.candidate,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

/// Whether a node must stay a leaf.
///
/// A node stops growing at `max_depth`, when it holds `min_sample_count`
/// samples or fewer, or when its label set is pure.
pub(crate) fn test_node(
    params: &TrainingParams,
    n_samples: usize,
    depth: usize,
    entropy: f64,
) -> bool {
    depth >= params.max_depth || n_samples <= params.min_sample_count || entropy == 0.0
}

/// Reorder `range` of `data` in place so every sample routed left precedes
/// every sample routed right, and return the first right index.
///
/// Each sample is classified exactly once. Order within a side is
/// unspecified.
pub(crate) fn partition(
    data: &mut TrainData,
    range: Range<usize>,
    candidate: &SplitCandidate,
    pool: &ImagePool,
) -> usize {
    let mut lo = range.start;
    let mut hi = range.end;
    while lo < hi {
        if candidate.classify(pool, &data.get(lo)) == Side::Left {
            lo += 1;
        } else {
            hi -= 1;
            data.swap(lo, hi);
        }
    }
    lo
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{DecisionTree, partition, test_node};
    use crate::config::{NumRange, TrainingParams};
    use crate::fixtures::{ramp, separable_params, separable_pool};
    use crate::node::Node;
    use crate::split::{Side, SplitCandidate};
    use depthforest_image::{ImagePool, Offset, PixelInfo, Sample, TrainData};

    /// Every labeled pixel of every pool image, in image order.
    fn all_samples(pool: &ImagePool) -> TrainData {
        pool.iter()
            .enumerate()
            .flat_map(|(id, img)| {
                img.labeled_pixels()
                    .map(move |(p, l)| Sample::new(id, p, l))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Every third sample, interleaving the two images.
    fn interleaved(pool: &ImagePool) -> TrainData {
        let all = all_samples(pool);
        let half = all.len() / 2;
        (0..half)
            .step_by(3)
            .flat_map(|i| [all.get(i), all.get(half + i)])
            .collect()
    }

    fn multiset(data: &TrainData) -> Vec<(usize, i64, i64, usize)> {
        let mut v: Vec<_> = data
            .as_slice()
            .iter()
            .map(|s| (s.image_id, s.pixel.x, s.pixel.y, s.label))
            .collect();
        v.sort_unstable();
        v
    }

    // --- test_node ---

    #[test]
    fn stop_conditions() {
        let params = TrainingParams::new(1)
            .unwrap()
            .with_max_depth(3)
            .with_min_sample_count(5);
        assert!(test_node(&params, 100, 3, 0.8), "depth limit");
        assert!(test_node(&params, 5, 0, 0.8), "too few samples");
        assert!(test_node(&params, 100, 0, 0.0), "pure");
        assert!(!test_node(&params, 6, 2, 0.8));
    }

    // --- partition ---

    #[test]
    fn partition_is_a_permutation_with_left_first() {
        let pool = separable_pool();
        let mut data = interleaved(&pool);
        let before = multiset(&data);
        let candidate =
            SplitCandidate::new(Offset::new(9.0, 0.0), Offset::new(-9.0, 0.0), 0.0);

        let range = 4..data.len() - 3;
        let head: Vec<Sample> = data.samples(0..4).to_vec();
        let tail: Vec<Sample> = data.samples(range.end..data.len()).to_vec();
        let mid = partition(&mut data, range.clone(), &candidate, &pool);

        assert_eq!(multiset(&data), before);
        assert_eq!(data.samples(0..4), head.as_slice(), "outside range untouched");
        assert_eq!(data.samples(range.end..data.len()), tail.as_slice());
        for i in range.start..mid {
            assert_eq!(candidate.classify(&pool, &data.get(i)), Side::Left);
        }
        for i in mid..range.end {
            assert_eq!(candidate.classify(&pool, &data.get(i)), Side::Right);
        }
        assert!(mid > range.start && mid < range.end);
    }

    #[test]
    fn partition_all_one_side() {
        let pool = separable_pool();
        let mut data = interleaved(&pool);
        let n = data.len();
        // Equal offsets give a zero feature everywhere.
        let left = SplitCandidate::new(Offset::default(), Offset::default(), 1.0);
        assert_eq!(partition(&mut data, 0..n, &left, &pool), n);
        let right = SplitCandidate::new(Offset::default(), Offset::default(), -1.0);
        assert_eq!(partition(&mut data, 0..n, &right, &pool), 0);
    }

    #[test]
    fn partition_empty_range() {
        let pool = separable_pool();
        let mut data = interleaved(&pool);
        let c = SplitCandidate::new(Offset::default(), Offset::default(), 1.0);
        assert_eq!(partition(&mut data, 3..3, &c, &pool), 3);
    }

    // --- induction ---

    #[test]
    fn separable_data_gives_two_leaves() {
        let pool = separable_pool();
        let mut data = interleaved(&pool);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let tree = DecisionTree::fit(&separable_params(1), &mut data, &pool, &mut rng);

        let summary = tree.summary();
        assert_eq!(summary.n_leaves, 2);
        assert_eq!(summary.n_nodes, 3);

        let Node::Split { left, right, .. } = tree.root() else {
            panic!("root should split");
        };
        for child in [left, right] {
            let Node::Leaf { distribution, depth } = child.as_ref() else {
                panic!("children should be leaves");
            };
            assert_eq!(*depth, 1);
            assert!(distribution.contains(&1.0), "child not pure: {distribution:?}");
        }
    }

    #[test]
    fn leaves_respect_max_depth() {
        // Mixed labels inside each image force deep trees.
        let pool = ImagePool::from_images(vec![
            ramp(true, |x, y| (x + y) % 3),
            ramp(false, |x, _| x % 3),
        ]);
        for max_depth in [0, 1, 2, 4] {
            let params = separable_params(1)
                .with_label_num(3)
                .with_max_depth(max_depth)
                .with_threshold_num(5)
                .with_threshold_range(NumRange::new(-0.05, 0.05));
            let mut data = all_samples(&pool);
            let mut rng = ChaCha8Rng::seed_from_u64(7);
            let tree = DecisionTree::fit(&params, &mut data, &pool, &mut rng);
            assert!(tree.root().preorder().all(|n| n.depth() <= max_depth));
            assert!(tree.summary().max_depth <= max_depth);
        }
    }

    #[test]
    fn zero_max_depth_gives_root_leaf() {
        let pool = separable_pool();
        let mut data = interleaved(&pool);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let params = separable_params(1).with_max_depth(0);
        let tree = DecisionTree::fit(&params, &mut data, &pool, &mut rng);
        assert!(tree.root().is_leaf());
        assert_eq!(tree.summary().n_nodes, 1);
    }

    #[test]
    fn degenerate_candidates_force_a_leaf() {
        let pool = separable_pool();
        let mut data = interleaved(&pool);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        // Zero offsets and a positive threshold send everything left.
        let params = separable_params(1)
            .with_offset_range(NumRange::new(0.0, 0.0))
            .with_threshold_range(NumRange::new(1.0, 1.0));
        let tree = DecisionTree::fit(&params, &mut data, &pool, &mut rng);
        let Node::Leaf { distribution, .. } = tree.root() else {
            panic!("degenerate split must become a leaf");
        };
        assert!((distribution[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn pure_data_gives_root_leaf() {
        let pool = separable_pool();
        let mut data: TrainData = all_samples(&pool)
            .as_slice()
            .iter()
            .copied()
            .filter(|s| s.label == 1)
            .collect();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let tree = DecisionTree::fit(&separable_params(1), &mut data, &pool, &mut rng);
        assert_eq!(
            tree.root(),
            &Node::Leaf {
                depth: 0,
                distribution: vec![0.0, 1.0]
            }
        );
    }

    #[test]
    fn min_sample_count_stops_growth() {
        let pool = separable_pool();
        let mut data = interleaved(&pool);
        let n = data.len();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let params = separable_params(1).with_min_sample_count(n);
        let tree = DecisionTree::fit(&params, &mut data, &pool, &mut rng);
        assert!(tree.root().is_leaf());
    }

    #[test]
    fn predict_distribution_follows_splits() {
        let pool = separable_pool();
        let mut data = interleaved(&pool);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let tree = DecisionTree::fit(&separable_params(1), &mut data, &pool, &mut rng);
        let pixel = PixelInfo::new(30, 15);
        assert_eq!(tree.predict_distribution(pool.get(0), pixel), &[1.0, 0.0]);
        assert_eq!(tree.predict_distribution(pool.get(1), pixel), &[0.0, 1.0]);
    }

    #[test]
    fn same_seed_same_tree() {
        let pool = separable_pool();
        let params = separable_params(1).with_offset_num(5).with_threshold_num(3);
        let grow = || {
            let mut data = interleaved(&pool);
            let mut rng = ChaCha8Rng::seed_from_u64(5);
            DecisionTree::fit(&params, &mut data, &pool, &mut rng)
        };
        assert_eq!(grow(), grow());
    }
}
