//! Depth forest training with parallel tree construction.

use depthforest_image::{ImagePool, Sample, TrainData};
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::config::TrainingParams;
use crate::error::RfError;
use crate::node::TreeSummary;
use crate::tree::DecisionTree;

/// A trained depth forest: an ordered list of trees averaged at inference.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) label_num: usize,
    pub(crate) params: Option<TrainingParams>,
}

impl RandomForest {
    /// Load `img_num` images from `params.img_dir()` and train a forest on them.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | any configuration variant | [`TrainingParams::validate`] fails |
    /// | [`RfError::EmptyImageDir`] | `img_dir` is empty |
    /// | [`RfError::Image`] | an image file is missing or malformed |
    /// | data variants | see [`RandomForest::train_with_pool`] |
    #[instrument(skip_all, fields(img_dir = %params.img_dir.display()))]
    pub fn train(params: &TrainingParams) -> Result<Self, RfError> {
        params.validate()?;
        if params.img_dir.as_os_str().is_empty() {
            return Err(RfError::EmptyImageDir);
        }
        let pool = ImagePool::load(&params.img_dir, params.img_num)?;
        Self::train_with_pool(params, &pool)
    }

    /// Train a forest on images already in memory.
    ///
    /// Images `0..img_num` of `pool` are eligible for sampling. Each tree draws
    /// `train_img_num` distinct images and up to `sample_pixel_num` distinct
    /// labeled pixels per image, then grows over its own sample set. Trees are
    /// trained in parallel; the result depends only on `params`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | any configuration variant | [`TrainingParams::validate`] fails |
    /// | [`RfError::PoolTooSmall`] | `pool.len() < img_num` |
    /// | [`RfError::LabelOutOfRange`] | an eligible image has a label `>= label_num` |
    /// | [`RfError::EmptyTrainingSet`] | a tree sampled no labeled pixel |
    #[instrument(skip_all, fields(tree_num = params.tree_num, img_num = params.img_num))]
    pub fn train_with_pool(params: &TrainingParams, pool: &ImagePool) -> Result<Self, RfError> {
        params.validate()?;
        if pool.len() < params.img_num {
            return Err(RfError::PoolTooSmall {
                available: pool.len(),
                img_num: params.img_num,
            });
        }
        for image_id in 0..params.img_num {
            if let Some(label) = pool
                .get(image_id)
                .max_label()
                .filter(|&l| l >= params.label_num)
            {
                return Err(RfError::LabelOutOfRange {
                    image_id,
                    label,
                    label_num: params.label_num,
                });
            }
        }

        info!(
            tree_num = params.tree_num,
            label_num = params.label_num,
            max_depth = params.max_depth,
            candidates_per_node = params.candidates_per_node(),
            "training depth forest"
        );

        // Generate per-tree seeds from master RNG.
        let mut master_rng = ChaCha8Rng::seed_from_u64(params.seed);
        let tree_seeds: Vec<u64> = (0..params.tree_num).map(|_| master_rng.r#gen()).collect();

        let trees: Vec<DecisionTree> = tree_seeds
            .into_par_iter()
            .enumerate()
            .map(|(tree_id, seed)| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let mut data = sample_tree_data(params, pool, &mut rng);
                if data.is_empty() {
                    return Err(RfError::EmptyTrainingSet { tree_id });
                }
                debug!(tree_id, n_samples = data.len(), "tree samples drawn");
                Ok(DecisionTree::fit(params, &mut data, pool, &mut rng))
            })
            .collect::<Result<_, _>>()?;

        let forest = Self {
            trees,
            label_num: params.label_num,
            params: Some(params.clone()),
        };

        let total_nodes: usize = forest.tree_summaries().iter().map(|s| s.n_nodes).sum();
        info!(n_trees = forest.n_trees(), total_nodes, "depth forest training complete");

        Ok(forest)
    }

    /// Return the trees in training order.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return the number of labels.
    #[must_use]
    pub fn label_num(&self) -> usize {
        self.label_num
    }

    /// Parameters the forest was trained with, or `None` for a loaded forest.
    #[must_use]
    pub fn params(&self) -> Option<&TrainingParams> {
        self.params.as_ref()
    }

    /// Shape statistics of every tree, in tree order.
    #[must_use]
    pub fn tree_summaries(&self) -> Vec<TreeSummary> {
        self.trees.iter().map(DecisionTree::summary).collect()
    }
}

/// Draw one tree's training samples.
///
/// Image ids are drawn without replacement from `0..img_num`; pixels are drawn
/// without replacement from each image's labeled pixels.
fn sample_tree_data(params: &TrainingParams, pool: &ImagePool, rng: &mut impl Rng) -> TrainData {
    let image_ids = index::sample(rng, params.img_num, params.train_img_num).into_vec();
    let mut data = TrainData::with_capacity(params.train_img_num * params.sample_pixel_num);
    for image_id in image_ids {
        let labeled: Vec<_> = pool.get(image_id).labeled_pixels().collect();
        let amount = params.sample_pixel_num.min(labeled.len());
        for i in index::sample(rng, labeled.len(), amount) {
            let (pixel, label) = labeled[i];
            data.push(Sample::new(image_id, pixel, label));
        }
    }
    data
}
