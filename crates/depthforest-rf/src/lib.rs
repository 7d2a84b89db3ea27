//! Depth-image pixel classification with randomized decision forests.
//!
//! Each tree is grown over pixels sampled from labeled depth images. Split
//! nodes compare a depth-normalized difference of two probe offsets against
//! a threshold; leaves hold label distributions. Split search runs in
//! parallel fork-join batches, trees train in parallel via rayon, and forests
//! persist as one plain-text file per tree.

mod config;
mod confusion;
mod error;
mod eval;
mod forest;
mod gain;
mod node;
mod predict;
mod search;
mod serialize;
mod split;
mod tree;

#[cfg(test)]
mod fixtures;

pub use config::{NumRange, TrainingParams};
pub use confusion::{ConfusionMatrix, LabelMetrics};
pub use error::RfError;
pub use forest::RandomForest;
pub use gain::{entropy, information_gain, label_distribution};
pub use node::{Node, Preorder, TreeSummary};
pub use predict::Prediction;
pub use search::{BestSplit, find_best_split};
pub use serialize::tree_file_name;
pub use split::{Side, SplitCandidate};
pub use tree::DecisionTree;
