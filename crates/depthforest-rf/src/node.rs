use crate::split::SplitCandidate;

/// A node of a depth decision tree.
///
/// Each split exclusively owns its two children, so a tree is acyclic by
/// construction and dropping the root drops the whole tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// An interior split node.
    Split {
        /// Distance from the root.
        depth: usize,
        /// Test routing samples to `left` or `right`.
        candidate: SplitCandidate,
        /// Subtree for samples whose feature is below the threshold.
        left: Box<Node>,
        /// Subtree for the remaining samples.
        right: Box<Node>,
    },
    /// A terminal leaf node.
    Leaf {
        /// Distance from the root.
        depth: usize,
        /// Label probability distribution, one entry per label, summing to 1.
        distribution: Vec<f64>,
    },
}

impl Node {
    /// Return the depth of this node.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Node::Split { depth, .. } | Node::Leaf { depth, .. } => *depth,
        }
    }

    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Iterate over this subtree in pre-order: node, left subtree, right subtree.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder { stack: vec![self] }
    }

    /// Node count, leaf count, and deepest leaf of this subtree.
    #[must_use]
    pub fn summary(&self) -> TreeSummary {
        self.preorder().fold(TreeSummary::default(), |mut acc, node| {
            acc.n_nodes += 1;
            if node.is_leaf() {
                acc.n_leaves += 1;
                acc.max_depth = acc.max_depth.max(node.depth());
            }
            acc
        })
    }
}

/// Pre-order iterator over a subtree. See [`Node::preorder`].
#[derive(Debug)]
pub struct Preorder<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        if let Node::Split { left, right, .. } = node {
            self.stack.push(right);
            self.stack.push(left);
        }
        Some(node)
    }
}

/// Shape statistics of one tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeSummary {
    /// Total number of nodes.
    pub n_nodes: usize,
    /// Number of leaves.
    pub n_leaves: usize,
    /// Depth of the deepest leaf.
    pub max_depth: usize,
}
