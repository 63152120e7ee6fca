use std::fmt;

/// Zero-based feature column index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based feature column index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FeatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// Position of a node inside a tree's node arena. The root is always 0.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub(crate) const ROOT: NodeIndex = NodeIndex(0);

    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based arena position.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Gini impurity of the samples that reached a node.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct Impurity(f64);

impl Impurity {
    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    /// Return the raw impurity value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// `true` when every sample at the node shares one class.
    #[must_use]
    pub fn is_pure(self) -> bool {
        self.0 <= 0.0
    }
}

impl fmt::Display for Impurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

/// A node in a decision tree arena.
///
/// Children are referenced by [`NodeIndex`]; a tree is a flat `Vec<Node>` with
/// the root at position 0 and every split's children placed after it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Node {
    /// An interior node. Samples with `x[feature] <= threshold` go left.
    Split {
        /// Feature tested at this node.
        feature: FeatureIndex,
        /// Decision threshold, the midpoint between two adjacent training values.
        threshold: f64,
        /// Child for `x[feature] <= threshold`.
        left: NodeIndex,
        /// Child for `x[feature] > threshold`.
        right: NodeIndex,
        /// Impurity before splitting.
        impurity: Impurity,
        /// Number of training samples that reached this node.
        n_samples: usize,
        /// Sample-weighted impurity decrease credited to `feature`.
        impurity_decrease: f64,
    },
    /// A terminal node holding the class distribution of its training samples.
    Leaf {
        /// Fraction of samples per class; sums to 1.
        distribution: Vec<f64>,
        /// Impurity of the leaf samples.
        impurity: Impurity,
        /// Number of training samples in this leaf.
        n_samples: usize,
    },
}

impl Node {
    /// Impurity at this node (before splitting, for interior nodes).
    #[must_use]
    pub fn impurity(&self) -> Impurity {
        match self {
            Node::Split { impurity, .. } | Node::Leaf { impurity, .. } => *impurity,
        }
    }

    /// Number of training samples that reached this node.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        match self {
            Node::Split { n_samples, .. } | Node::Leaf { n_samples, .. } => *n_samples,
        }
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Majority class of a leaf; `None` for split nodes.
    ///
    /// Ties go to the lowest class index.
    #[must_use]
    pub fn leaf_class(&self) -> Option<usize> {
        match self {
            Node::Leaf { distribution, .. } => Some(argmax(distribution)),
            Node::Split { .. } => None,
        }
    }
}

/// Index of the largest value, preferring the first on ties.
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::{FeatureIndex, Impurity, Node, NodeIndex, argmax};

    fn leaf(distribution: Vec<f64>) -> Node {
        Node::Leaf {
            distribution,
            impurity: Impurity::new(0.42),
            n_samples: 12,
        }
    }

    #[test]
    fn index_display() {
        assert_eq!(FeatureIndex::new(3).to_string(), "f3");
        assert_eq!(NodeIndex::new(7).to_string(), "#7");
        assert_eq!(NodeIndex::ROOT.index(), 0);
    }

    #[test]
    fn impurity_purity_and_display() {
        assert!(Impurity::new(0.0).is_pure());
        assert!(!Impurity::new(0.5).is_pure());
        assert_eq!(Impurity::new(0.333333).to_string(), "0.333333");
    }

    #[test]
    fn leaf_class_is_majority() {
        assert_eq!(leaf(vec![0.25, 0.75]).leaf_class(), Some(1));
        assert_eq!(leaf(vec![0.9, 0.1]).leaf_class(), Some(0));
    }

    #[test]
    fn leaf_class_tie_prefers_lowest_class() {
        assert_eq!(leaf(vec![0.5, 0.5]).leaf_class(), Some(0));
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), 1);
    }

    #[test]
    fn split_has_no_leaf_class() {
        let split = Node::Split {
            feature: FeatureIndex::new(2),
            threshold: 3.5,
            left: NodeIndex::new(1),
            right: NodeIndex::new(2),
            impurity: Impurity::new(0.48),
            n_samples: 20,
            impurity_decrease: 4.0,
        };
        assert!(!split.is_leaf());
        assert_eq!(split.leaf_class(), None);
        assert_eq!(split.n_samples(), 20);
        assert!((split.impurity().value() - 0.48).abs() < f64::EPSILON);
    }

    #[test]
    fn leaf_accessors() {
        let node = leaf(vec![1.0, 0.0]);
        assert!(node.is_leaf());
        assert_eq!(node.n_samples(), 12);
    }
}
