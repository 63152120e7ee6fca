use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::{
    RfError,
    node::{Node, NodeIndex, argmax},
    split::{Splitter, gini},
};

/// Configuration for a single CART decision tree.
///
/// Construct via [`DecisionTreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default               |
/// |---------------------|-----------------------|
/// | `max_depth`         | `None` (unlimited)    |
/// | `min_samples_split` | 2                     |
/// | `min_samples_leaf`  | 1                     |
/// | `max_features`      | `None` (all features) |
/// | `seed`              | 42                    |
#[derive(Debug, Clone)]
pub struct DecisionTreeConfig {
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: Option<usize>,
    pub(crate) seed: u64,
}

impl DecisionTreeConfig {
    /// Create a new config with the defaults listed above.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }

    /// Limit depth to `d` levels below the root (the root is depth 0).
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Number of informative features examined per split; `None` means all.
    #[must_use]
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check the growth parameters against a dataset with `n_features` columns
    /// and return the resolved per-split feature budget.
    pub(crate) fn validate(&self, n_features: usize) -> Result<usize, RfError> {
        if let Some(d) = self.max_depth
            && d == 0
        {
            return Err(RfError::InvalidMaxDepth { max_depth: 0 });
        }
        if self.min_samples_split < 2 {
            return Err(RfError::InvalidMinSamplesSplit {
                min_samples_split: self.min_samples_split,
            });
        }
        if self.min_samples_leaf < 1 {
            return Err(RfError::InvalidMinSamplesLeaf {
                min_samples_leaf: self.min_samples_leaf,
            });
        }
        let max_features = self.max_features.unwrap_or(n_features);
        if max_features == 0 || max_features > n_features {
            return Err(RfError::InvalidMaxFeatures {
                max_features,
                n_features,
            });
        }
        Ok(max_features)
    }

    /// Train a decision tree on a row-major dataset.
    ///
    /// `features[sample][feature]`, `labels[sample]` zero-based classes.
    ///
    /// # Errors
    ///
    /// | Variant                              | When                                              |
    /// |--------------------------------------|---------------------------------------------------|
    /// | [`RfError::EmptyDataset`]            | `features` is empty                               |
    /// | [`RfError::ZeroFeatures`]            | rows have zero feature columns                    |
    /// | [`RfError::LabelCountMismatch`]      | `labels.len() != features.len()`                  |
    /// | [`RfError::FeatureCountMismatch`]    | rows have inconsistent lengths                    |
    /// | [`RfError::NonFiniteValue`]          | any value is NaN or infinite                      |
    /// | [`RfError::InvalidMaxDepth`]         | `max_depth` is `Some(0)`                          |
    /// | [`RfError::InvalidMinSamplesSplit`]  | `min_samples_split` < 2                           |
    /// | [`RfError::InvalidMinSamplesLeaf`]   | `min_samples_leaf` < 1                            |
    /// | [`RfError::InvalidMaxFeatures`]      | `max_features` outside [1, n_features]            |
    #[instrument(skip(self, features, labels), fields(n_samples = features.len()))]
    pub fn fit(&self, features: &[Vec<f64>], labels: &[usize]) -> Result<DecisionTree, RfError> {
        let n_features = validate_training_data(features, labels)?;
        let max_features = self.validate(n_features)?;
        let n_classes = labels.iter().max().copied().unwrap_or(0) + 1;

        let columns = to_columns(features, n_features);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let samples: Vec<usize> = (0..features.len()).collect();
        Ok(grow(&columns, labels, samples, n_classes, self, max_features, &mut rng))
    }
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a row-major training set and return its feature count.
pub(crate) fn validate_training_data(
    features: &[Vec<f64>],
    labels: &[usize],
) -> Result<usize, RfError> {
    let Some(first) = features.first() else {
        return Err(RfError::EmptyDataset);
    };
    let n_features = first.len();
    if n_features == 0 {
        return Err(RfError::ZeroFeatures);
    }
    if labels.len() != features.len() {
        return Err(RfError::LabelCountMismatch {
            n_samples: features.len(),
            n_labels: labels.len(),
        });
    }
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(RfError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(RfError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }
    Ok(n_features)
}

/// Transpose a validated row-major matrix into `columns[feature][sample]`.
pub(crate) fn to_columns(features: &[Vec<f64>], n_features: usize) -> Vec<Vec<f64>> {
    (0..n_features)
        .map(|f| features.iter().map(|row| row[f]).collect())
        .collect()
}

/// Grow a tree over `samples`, which may repeat indices (bootstrap draws).
pub(crate) fn grow(
    columns: &[Vec<f64>],
    labels: &[usize],
    mut samples: Vec<usize>,
    n_classes: usize,
    config: &DecisionTreeConfig,
    max_features: usize,
    rng: &mut impl Rng,
) -> DecisionTree {
    let splitter = Splitter::new(
        columns,
        labels,
        n_classes,
        max_features,
        config.min_samples_leaf,
    );
    let mut builder = TreeBuilder {
        splitter,
        config,
        nodes: Vec::new(),
    };
    builder.build(&mut samples, 0, rng);

    debug!(
        n_samples = samples.len(),
        n_nodes = builder.nodes.len(),
        "decision tree grown"
    );

    DecisionTree {
        nodes: builder.nodes,
        n_features: columns.len(),
        n_classes,
    }
}

struct TreeBuilder<'a> {
    splitter: Splitter<'a>,
    config: &'a DecisionTreeConfig,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_> {
    /// Depth-first construction. Each split reserves its arena slot before its
    /// children so the parent always precedes them and the root lands at 0.
    fn build(&mut self, samples: &mut [usize], depth: usize, rng: &mut impl Rng) -> NodeIndex {
        let n_samples = samples.len();
        let counts = self.splitter.class_counts(samples);
        let impurity = gini(&counts, n_samples);

        let stop = impurity.is_pure()
            || n_samples < self.config.min_samples_split
            || n_samples < 2 * self.config.min_samples_leaf
            || self.config.max_depth.is_some_and(|d| depth >= d);

        let split = if stop {
            None
        } else {
            self.splitter.split(samples, &counts, impurity, rng)
        };

        let slot = NodeIndex::new(self.nodes.len());
        let total = n_samples as f64;
        self.nodes.push(Node::Leaf {
            distribution: counts.iter().map(|&c| c as f64 / total).collect(),
            impurity,
            n_samples,
        });

        let Some(split) = split else {
            return slot;
        };

        let (left_samples, right_samples) = samples.split_at_mut(split.n_left);
        let left = self.build(left_samples, depth + 1, rng);
        let right = self.build(right_samples, depth + 1, rng);

        self.nodes[slot.index()] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            impurity,
            n_samples,
            impurity_decrease: split.impurity_decrease,
        };
        slot
    }
}

/// A fitted CART decision tree stored as a flat node arena.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

impl DecisionTree {
    /// Predict the class of one sample: the majority class of the leaf it reaches.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, RfError> {
        Ok(argmax(self.predict_proba(sample)?))
    }

    /// Class distribution of the leaf `sample` reaches; length `n_classes`.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<&[f64], RfError> {
        if sample.len() != self.n_features {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        let mut idx = NodeIndex::ROOT;
        loop {
            match &self.nodes[idx.index()] {
                Node::Leaf { distribution, .. } => return Ok(distribution),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if sample[feature.index()] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Mean Decrease in Impurity per feature, normalized to sum to 1.
    ///
    /// All zeros when the tree is a single leaf.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_features];
        for node in &self.nodes {
            if let Node::Split {
                feature,
                impurity_decrease,
                ..
            } = node
            {
                totals[feature.index()] += impurity_decrease;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }

    /// The node arena; the root is at index 0.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Depth of the deepest leaf; a lone root leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(NodeIndex::ROOT, 0usize)];
        while let Some((idx, d)) = stack.pop() {
            match &self.nodes[idx.index()] {
                Node::Leaf { .. } => deepest = deepest.max(d),
                Node::Split { left, right, .. } => {
                    stack.push((*left, d + 1));
                    stack.push((*right, d + 1));
                }
            }
        }
        deepest
    }
}
