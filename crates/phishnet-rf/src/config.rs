//! Configuration builder for random forest training.

use crate::error::RfError;
use crate::result::RandomForestResult;

/// Strategy for the number of features examined at each split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxFeatures {
    /// `floor(sqrt(n_features))`, at least 1.
    Sqrt,
    /// Every feature.
    All,
}

impl MaxFeatures {
    /// Resolve to a concrete count for a dataset with `n_features` columns.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidMaxFeatures`] when `n_features` is zero.
    pub fn resolve(self, n_features: usize) -> Result<usize, RfError> {
        let resolved = match self {
            MaxFeatures::Sqrt => ((n_features as f64).sqrt().floor() as usize).max(1),
            MaxFeatures::All => n_features,
        };
        if resolved == 0 || resolved > n_features {
            return Err(RfError::InvalidMaxFeatures {
                max_features: resolved,
                n_features,
            });
        }
        Ok(resolved)
    }
}

/// Configuration for random forest training.
///
/// Construct via [`RandomForestConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default  |
/// |---------------------|----------|
/// | `max_features`      | `Sqrt`   |
/// | `max_depth`         | `None`   |
/// | `min_samples_split` | 2        |
/// | `min_samples_leaf`  | 1        |
/// | `seed`              | 42       |
#[derive(Debug, Clone)]
pub struct RandomForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) max_features: MaxFeatures,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) seed: u64,
}

impl RandomForestConfig {
    /// Create a new config with the given number of trees.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, RfError> {
        if n_trees == 0 {
            return Err(RfError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            max_features: MaxFeatures::Sqrt,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        })
    }

    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the maximum tree depth. `None` means unlimited.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum number of samples a node needs before a split is attempted.
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

    /// Set the seed that drives bootstrap draws and feature sampling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    #[must_use]
    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    #[must_use]
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    #[must_use]
    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Train a random forest.
    ///
    /// `features[sample][feature]` is row-major, `labels[sample]` holds
    /// zero-based classes, `feature_names` names every column.
    ///
    /// # Errors
    ///
    /// | Variant                              | When                                             |
    /// |--------------------------------------|--------------------------------------------------|
    /// | [`RfError::EmptyDataset`]            | `features` is empty                              |
    /// | [`RfError::ZeroFeatures`]            | rows have zero feature columns                   |
    /// | [`RfError::LabelCountMismatch`]      | `labels.len() != features.len()`                 |
    /// | [`RfError::FeatureNameMismatch`]     | `feature_names.len() != n_features`              |
    /// | [`RfError::FeatureCountMismatch`]    | rows have inconsistent lengths                   |
    /// | [`RfError::NonFiniteValue`]          | any value is NaN or infinite                     |
    /// | [`RfError::InvalidMaxDepth`]         | `max_depth` is `Some(0)`                         |
    /// | [`RfError::InvalidMinSamplesSplit`]  | `min_samples_split` < 2                          |
    /// | [`RfError::InvalidMinSamplesLeaf`]   | `min_samples_leaf` < 1                           |
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        feature_names: &[String],
    ) -> Result<RandomForestResult, RfError> {
        crate::forest::train(self, features, labels, feature_names)
    }
}
