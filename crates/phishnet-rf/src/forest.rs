//! Random forest training with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::RandomForestConfig;
use crate::error::RfError;
use crate::importance::rank_importances;
use crate::result::{RandomForestResult, TrainingMetadata};
use crate::tree::{DecisionTree, DecisionTreeConfig, grow, to_columns, validate_training_data};

/// A fitted random forest ensemble.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
    pub(crate) feature_names: Vec<String>,
}

impl RandomForest {
    /// Mean of the per-tree MDI importances, renormalized to sum to 1.
    ///
    /// Indexed like the training columns. All zeros only when every tree is a
    /// single leaf.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_features];
        for tree in &self.trees {
            for (total, v) in totals.iter_mut().zip(tree.feature_importances()) {
                *total += v;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }

    /// The fitted trees in training order.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}

/// Draw `n_samples` indices with replacement.
fn bootstrap_sample(n_samples: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
}

/// Train the ensemble.
#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = features.len()))]
pub(crate) fn train(
    config: &RandomForestConfig,
    features: &[Vec<f64>],
    labels: &[usize],
    feature_names: &[String],
) -> Result<RandomForestResult, RfError> {
    let n_features = validate_training_data(features, labels)?;
    if feature_names.len() != n_features {
        return Err(RfError::FeatureNameMismatch {
            n_features,
            n_names: feature_names.len(),
        });
    }
    let n_samples = features.len();
    let max_features = config.max_features.resolve(n_features)?;

    let tree_config = DecisionTreeConfig::new()
        .with_max_depth(config.max_depth)
        .with_min_samples_split(config.min_samples_split)
        .with_min_samples_leaf(config.min_samples_leaf)
        .with_max_features(Some(max_features));
    tree_config.validate(n_features)?;

    let n_classes = labels.iter().max().copied().unwrap_or(0) + 1;

    info!(
        n_trees = config.n_trees,
        n_samples,
        n_features,
        n_classes,
        max_features,
        "training random forest"
    );

    // Seeds are drawn up front so the result does not depend on thread scheduling.
    let mut master_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master_rng.r#gen()).collect();

    let columns = to_columns(features, n_features);

    let trees: Vec<DecisionTree> = tree_seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let samples = bootstrap_sample(n_samples, &mut rng);
            grow(&columns, labels, samples, n_classes, &tree_config, max_features, &mut rng)
        })
        .collect();

    debug!(
        n_trees_trained = trees.len(),
        total_nodes = trees.iter().map(DecisionTree::n_nodes).sum::<usize>(),
        "tree training complete"
    );

    let forest = RandomForest {
        trees,
        n_features,
        n_classes,
        feature_names: feature_names.to_vec(),
    };
    let importances = rank_importances(&forest.feature_importances(), feature_names);

    let metadata = TrainingMetadata {
        n_trees: config.n_trees,
        n_features,
        n_classes,
        n_samples,
        max_features_resolved: max_features,
    };

    info!(
        top_feature = importances.first().map(|f| f.name.as_str()),
        "random forest training complete"
    );

    Ok(RandomForestResult::new(forest, importances, metadata))
}
