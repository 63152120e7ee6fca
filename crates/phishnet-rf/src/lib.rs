//! Random forest classification: fit, split, evaluate, persist.
//!
//! A hand-rolled random forest of Gini CART trees with rayon-parallel
//! training, together with the pieces needed around it: a
//! seeded train/test split, confusion matrix and classification report,
//! importance ranking, and a versioned bincode checkpoint.

mod config;
mod confusion;
mod error;
mod forest;
mod importance;
mod node;
mod partition;
mod predict;
mod report;
mod result;
mod serialize;
mod split;
mod tree;

pub use config::{MaxFeatures, RandomForestConfig};
pub use confusion::{ClassMetrics, ConfusionMatrix};
pub use error::RfError;
pub use forest::RandomForest;
pub use importance::{ImportanceTable, RankedFeature, rank_importances};
pub use node::{FeatureIndex, Impurity, Node, NodeIndex};
pub use partition::{TrainTestSplit, train_test_split};
pub use predict::ClassDistribution;
pub use report::{AveragedMetrics, ClassificationReport};
pub use result::{RandomForestResult, TrainingMetadata};
pub use serialize::FORMAT_VERSION;
pub use tree::{DecisionTree, DecisionTreeConfig};
