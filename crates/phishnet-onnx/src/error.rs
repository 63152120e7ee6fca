//! Error types for ONNX conversion and evaluation.

use std::path::PathBuf;

/// Errors from converting a forest to ONNX, writing or reading the model
/// file, and evaluating a decoded tree ensemble.
#[derive(Debug, thiserror::Error)]
pub enum OnnxError {
    /// Returned when the forest holds no trees.
    #[error("cannot convert a forest with zero trees")]
    EmptyForest,

    /// Returned when the forest names a different number of features than it was trained on.
    #[error("forest has {n_features} features but {n_names} feature names")]
    FeatureNameMismatch {
        /// Feature count of the forest.
        n_features: usize,
        /// Number of stored names.
        n_names: usize,
    },

    /// Returned when a split threshold does not fit in a 32-bit float.
    #[error("threshold {threshold} of tree {tree}, node {node} is not representable as f32")]
    ThresholdOutOfRange {
        /// Tree index.
        tree: usize,
        /// Node index within the tree.
        node: usize,
        /// The offending threshold.
        threshold: f64,
    },

    /// Returned when the model file cannot be written.
    #[error("cannot write ONNX model to {path}")]
    WriteModel {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the model file cannot be read.
    #[error("cannot read ONNX model from {path}")]
    ReadModel {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the file is not a protobuf-encoded `ModelProto`.
    #[error("cannot decode ONNX model from {path}")]
    DecodeModel {
        /// Path to the model file.
        path: PathBuf,
        /// Underlying protobuf error.
        source: prost::DecodeError,
    },

    /// Returned when the graph has no `TreeEnsembleClassifier` node.
    #[error("model has no TreeEnsembleClassifier node")]
    MissingEnsemble,

    /// Returned when an ensemble attribute is absent, inconsistent or unsupported.
    #[error("malformed attribute {name}: {reason}")]
    MalformedAttribute {
        /// Attribute name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Returned when a branch points at a node id the tree does not define.
    #[error("tree {tree} references undefined node {node}")]
    UnknownNode {
        /// Tree id.
        tree: i64,
        /// Missing node id.
        node: i64,
    },

    /// Returned when a branch reads a feature beyond the input row.
    #[error("node reads feature {feature}, but the input has {width} features")]
    FeatureOutOfRange {
        /// Feature index read by the branch.
        feature: usize,
        /// Length of the input row.
        width: usize,
    },
}
