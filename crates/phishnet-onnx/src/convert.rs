//! Forest to `TreeEnsembleClassifier` conversion and model file I/O.

use std::path::Path;

use phishnet_rf::{Node, RandomForest};
use prost::Message;
use tracing::{debug, info, instrument};

use crate::error::OnnxError;
use crate::proto::{
    AttributeProto, DataType, GraphProto, ModelProto, NodeProto, OperatorSetIdProto,
    StringStringEntryProto, ValueInfoProto,
};

/// IR version written into the model header.
pub const IR_VERSION: i64 = 8;
/// Opset of the default `ai.onnx` domain.
pub const ONNX_OPSET: i64 = 15;
/// Domain of the traditional-ML operators.
pub const ML_DOMAIN: &str = "ai.onnx.ml";
/// Opset of [`ML_DOMAIN`].
pub const ML_OPSET: i64 = 1;

/// Name of the graph input, a `FLOAT [N, n_features]` tensor.
pub const INPUT_NAME: &str = "float_input";
/// Name of the `INT64 [N]` predicted-label output.
pub const LABEL_OUTPUT: &str = "label";
/// Name of the `FLOAT [N, n_classes]` probability output.
pub const PROBABILITIES_OUTPUT: &str = "probabilities";

const ENSEMBLE_OP: &str = "TreeEnsembleClassifier";

/// Flattened attribute columns of a `TreeEnsembleClassifier` node.
#[derive(Default)]
struct EnsembleAttributes {
    nodes_treeids: Vec<i64>,
    nodes_nodeids: Vec<i64>,
    nodes_featureids: Vec<i64>,
    nodes_values: Vec<f32>,
    nodes_modes: Vec<&'static str>,
    nodes_truenodeids: Vec<i64>,
    nodes_falsenodeids: Vec<i64>,
    class_treeids: Vec<i64>,
    class_nodeids: Vec<i64>,
    class_ids: Vec<i64>,
    class_weights: Vec<f32>,
}

impl EnsembleAttributes {
    fn push_node(&mut self, tree: i64, node: i64, feature: i64, value: f32, mode: &'static str) {
        self.nodes_treeids.push(tree);
        self.nodes_nodeids.push(node);
        self.nodes_featureids.push(feature);
        self.nodes_values.push(value);
        self.nodes_modes.push(mode);
    }

    fn into_proto(self, n_classes: usize) -> Vec<AttributeProto> {
        let n_nodes = self.nodes_treeids.len();
        vec![
            AttributeProto::ints("classlabels_int64s", (0..n_classes as i64).collect()),
            AttributeProto::ints("class_ids", self.class_ids),
            AttributeProto::ints("class_nodeids", self.class_nodeids),
            AttributeProto::ints("class_treeids", self.class_treeids),
            AttributeProto::floats("class_weights", self.class_weights),
            AttributeProto::ints("nodes_falsenodeids", self.nodes_falsenodeids),
            AttributeProto::ints("nodes_featureids", self.nodes_featureids),
            AttributeProto::floats("nodes_hitrates", vec![1.0; n_nodes]),
            AttributeProto::ints("nodes_missing_value_tracks_true", vec![0; n_nodes]),
            AttributeProto::strings("nodes_modes", self.nodes_modes),
            AttributeProto::ints("nodes_nodeids", self.nodes_nodeids),
            AttributeProto::ints("nodes_treeids", self.nodes_treeids),
            AttributeProto::ints("nodes_truenodeids", self.nodes_truenodeids),
            AttributeProto::floats("nodes_values", self.nodes_values),
            AttributeProto::string("post_transform", "NONE"),
        ]
    }
}

/// Largest `f32` not above `threshold`.
///
/// Rounding down keeps `x <= t32` equivalent to `x <= threshold` for every
/// `f32` input `x`, so an f32 feature equal to the next training value still
/// goes right.
fn to_f32(threshold: f64, tree: usize, node: usize) -> Result<f32, OnnxError> {
    let nearest = threshold as f32;
    let value = if nearest.is_finite() && f64::from(nearest) > threshold {
        nearest.next_down()
    } else {
        nearest
    };
    if value.is_finite() {
        Ok(value)
    } else {
        Err(OnnxError::ThresholdOutOfRange {
            tree,
            node,
            threshold,
        })
    }
}

/// Convert a fitted forest into an ONNX model with a single
/// `ai.onnx.ml.TreeEnsembleClassifier` node.
///
/// Node ids are the arena positions of each tree. Every leaf carries one
/// weight per class, its class fraction divided by the tree count, so the
/// summed scores equal the forest's averaged probabilities.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`OnnxError::EmptyForest`] | the forest has no trees |
/// | [`OnnxError::FeatureNameMismatch`] | feature names do not cover the feature columns |
/// | [`OnnxError::ThresholdOutOfRange`] | a threshold overflows `f32` |
#[instrument(skip_all, fields(n_trees = forest.n_trees()))]
pub fn forest_to_onnx(forest: &RandomForest) -> Result<ModelProto, OnnxError> {
    if forest.n_trees() == 0 {
        return Err(OnnxError::EmptyForest);
    }
    let n_features = forest.n_features();
    let n_classes = forest.n_classes();
    if forest.feature_names().len() != n_features {
        return Err(OnnxError::FeatureNameMismatch {
            n_features,
            n_names: forest.feature_names().len(),
        });
    }

    let scale = forest.n_trees() as f64;
    let mut attrs = EnsembleAttributes::default();
    for (t, tree) in forest.trees().iter().enumerate() {
        for (n, node) in tree.nodes().iter().enumerate() {
            let (tree_id, node_id) = (t as i64, n as i64);
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    let value = to_f32(*threshold, t, n)?;
                    attrs.push_node(tree_id, node_id, feature.index() as i64, value, "BRANCH_LEQ");
                    attrs.nodes_truenodeids.push(left.index() as i64);
                    attrs.nodes_falsenodeids.push(right.index() as i64);
                }
                Node::Leaf { distribution, .. } => {
                    attrs.push_node(tree_id, node_id, 0, 0.0, "LEAF");
                    attrs.nodes_truenodeids.push(0);
                    attrs.nodes_falsenodeids.push(0);
                    for (class, &p) in distribution.iter().enumerate() {
                        attrs.class_treeids.push(tree_id);
                        attrs.class_nodeids.push(node_id);
                        attrs.class_ids.push(class as i64);
                        attrs.class_weights.push((p / scale) as f32);
                    }
                }
            }
        }
    }
    let n_nodes = attrs.nodes_nodeids.len();

    let ensemble = NodeProto {
        input: vec![INPUT_NAME.to_string()],
        output: vec![LABEL_OUTPUT.to_string(), PROBABILITIES_OUTPUT.to_string()],
        name: ENSEMBLE_OP.to_string(),
        op_type: ENSEMBLE_OP.to_string(),
        domain: ML_DOMAIN.to_string(),
        attribute: attrs.into_proto(n_classes),
        doc_string: String::new(),
    };

    let graph = GraphProto {
        node: vec![ensemble],
        name: "random_forest".to_string(),
        doc_string: String::new(),
        input: vec![ValueInfoProto::tensor(
            INPUT_NAME,
            DataType::Float,
            &[None, Some(n_features as i64)],
        )],
        output: vec![
            ValueInfoProto::tensor(LABEL_OUTPUT, DataType::Int64, &[None]),
            ValueInfoProto::tensor(
                PROBABILITIES_OUTPUT,
                DataType::Float,
                &[None, Some(n_classes as i64)],
            ),
        ],
        value_info: Vec::new(),
    };

    debug!(n_nodes, n_features, n_classes, "ensemble flattened");

    Ok(ModelProto {
        ir_version: IR_VERSION,
        opset_import: vec![
            OperatorSetIdProto {
                domain: String::new(),
                version: ONNX_OPSET,
            },
            OperatorSetIdProto {
                domain: ML_DOMAIN.to_string(),
                version: ML_OPSET,
            },
        ],
        producer_name: env!("CARGO_PKG_NAME").to_string(),
        producer_version: env!("CARGO_PKG_VERSION").to_string(),
        domain: String::new(),
        model_version: 1,
        doc_string: String::new(),
        graph: Some(graph),
        metadata_props: vec![StringStringEntryProto {
            key: "feature_names".to_string(),
            value: forest.feature_names().join(","),
        }],
    })
}

/// Encode `model` and write it to `path`.
///
/// # Errors
///
/// Returns [`OnnxError::WriteModel`] if the file cannot be written.
#[instrument(skip(model), fields(path = %path.as_ref().display()))]
pub fn save_model(model: &ModelProto, path: impl AsRef<Path>) -> Result<(), OnnxError> {
    let path = path.as_ref();
    let bytes = model.encode_to_vec();
    std::fs::write(path, &bytes).map_err(|source| OnnxError::WriteModel {
        path: path.to_path_buf(),
        source,
    })?;
    info!(size_bytes = bytes.len(), "ONNX model written");
    Ok(())
}

/// Read and decode a model written by [`save_model`].
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`OnnxError::ReadModel`] | file unreadable |
/// | [`OnnxError::DecodeModel`] | not a protobuf `ModelProto` |
#[instrument(fields(path = %path.as_ref().display()))]
pub fn read_model(path: impl AsRef<Path>) -> Result<ModelProto, OnnxError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| OnnxError::ReadModel {
        path: path.to_path_buf(),
        source,
    })?;
    ModelProto::decode(bytes.as_slice()).map_err(|source| OnnxError::DecodeModel {
        path: path.to_path_buf(),
        source,
    })
}
