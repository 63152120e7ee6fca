//! Reference evaluator for a decoded `TreeEnsembleClassifier` node.
//!
//! Follows the operator's documented semantics for the subset the exporter
//! emits (`BRANCH_LEQ` and `LEAF` nodes, `post_transform = NONE`), so an
//! exported file can be checked against the forest it came from.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::OnnxError;
use crate::proto::{AttributeProto, ModelProto, NodeProto};

#[derive(Debug, Clone, Copy)]
enum Branch {
    /// Go to `true_id` when `x[feature] <= value`.
    Leq {
        feature: usize,
        value: f32,
        true_id: i64,
        false_id: i64,
    },
    Leaf,
}

#[derive(Debug, Default)]
struct EnsembleTree {
    nodes: HashMap<i64, Branch>,
    /// `(class position, weight)` pairs per leaf id.
    weights: HashMap<i64, Vec<(usize, f32)>>,
    root: i64,
}

/// A tree ensemble rebuilt from ONNX attributes.
#[derive(Debug)]
pub struct TreeEnsemble {
    trees: Vec<(i64, EnsembleTree)>,
    class_labels: Vec<i64>,
}

fn find<'a>(node: &'a NodeProto, name: &str) -> Result<&'a AttributeProto, OnnxError> {
    node.attribute
        .iter()
        .find(|a| a.name == name)
        .ok_or_else(|| malformed(name, "missing"))
}

fn malformed(name: &str, reason: &str) -> OnnxError {
    OnnxError::MalformedAttribute {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn to_index(value: i64, name: &str) -> Result<usize, OnnxError> {
    usize::try_from(value).map_err(|_| malformed(name, "negative index"))
}

impl TreeEnsemble {
    /// Locate the first `TreeEnsembleClassifier` node in the model graph and
    /// rebuild its trees.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`OnnxError::MissingEnsemble`] | no such node in the graph |
    /// | [`OnnxError::MalformedAttribute`] | missing, ragged or unsupported attributes |
    /// | [`OnnxError::UnknownNode`] | a class weight targets an undefined node |
    pub fn from_model(model: &ModelProto) -> Result<Self, OnnxError> {
        let node = model
            .graph
            .as_ref()
            .and_then(|g| g.node.iter().find(|n| n.op_type == "TreeEnsembleClassifier"))
            .ok_or(OnnxError::MissingEnsemble)?;
        Self::from_node(node)
    }

    fn from_node(node: &NodeProto) -> Result<Self, OnnxError> {
        let tree_ids = &find(node, "nodes_treeids")?.ints;
        let node_ids = &find(node, "nodes_nodeids")?.ints;
        let feature_ids = &find(node, "nodes_featureids")?.ints;
        let values = &find(node, "nodes_values")?.floats;
        let modes = &find(node, "nodes_modes")?.strings;
        let true_ids = &find(node, "nodes_truenodeids")?.ints;
        let false_ids = &find(node, "nodes_falsenodeids")?.ints;

        let n = tree_ids.len();
        for (name, len) in [
            ("nodes_nodeids", node_ids.len()),
            ("nodes_featureids", feature_ids.len()),
            ("nodes_values", values.len()),
            ("nodes_modes", modes.len()),
            ("nodes_truenodeids", true_ids.len()),
            ("nodes_falsenodeids", false_ids.len()),
        ] {
            if len != n {
                return Err(malformed(name, "length differs from nodes_treeids"));
            }
        }

        let post_transform = find(node, "post_transform").map_or(&b"NONE"[..], |a| &a.s[..]);
        if post_transform != b"NONE" {
            return Err(malformed("post_transform", "only NONE is supported"));
        }

        let mut trees: BTreeMap<i64, EnsembleTree> = BTreeMap::new();
        let mut children: HashMap<i64, HashSet<i64>> = HashMap::new();
        for i in 0..n {
            let branch = match modes[i].as_slice() {
                b"LEAF" => Branch::Leaf,
                b"BRANCH_LEQ" => {
                    children
                        .entry(tree_ids[i])
                        .or_default()
                        .extend([true_ids[i], false_ids[i]]);
                    Branch::Leq {
                        feature: to_index(feature_ids[i], "nodes_featureids")?,
                        value: values[i],
                        true_id: true_ids[i],
                        false_id: false_ids[i],
                    }
                }
                _ => {
                    return Err(malformed(
                        "nodes_modes",
                        "only BRANCH_LEQ and LEAF are supported",
                    ));
                }
            };
            trees
                .entry(tree_ids[i])
                .or_default()
                .nodes
                .insert(node_ids[i], branch);
        }

        for (tree_id, tree) in &mut trees {
            let referenced = children.get(tree_id);
            let mut roots = tree
                .nodes
                .keys()
                .filter(|id| referenced.is_none_or(|c| !c.contains(*id)));
            tree.root = *roots
                .next()
                .ok_or_else(|| malformed("nodes_nodeids", "tree without a root"))?;
            if roots.next().is_some() {
                return Err(malformed("nodes_nodeids", "tree with several roots"));
            }
        }

        let class_labels = find(node, "classlabels_int64s")?.ints.clone();
        let class_tree_ids = &find(node, "class_treeids")?.ints;
        let class_node_ids = &find(node, "class_nodeids")?.ints;
        let class_ids = &find(node, "class_ids")?.ints;
        let class_weights = &find(node, "class_weights")?.floats;
        let m = class_tree_ids.len();
        if class_node_ids.len() != m || class_ids.len() != m || class_weights.len() != m {
            return Err(malformed("class_weights", "class attributes differ in length"));
        }

        for i in 0..m {
            let (tree_id, node_id) = (class_tree_ids[i], class_node_ids[i]);
            let class = to_index(class_ids[i], "class_ids")?;
            if class >= class_labels.len() {
                return Err(malformed("class_ids", "class outside classlabels_int64s"));
            }
            let tree = trees
                .get_mut(&tree_id)
                .filter(|t| t.nodes.contains_key(&node_id))
                .ok_or(OnnxError::UnknownNode {
                    tree: tree_id,
                    node: node_id,
                })?;
            tree.weights
                .entry(node_id)
                .or_default()
                .push((class, class_weights[i]));
        }

        Ok(Self {
            trees: trees.into_iter().collect(),
            class_labels,
        })
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    #[must_use]
    pub fn class_labels(&self) -> &[i64] {
        &self.class_labels
    }

    /// Summed leaf weights per class for one input row (the `probabilities` output).
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`OnnxError::UnknownNode`] | a branch targets an undefined node, or a path cycles |
    /// | [`OnnxError::FeatureOutOfRange`] | a branch reads past the end of `row` |
    pub fn predict_proba(&self, row: &[f32]) -> Result<Vec<f32>, OnnxError> {
        let mut scores = vec![0.0f32; self.class_labels.len()];
        for (tree_id, tree) in &self.trees {
            let mut id = tree.root;
            let mut steps = 0;
            loop {
                let branch = tree.nodes.get(&id).ok_or(OnnxError::UnknownNode {
                    tree: *tree_id,
                    node: id,
                })?;
                match *branch {
                    Branch::Leaf => break,
                    Branch::Leq {
                        feature,
                        value,
                        true_id,
                        false_id,
                    } => {
                        let x = *row.get(feature).ok_or(OnnxError::FeatureOutOfRange {
                            feature,
                            width: row.len(),
                        })?;
                        id = if x <= value { true_id } else { false_id };
                    }
                }
                steps += 1;
                if steps > tree.nodes.len() {
                    return Err(OnnxError::UnknownNode {
                        tree: *tree_id,
                        node: id,
                    });
                }
            }
            for &(class, weight) in tree.weights.get(&id).into_iter().flatten() {
                scores[class] += weight;
            }
        }
        Ok(scores)
    }

    /// Label of the highest score (the `label` output); ties go to the first class.
    ///
    /// # Errors
    ///
    /// Same as [`predict_proba`](Self::predict_proba).
    pub fn predict(&self, row: &[f32]) -> Result<i64, OnnxError> {
        let scores = self.predict_proba(row)?;
        let mut best = 0;
        for (i, &s) in scores.iter().enumerate().skip(1) {
            if s > scores[best] {
                best = i;
            }
        }
        Ok(self.class_labels.get(best).copied().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::AttributeProto as A;

    /// One stump on feature 1 at 2.5: left leaf all class 0, right leaf all class 1.
    fn stump(mode: &str) -> NodeProto {
        NodeProto {
            op_type: "TreeEnsembleClassifier".into(),
            attribute: vec![
                A::ints("nodes_treeids", vec![0, 0, 0]),
                A::ints("nodes_nodeids", vec![0, 1, 2]),
                A::ints("nodes_featureids", vec![1, 0, 0]),
                A::floats("nodes_values", vec![2.5, 0.0, 0.0]),
                A::strings("nodes_modes", [mode, "LEAF", "LEAF"]),
                A::ints("nodes_truenodeids", vec![1, 0, 0]),
                A::ints("nodes_falsenodeids", vec![2, 0, 0]),
                A::ints("classlabels_int64s", vec![0, 1]),
                A::ints("class_treeids", vec![0, 0]),
                A::ints("class_nodeids", vec![1, 2]),
                A::ints("class_ids", vec![0, 1]),
                A::floats("class_weights", vec![1.0, 1.0]),
                A::string("post_transform", "NONE"),
            ],
            ..NodeProto::default()
        }
    }

    #[test]
    fn stump_routes_on_threshold() {
        let ensemble = TreeEnsemble::from_node(&stump("BRANCH_LEQ")).unwrap();
        assert_eq!(ensemble.n_trees(), 1);
        assert_eq!(ensemble.predict_proba(&[9.0, 2.5]).unwrap(), vec![1.0, 0.0]);
        assert_eq!(ensemble.predict(&[9.0, 2.6]).unwrap(), 1);
    }

    #[test]
    fn unsupported_mode() {
        let err = TreeEnsemble::from_node(&stump("BRANCH_LT")).unwrap_err();
        assert!(matches!(
            err,
            OnnxError::MalformedAttribute { ref name, .. } if name == "nodes_modes"
        ));
    }

    #[test]
    fn short_row() {
        let ensemble = TreeEnsemble::from_node(&stump("BRANCH_LEQ")).unwrap();
        assert!(matches!(
            ensemble.predict_proba(&[1.0]),
            Err(OnnxError::FeatureOutOfRange { feature: 1, width: 1 })
        ));
    }

    #[test]
    fn model_without_ensemble() {
        assert!(matches!(
            TreeEnsemble::from_model(&ModelProto::default()),
            Err(OnnxError::MissingEnsemble)
        ));
    }
}
