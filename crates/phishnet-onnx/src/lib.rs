//! ONNX export for phishnet random forests.
//!
//! Converts a fitted [`phishnet_rf::RandomForest`] into an ONNX model holding a
//! single `ai.onnx.ml.TreeEnsembleClassifier` node, writes and reads the
//! protobuf file, and evaluates a decoded ensemble for fidelity checks.

mod convert;
mod ensemble;
mod error;
pub mod proto;

pub use convert::{
    INPUT_NAME, IR_VERSION, LABEL_OUTPUT, ML_DOMAIN, ML_OPSET, ONNX_OPSET, PROBABILITIES_OUTPUT,
    forest_to_onnx, read_model, save_model,
};
pub use ensemble::TreeEnsemble;
pub use error::OnnxError;
