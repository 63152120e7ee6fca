//! Dataset ingestion and artifact writing for the phishnet pipeline.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{
    FEATURE_NAMES, MISSING_SENTINEL, MISSING_TOKENS, PHISHING_STATUS, STATUS_COLUMN, UrlClass,
    UrlDataset, is_missing,
};
pub use error::IoError;
pub use reader::UrlDatasetReader;
pub use writer::{ArtifactWriter, CHECKPOINT_FILE, METADATA_FILE, ModelMetadata, ONNX_FILE};
