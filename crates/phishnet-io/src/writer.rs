//! Model directory layout and the JSON metadata document.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::IoError;

/// File name of the native checkpoint.
pub const CHECKPOINT_FILE: &str = "random_forest_model.bin";
/// File name of the ONNX graph.
pub const ONNX_FILE: &str = "rf_model.onnx";
/// File name of the metadata document.
pub const METADATA_FILE: &str = "model_metadata.json";

/// Feature names, their importances (same order) and the held-out accuracy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub feature_names: Vec<String>,
    pub feature_importance: Vec<f64>,
    pub model_accuracy: f64,
}

impl ModelMetadata {
    /// Read a metadata document back from disk.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::ReadFile`] | file unreadable |
    /// | [`IoError::ParseMetadata`] | not a metadata document |
    pub fn read(path: &Path) -> Result<Self, IoError> {
        let text = fs::read_to_string(path).map_err(|source| IoError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| IoError::ParseMetadata {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Resolves artifact paths inside a model directory and writes the metadata.
///
/// The directory is created on construction if it does not exist.
pub struct ArtifactWriter {
    model_dir: PathBuf,
}

impl ArtifactWriter {
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %model_dir.display()))]
    pub fn new(model_dir: &Path) -> Result<Self, IoError> {
        fs::create_dir_all(model_dir).map_err(|e| IoError::OutputDirCreate {
            path: model_dir.to_path_buf(),
            source: e,
        })?;
        debug!("model directory ready");
        Ok(Self {
            model_dir: model_dir.to_path_buf(),
        })
    }

    #[must_use]
    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    #[must_use]
    pub fn checkpoint_path(&self) -> PathBuf {
        self.model_dir.join(CHECKPOINT_FILE)
    }

    #[must_use]
    pub fn onnx_path(&self) -> PathBuf {
        self.model_dir.join(ONNX_FILE)
    }

    #[must_use]
    pub fn metadata_path(&self) -> PathBuf {
        self.model_dir.join(METADATA_FILE)
    }

    /// Write `metadata` to [`METADATA_FILE`] and return its path.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::SerializeMetadata`] | JSON encoding failed |
    /// | [`IoError::WriteFile`] | file write failed |
    #[instrument(skip_all)]
    pub fn write_metadata(&self, metadata: &ModelMetadata) -> Result<PathBuf, IoError> {
        let path = self.metadata_path();
        let json = serde_json::to_string_pretty(metadata)
            .map_err(|source| IoError::SerializeMetadata { source })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(
            path = %path.display(),
            n_features = metadata.feature_names.len(),
            accuracy = metadata.model_accuracy,
            "metadata written"
        );
        Ok(path)
    }
}
