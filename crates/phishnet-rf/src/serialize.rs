//! Native checkpoint format: a bincode-encoded, versioned envelope around the forest.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::RfError;
use crate::forest::RandomForest;

/// Bumped whenever the encoded layout of [`RandomForest`] changes.
pub const FORMAT_VERSION: u32 = 1;

/// Header fields precede the forest so a reader can reject a checkpoint
/// before decoding the trees.
#[derive(Serialize)]
struct EnvelopeRef<'a> {
    format_version: u32,
    n_trees: usize,
    n_features: usize,
    n_classes: usize,
    feature_names: &'a [String],
    forest: &'a RandomForest,
}

#[derive(Deserialize)]
struct Header {
    format_version: u32,
}

#[derive(Deserialize)]
struct Envelope {
    format_version: u32,
    n_trees: usize,
    n_features: usize,
    n_classes: usize,
    feature_names: Vec<String>,
    forest: RandomForest,
}

impl RandomForest {
    /// Encode the forest into checkpoint bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::SerializeModel`] if bincode encoding fails.
    pub fn to_checkpoint_bytes(&self) -> Result<Vec<u8>, RfError> {
        let envelope = EnvelopeRef {
            format_version: FORMAT_VERSION,
            n_trees: self.trees.len(),
            n_features: self.n_features,
            n_classes: self.n_classes,
            feature_names: &self.feature_names,
            forest: self,
        };
        bincode::serialize(&envelope).map_err(|source| RfError::SerializeModel { source })
    }

    /// Write the checkpoint to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::SerializeModel`] | bincode encoding failed |
    /// | [`RfError::WriteModel`] | the file could not be written |
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RfError> {
        let path = path.as_ref();
        let bytes = self.to_checkpoint_bytes()?;
        std::fs::write(path, &bytes).map_err(|source| RfError::WriteModel {
            path: path.to_path_buf(),
            source,
        })?;

        info!(size_bytes = bytes.len(), n_trees = self.trees.len(), "checkpoint written");
        Ok(())
    }

    /// Read a checkpoint written by [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::ReadModel`] | the file could not be read |
    /// | [`RfError::DeserializeModel`] | the bytes are not a checkpoint |
    /// | [`RfError::IncompatibleModelVersion`] | written by another format version |
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RfError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| RfError::ReadModel {
            path: path.to_path_buf(),
            source,
        })?;
        let decode_error = |source| RfError::DeserializeModel {
            path: path.to_path_buf(),
            source,
        };

        let header: Header = bincode::deserialize(&bytes).map_err(decode_error)?;
        if header.format_version != FORMAT_VERSION {
            return Err(RfError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: header.format_version,
                path: path.to_path_buf(),
            });
        }

        let envelope: Envelope = bincode::deserialize(&bytes).map_err(decode_error)?;
        debug!(
            format_version = envelope.format_version,
            n_trees = envelope.n_trees,
            n_features = envelope.n_features,
            n_classes = envelope.n_classes,
            n_names = envelope.feature_names.len(),
            "checkpoint loaded"
        );
        Ok(envelope.forest)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::FORMAT_VERSION;
    use crate::config::RandomForestConfig;
    use crate::error::RfError;
    use crate::forest::RandomForest;

    fn small_forest() -> RandomForest {
        let features: Vec<Vec<f64>> = (0..10)
            .map(|i| vec![i as f64, -1.0, (i * i) as f64])
            .collect();
        let labels: Vec<usize> = (0..10).map(|i| usize::from(i > 4)).collect();
        let names: Vec<String> = vec!["length_url".into(), "ip".into(), "nb_dots".into()];
        RandomForestConfig::new(6)
            .unwrap()
            .with_max_depth(Some(4))
            .fit(&features, &labels, &names)
            .unwrap()
            .into_forest()
    }

    #[test]
    fn round_trip_predicts_identically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("random_forest_model.bin");
        let forest = small_forest();
        forest.save(&path).unwrap();
        let loaded = RandomForest::load(&path).unwrap();

        assert_eq!(loaded.feature_names(), forest.feature_names());
        for sample in [[0.5, -1.0, 0.0], [7.0, -1.0, 49.0], [4.5, 3.0, 20.0]] {
            assert_eq!(
                loaded.predict_proba(&sample).unwrap(),
                forest.predict_proba(&sample).unwrap()
            );
        }
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let err = RandomForest::load(dir.path().join("absent.bin")).unwrap_err();
        assert!(matches!(err, RfError::ReadModel { .. }));
    }

    #[test]
    fn garbage_is_deserialize_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.bin");
        std::fs::write(&path, [FORMAT_VERSION as u8, 0, 0, 0, 0xff]).unwrap();
        let err = RandomForest::load(&path).unwrap_err();
        assert!(matches!(err, RfError::DeserializeModel { .. }));
    }

    #[test]
    fn other_version_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("future.bin");
        let mut bytes = small_forest().to_checkpoint_bytes().unwrap();
        bytes[..4].copy_from_slice(&(FORMAT_VERSION + 1).to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();
        let err = RandomForest::load(&path).unwrap_err();
        assert!(matches!(
            err,
            RfError::IncompatibleModelVersion { expected: FORMAT_VERSION, .. }
        ));
    }
}
