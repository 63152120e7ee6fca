//! The train → evaluate → export pipeline behind the `phishnet` binary.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, instrument};

use phishnet_io::{ArtifactWriter, ModelMetadata, UrlClass, UrlDatasetReader};
use phishnet_onnx::{forest_to_onnx, save_model};
use phishnet_rf::{
    ClassificationReport, ConfusionMatrix, ImportanceTable, RandomForestConfig, RankedFeature,
    train_test_split,
};

/// Binary task: legitimate and phishing.
const N_CLASSES: usize = 2;

/// Inputs and fixed hyperparameters of one run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data: PathBuf,
    pub model_dir: PathBuf,
    pub seed: u64,
    pub test_fraction: f64,
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
}

impl PipelineConfig {
    /// 80/20 split, 100 trees of depth at most 10, split threshold 2.
    pub fn new(data: &Path, model_dir: &Path, seed: u64) -> Self {
        Self {
            data: data.to_path_buf(),
            model_dir: model_dir.to_path_buf(),
            seed,
            test_fraction: 0.2,
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 2,
        }
    }
}

/// Paths of the exported artifacts, in write order.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub checkpoint: PathBuf,
    pub onnx: PathBuf,
    pub metadata: PathBuf,
}

/// Everything a run reports on the console.
#[derive(Debug)]
pub struct PipelineReport {
    pub accuracy: f64,
    pub report: ClassificationReport,
    pub confusion: ConfusionMatrix,
    pub importances: Vec<RankedFeature>,
    pub artifacts: Artifacts,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Test Accuracy: {:.2}", self.accuracy)?;
        writeln!(f, "\nClassification Report:")?;
        writeln!(f, "{}", self.report)?;
        writeln!(f, "\nConfusion Matrix:")?;
        writeln!(f, "{}", self.confusion)?;
        writeln!(f, "\nFeature Importance:")?;
        write!(f, "{}", ImportanceTable(&self.importances))
    }
}

/// Load, split, fit, evaluate and export.
///
/// Every input error surfaces before the model directory is touched; a
/// failed ONNX conversion leaves the already written checkpoint in place.
#[instrument(skip_all, fields(data = %config.data.display(), seed = config.seed))]
pub fn run(config: &PipelineConfig) -> Result<PipelineReport> {
    let dataset = UrlDatasetReader::new(&config.data)
        .read()
        .with_context(|| format!("failed to load dataset {}", config.data.display()))?;
    let names = dataset.feature_names();

    let split = train_test_split(dataset.n_samples(), config.test_fraction, config.seed)
        .context("failed to split dataset")?;
    let (x_train, x_test) = split.select(dataset.features());
    let (y_train, y_test) = split.select(dataset.labels());
    info!(n_train = split.n_train(), n_test = split.n_test(), "dataset split");

    let result = RandomForestConfig::new(config.n_trees)?
        .with_max_depth(Some(config.max_depth))
        .with_min_samples_split(config.min_samples_split)
        .with_seed(config.seed)
        .fit(&x_train, &y_train, &names)
        .context("random forest training failed")?;
    let importances = result.importances().to_vec();
    let forest = result.into_forest();

    let predicted = forest
        .predict_batch(&x_test)
        .context("prediction on the test split failed")?;
    let confusion = ConfusionMatrix::from_labels(&y_test, &predicted, N_CLASSES)
        .context("failed to evaluate predictions")?;
    let report = ClassificationReport::from_confusion(&confusion);
    let accuracy = confusion.accuracy();
    info!(
        accuracy,
        n_phishing_test = y_test.iter().filter(|&&l| l == UrlClass::Phishing.index()).count(),
        "evaluation complete"
    );

    let writer =
        ArtifactWriter::new(&config.model_dir).context("failed to prepare model directory")?;

    let checkpoint = writer.checkpoint_path();
    forest
        .save(&checkpoint)
        .context("failed to write model checkpoint")?;

    let onnx_model = forest_to_onnx(&forest).context("ONNX conversion failed")?;
    let onnx = writer.onnx_path();
    save_model(&onnx_model, &onnx).context("failed to write ONNX model")?;

    let metadata = writer
        .write_metadata(&ModelMetadata {
            feature_names: names,
            feature_importance: forest.feature_importances(),
            model_accuracy: accuracy,
        })
        .context("failed to write model metadata")?;

    info!(model_dir = %writer.model_dir().display(), "artifacts exported");

    Ok(PipelineReport {
        accuracy,
        report,
        confusion,
        importances,
        artifacts: Artifacts {
            checkpoint,
            onnx,
            metadata,
        },
    })
}

#[cfg(test)]
mod tests {
    use std::fmt::Write as _;

    use phishnet_io::FEATURE_NAMES;
    use phishnet_onnx::{TreeEnsemble, read_model};
    use phishnet_rf::RandomForest;
    use tempfile::TempDir;

    use super::*;

    /// 20 rows, alternating legitimate/phishing, every feature populated.
    fn write_dataset(dir: &Path, columns: &[&str]) -> PathBuf {
        let mut csv = String::from("url,");
        csv.push_str(&columns.join(","));
        csv.push('\n');
        for i in 0..20u32 {
            let phishing = i % 2 == 1;
            write!(csv, "http://site{i}.test/").unwrap();
            for &column in columns {
                let cell = match column {
                    "status" if phishing => "phishing".to_string(),
                    "status" => "legitimate".to_string(),
                    "length_url" => (if phishing { 60 + i } else { 20 + i }).to_string(),
                    "nb_hyphens" => u32::from(phishing).to_string(),
                    _ => (i % 3).to_string(),
                };
                write!(csv, ",{cell}").unwrap();
            }
            csv.push('\n');
        }
        let path = dir.join("dataset_training.csv");
        std::fs::write(&path, csv).unwrap();
        path
    }

    fn all_columns() -> Vec<&'static str> {
        let mut columns = FEATURE_NAMES.to_vec();
        columns.push("status");
        columns
    }

    #[test]
    fn twenty_rows_export_consistent_artifacts() {
        let dir = TempDir::new().unwrap();
        let data = write_dataset(dir.path(), &all_columns());
        let model_dir = dir.path().join("model");

        let outcome = run(&PipelineConfig::new(&data, &model_dir, 42)).unwrap();
        assert_eq!(outcome.confusion.total(), 4);

        let metadata = ModelMetadata::read(&outcome.artifacts.metadata).unwrap();
        assert_eq!(metadata.feature_names, FEATURE_NAMES);
        assert_eq!(metadata.feature_importance.len(), 15);
        assert!((metadata.feature_importance.iter().sum::<f64>() - 1.0).abs() < 1e-6);
        assert_eq!(metadata.model_accuracy, outcome.accuracy);

        let onnx = read_model(&outcome.artifacts.onnx).unwrap();
        let input = onnx.graph.as_ref().unwrap().input[0].tensor_type().unwrap().clone();
        assert_eq!(input.shape.unwrap().dims()[1], Some(15));
        assert_eq!(TreeEnsemble::from_model(&onnx).unwrap().n_trees(), 100);

        let forest = RandomForest::load(&outcome.artifacts.checkpoint).unwrap();
        assert_eq!(forest.n_trees(), 100);

        let console = outcome.to_string();
        assert!(console.starts_with(&format!("Test Accuracy: {:.2}\n", outcome.accuracy)));
        for heading in ["Classification Report:", "Confusion Matrix:", "Feature Importance:"] {
            assert!(console.contains(heading), "missing {heading}");
        }
    }

    #[test]
    fn same_seed_same_outcome() {
        let dir = TempDir::new().unwrap();
        let data = write_dataset(dir.path(), &all_columns());
        let a = run(&PipelineConfig::new(&data, &dir.path().join("a"), 7)).unwrap();
        let b = run(&PipelineConfig::new(&data, &dir.path().join("b"), 7)).unwrap();
        assert_eq!(a.confusion, b.confusion);
        assert_eq!(a.importances, b.importances);
        assert_eq!(
            std::fs::read(&a.artifacts.onnx).unwrap(),
            std::fs::read(&b.artifacts.onnx).unwrap()
        );
    }

    #[test]
    fn missing_column_fails_before_any_output() {
        let dir = TempDir::new().unwrap();
        let columns: Vec<&str> = all_columns().into_iter().filter(|&c| c != "nb_eq").collect();
        let data = write_dataset(dir.path(), &columns);
        let model_dir = dir.path().join("model");

        let err = run(&PipelineConfig::new(&data, &model_dir, 42)).unwrap_err();
        let io = err.downcast_ref::<phishnet_io::IoError>().unwrap();
        assert!(matches!(
            io,
            phishnet_io::IoError::MissingColumn { column, .. } if column == "nb_eq"
        ));
        assert!(!model_dir.exists());
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let err = run(&PipelineConfig::new(
            &dir.path().join("absent.csv"),
            &dir.path().join("model"),
            42,
        ))
        .unwrap_err();
        assert!(format!("{err:#}").contains("failed to load dataset"));
    }
}
