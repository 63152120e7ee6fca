//! Integration tests: fixture CSV -> dataset -> forest -> checkpoint + metadata.

use std::path::Path;

use phishnet_io::{ArtifactWriter, FEATURE_NAMES, ModelMetadata, UrlDatasetReader};
use phishnet_rf::{ConfusionMatrix, RandomForest, RandomForestConfig};
use tempfile::TempDir;

/// Path to the test fixture directory.
fn fixture_path(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn fixture_selects_features_and_labels() {
    let dataset = UrlDatasetReader::new(&fixture_path("urls_20.csv"))
        .read()
        .expect("fixture should parse");

    assert_eq!(dataset.n_samples(), 20);
    assert_eq!(dataset.n_phishing(), 10);
    assert_eq!(dataset.feature_names(), FEATURE_NAMES);
    assert!(dataset.imputed_counts().iter().all(|&c| c == 0));

    // Row 0: http://www.crestonwood.com/router.php; page_rank and
    // google_index are swapped in the file relative to canonical order.
    let first = &dataset.features()[0];
    assert_eq!(first[0], 37.0);
    assert_eq!(first[12], 1.0);
    assert_eq!(first[13], 6.0);
    assert_eq!(first[14], 0.0);
}

#[test]
fn train_and_write_artifacts() {
    let dataset = UrlDatasetReader::new(&fixture_path("urls_20.csv"))
        .read()
        .unwrap();
    let names = dataset.feature_names();

    let forest = RandomForestConfig::new(20)
        .unwrap()
        .with_max_depth(Some(10))
        .fit(dataset.features(), dataset.labels(), &names)
        .unwrap()
        .into_forest();
    let predicted = forest.predict_batch(dataset.features()).unwrap();
    let accuracy = ConfusionMatrix::from_labels(dataset.labels(), &predicted, 2)
        .unwrap()
        .accuracy();

    let dir = TempDir::new().unwrap();
    let writer = ArtifactWriter::new(&dir.path().join("model")).unwrap();
    forest.save(writer.checkpoint_path()).unwrap();
    let metadata = ModelMetadata {
        feature_names: names.clone(),
        feature_importance: forest.feature_importances(),
        model_accuracy: accuracy,
    };
    let metadata_path = writer.write_metadata(&metadata).unwrap();

    let restored = ModelMetadata::read(&metadata_path).unwrap();
    assert_eq!(restored.feature_names.len(), 15);
    assert_eq!(restored.feature_names, names);
    assert!((restored.feature_importance.iter().sum::<f64>() - 1.0).abs() < 1e-6);
    assert!((restored.model_accuracy - accuracy).abs() < 1e-12);

    let reloaded = RandomForest::load(writer.checkpoint_path()).unwrap();
    assert_eq!(reloaded.predict_batch(dataset.features()).unwrap(), predicted);
}
