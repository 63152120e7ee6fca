//! Export fidelity: forest -> ONNX file -> decoded ensemble agrees with the forest.

use phishnet_onnx::{
    INPUT_NAME, TreeEnsemble, forest_to_onnx, proto::DataType, read_model, save_model,
};
use phishnet_rf::{RandomForest, RandomForestConfig};
use tempfile::TempDir;

/// 80 rows of 15 small integer counts; label depends on features 0 and 4.
///
/// Integer values keep every threshold exact in `f32`.
fn make_urls() -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
    let mut state: u32 = 12345;
    let mut next = move || {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        f64::from((state >> 16) % 30)
    };
    let mut features = Vec::new();
    let mut labels = Vec::new();
    for _ in 0..80 {
        let row: Vec<f64> = (0..15).map(|_| next()).collect();
        labels.push(usize::from(row[0] + 2.0 * row[4] > 45.0));
        features.push(row);
    }
    let names = (0..15).map(|f| format!("f{f}")).collect();
    (features, labels, names)
}

fn fit(n_trees: usize) -> (RandomForest, Vec<Vec<f64>>) {
    let (features, labels, names) = make_urls();
    let forest = RandomForestConfig::new(n_trees)
        .unwrap()
        .with_max_depth(Some(10))
        .with_seed(42)
        .fit(&features, &labels, &names)
        .unwrap()
        .into_forest();
    (forest, features)
}

#[test]
fn decoded_ensemble_matches_forest() {
    let (forest, features) = fit(30);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rf_model.onnx");
    save_model(&forest_to_onnx(&forest).unwrap(), &path).unwrap();

    let ensemble = TreeEnsemble::from_model(&read_model(&path).unwrap()).unwrap();
    assert_eq!(ensemble.n_trees(), 30);
    assert_eq!(ensemble.class_labels(), &[0, 1]);

    for row in &features {
        let expected = forest.predict_proba(row).unwrap();
        let row32: Vec<f32> = row.iter().map(|&v| v as f32).collect();
        let got = ensemble.predict_proba(&row32).unwrap();
        for (class, &p) in got.iter().enumerate() {
            assert!(
                (f64::from(p) - expected.probability(class)).abs() < 1e-5,
                "class {class}: onnx {p} vs forest {}",
                expected.probability(class)
            );
        }
        // Exact ties can round either way in f32.
        if (expected.probability(0) - expected.probability(1)).abs() > 1e-4 {
            let label = ensemble.predict(&row32).unwrap();
            assert_eq!(label as usize, expected.predicted_class());
        }
    }
}

#[test]
fn input_declares_feature_width() {
    let (forest, _) = fit(5);
    let model = forest_to_onnx(&forest).unwrap();
    let graph = model.graph.unwrap();
    let input = &graph.input[0];
    assert_eq!(input.name, INPUT_NAME);
    let tensor = input.tensor_type().unwrap();
    assert_eq!(tensor.elem_type, DataType::Float as i32);
    assert_eq!(tensor.shape.as_ref().unwrap().dims(), vec![None, Some(15)]);
}

#[test]
fn adjacent_f32_values_route_like_the_forest() {
    // The midpoint between a and b rounds up to b in f32.
    let a = 1.0f32.next_up();
    let b = a.next_up();
    let features: Vec<Vec<f64>> = (0..40)
        .map(|i| vec![f64::from(if i < 20 { a } else { b })])
        .collect();
    let labels: Vec<usize> = (0..40).map(|i| usize::from(i >= 20)).collect();
    let forest = RandomForestConfig::new(10)
        .unwrap()
        .with_seed(7)
        .fit(&features, &labels, &["length_url".to_string()])
        .unwrap()
        .into_forest();

    let ensemble = TreeEnsemble::from_model(&forest_to_onnx(&forest).unwrap()).unwrap();
    for x in [a, b] {
        let expected = forest.predict_proba(&[f64::from(x)]).unwrap();
        let got = ensemble.predict_proba(&[x]).unwrap();
        for (class, &p) in got.iter().enumerate() {
            assert!((f64::from(p) - expected.probability(class)).abs() < 1e-5, "x = {x}");
        }
        assert_eq!(ensemble.predict(&[x]).unwrap() as usize, expected.predicted_class());
    }
    assert_eq!(forest.predict(&[f64::from(b)]).unwrap(), 1);
}
