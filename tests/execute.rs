//! End-to-end experiment runs against CSV-backed catalogs.

use std::io::Write;
use std::path::{Path, PathBuf};

use ndarray::{Array1, ArrayView1, ArrayView2};

use experiment_executor::components::{ComponentSet, Estimator};
use experiment_executor::config::ExecutionConfig;
use experiment_executor::dataset::loader::DatasetLocations;
use experiment_executor::error::ExecutionError;
use experiment_executor::executor::run_experiment;

const WINDOWS: [&str; 6] = ["accel-x", "accel-y", "accel-z", "gyro-x", "gyro-y", "gyro-z"];
const WINDOW_WIDTH: usize = 5;

/// Write one partition: 6 windows of width 5 (30 feature columns) plus a
/// label column cycling through 3 classes.
fn write_partition(dir: &Path, file: &str, rows: usize) -> PathBuf {
    let path = dir.join(file);
    let mut f = std::fs::File::create(&path).unwrap();
    let mut header = Vec::new();
    for window in WINDOWS {
        for i in 0..WINDOW_WIDTH {
            header.push(format!("{}-{}", window, i));
        }
    }
    header.push("label".to_string());
    writeln!(f, "{}", header.join(",")).unwrap();
    for row in 0..rows {
        let mut fields: Vec<String> = (0..WINDOWS.len() * WINDOW_WIDTH)
            .map(|col| format!("{}", row as f64 + col as f64 / 100.0))
            .collect();
        fields.push(format!("{}", row % 3));
        writeln!(f, "{}", fields.join(",")).unwrap();
    }
    path
}

fn catalog(dir: &Path) -> DatasetLocations {
    let train = write_partition(dir, "train.csv", 50);
    let test = write_partition(dir, "test.csv", 10);
    let mut locations = DatasetLocations::new();
    locations.insert("example", "balanced", "train", train);
    locations.insert("example", "balanced", "test", test);
    locations
}

const FULL_PIPELINE_CONFIG: &str = r#"
version: "1.0"
train_dataset: ["example.balanced[train]"]
test_dataset: ["example.balanced[test]"]
reducer_dataset: ["example.balanced[train]"]
transforms:
  - name: identity
    transform: identity
reducer:
  name: reducer
  algorithm: mean
scaler:
  name: scaler
  algorithm: standard_scaler
estimators:
  - name: knn-3
    algorithm: knn
    kwargs:
      n_neighbors: 3
extra:
  in_use_features: []
  reduce_on: axis
  scale_on: train
"#;

/// Estimator stub asserting the feature width it is fit and evaluated on.
#[derive(Clone)]
struct WidthAsserting {
    expected_width: usize,
    expected_test_rows: usize,
}

impl Estimator for WidthAsserting {
    fn fit(
        &mut self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, u32>,
        _validation: Option<(ArrayView2<'_, f64>, ArrayView1<'_, u32>)>,
    ) -> Result<(), ExecutionError> {
        assert_eq!(x.ncols(), self.expected_width);
        assert_eq!(x.nrows(), y.len());
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<u32>, ExecutionError> {
        assert_eq!(x.ncols(), self.expected_width);
        assert_eq!(x.nrows(), self.expected_test_rows);
        Ok(Array1::zeros(x.nrows()))
    }
}

#[test]
fn test_full_pipeline_axis_reduce() {
    let dir = tempfile::tempdir().unwrap();
    let locations = catalog(dir.path());
    let config = ExecutionConfig::from_yaml_str(FULL_PIPELINE_CONFIG).unwrap();

    // axis policy: one block per window, mean reducer emits width 1 each,
    // so the estimator sees 6 features and all 10 test rows
    let mut components = ComponentSet::defaults();
    components.estimators.register_instance(
        "probe",
        WidthAsserting {
            expected_width: 6,
            expected_test_rows: 10,
        },
    );
    let mut config = config;
    config.estimators[0].algorithm = "probe".to_string();
    config.estimators[0].kwargs = None;

    let outcome = run_experiment(&config, &locations, &components).unwrap();
    assert_eq!(outcome.results.len(), 1);
    let result = &outcome.results[0];
    assert_eq!(result.name, "knn-3");
    assert_eq!(result.algorithm, "probe");
    assert_eq!(result.reports.len(), 1);
    assert!(result.reports[0].accuracy.is_some());
}

#[test]
fn test_full_pipeline_with_real_estimator() {
    let dir = tempfile::tempdir().unwrap();
    let locations = catalog(dir.path());
    let config = ExecutionConfig::from_yaml_str(FULL_PIPELINE_CONFIG).unwrap();

    let outcome = run_experiment(&config, &locations, &ComponentSet::defaults()).unwrap();
    assert_eq!(outcome.results.len(), 1);
    let report = &outcome.results[0].reports[0];
    let accuracy = report.accuracy.unwrap();
    assert!((0.0..=1.0).contains(&accuracy));
    assert!(report.f1_macro.is_some());
    assert!(report.confusion_matrix.is_some());
    assert!(report.classification_report.is_some());
}

#[test]
fn test_num_runs_yields_one_report_each() {
    let dir = tempfile::tempdir().unwrap();
    let locations = catalog(dir.path());
    let mut config = ExecutionConfig::from_yaml_str(FULL_PIPELINE_CONFIG).unwrap();
    config.estimators[0].num_runs = 3;

    let outcome = run_experiment(&config, &locations, &ComponentSet::defaults()).unwrap();
    assert_eq!(outcome.results[0].reports.len(), 3);
}

#[test]
fn test_minimal_config_without_optional_stages() {
    let dir = tempfile::tempdir().unwrap();
    let locations = catalog(dir.path());
    let yaml = r#"
version: "1.0"
train_dataset: ["example.balanced[train]"]
test_dataset: ["example.balanced[test]"]
estimators:
  - name: majority
    algorithm: majority
extra:
  in_use_features: []
  reduce_on: all
  scale_on: train
"#;
    let config = ExecutionConfig::from_yaml_str(yaml).unwrap();
    let outcome = run_experiment(&config, &locations, &ComponentSet::defaults()).unwrap();
    // Majority class over labels 0..=2 cycling on 50 rows predicts class 0;
    // the 10-row test cycle holds 4 zeros
    let accuracy = outcome.results[0].reports[0].accuracy.unwrap();
    assert!((accuracy - 0.4).abs() < 1e-10);
}

#[test]
fn test_in_use_features_narrows_the_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let locations = catalog(dir.path());
    let mut config = ExecutionConfig::from_yaml_str(FULL_PIPELINE_CONFIG).unwrap();
    config.extra.in_use_features = vec!["accel-x".to_string(), "gyro-z".to_string()];

    // 2 windows survive; axis reduce with the mean reducer leaves width 2
    let mut components = ComponentSet::defaults();
    components.estimators.register_instance(
        "probe",
        WidthAsserting {
            expected_width: 2,
            expected_test_rows: 10,
        },
    );
    config.estimators[0].algorithm = "probe".to_string();
    config.estimators[0].kwargs = None;

    let outcome = run_experiment(&config, &locations, &components).unwrap();
    assert_eq!(outcome.results[0].reports.len(), 1);
}

#[test]
fn test_multiple_estimators_in_config_order() {
    let dir = tempfile::tempdir().unwrap();
    let locations = catalog(dir.path());
    let yaml = r#"
version: "1.0"
train_dataset: ["example.balanced[train]"]
test_dataset: ["example.balanced[test]"]
estimators:
  - name: knn-1
    algorithm: knn
    kwargs:
      n_neighbors: 1
  - name: majority
    algorithm: majority
extra:
  in_use_features: []
  reduce_on: all
  scale_on: self
"#;
    let config = ExecutionConfig::from_yaml_str(yaml).unwrap();
    let outcome = run_experiment(&config, &locations, &ComponentSet::defaults()).unwrap();
    assert_eq!(outcome.results.len(), 2);
    assert_eq!(outcome.results[0].name, "knn-1");
    assert_eq!(outcome.results[1].name, "majority");
}

#[test]
fn test_unknown_dataset_fails_before_estimators() {
    let dir = tempfile::tempdir().unwrap();
    let locations = catalog(dir.path());
    let mut config = ExecutionConfig::from_yaml_str(FULL_PIPELINE_CONFIG).unwrap();
    config.train_dataset = vec!["example.missing[train]".to_string()];

    let err = run_experiment(&config, &locations, &ComponentSet::defaults()).unwrap_err();
    assert!(matches!(err, ExecutionError::UnknownVariant { .. }));
}

#[test]
fn test_reducer_without_reducer_dataset_fails() {
    let dir = tempfile::tempdir().unwrap();
    let locations = catalog(dir.path());
    let mut config = ExecutionConfig::from_yaml_str(FULL_PIPELINE_CONFIG).unwrap();
    config.reducer_dataset = None;

    let err = run_experiment(&config, &locations, &ComponentSet::defaults()).unwrap_err();
    assert!(matches!(
        err,
        ExecutionError::MissingDataset(ref role) if role == "reducer_dataset"
    ));
}
