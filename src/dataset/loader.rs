//! Dataset catalog resolution and windowed CSV loading.
//!
//! Datasets are addressed by identifiers of the form `group.variant[role]`
//! (e.g. `example.balanced[train]`). A [`DatasetLocations`] catalog maps the
//! `group -> variant -> role` triple to the CSV file backing that partition.
//!
//! CSV layout: one `label` column of integer class codes plus feature
//! columns named `<window>-<i>` (`accel-x-0`, `accel-x-1`, ...). The window
//! name is the column name with the trailing `-<digits>` stripped; the
//! first-seen order of window names defines the window order of the loaded
//! dataset.

use ndarray::{Array1, Array2};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::dataset::WindowedDataset;
use crate::error::ExecutionError;

/// Name of the class-code column in backing CSV files.
pub const LABEL_COLUMN: &str = "label";

/// A parsed `group.variant[role]` dataset identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRef {
    pub group: String,
    pub variant: String,
    pub role: String,
}

impl DatasetRef {
    /// Parse an identifier of the form `group.variant[role]`.
    ///
    /// # Errors
    /// [`ExecutionError::InvalidIdentifier`] when the syntax does not match.
    pub fn parse(ident: &str) -> Result<Self, ExecutionError> {
        let invalid = || ExecutionError::InvalidIdentifier(ident.to_string());
        let (group, rest) = ident.split_once('.').ok_or_else(invalid)?;
        let (variant, rest) = rest.split_once('[').ok_or_else(invalid)?;
        let role = rest.strip_suffix(']').ok_or_else(invalid)?;
        if group.is_empty() || variant.is_empty() || role.is_empty() || role.contains('[') {
            return Err(invalid());
        }
        Ok(Self {
            group: group.to_string(),
            variant: variant.to_string(),
            role: role.to_string(),
        })
    }
}

impl fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}[{}]", self.group, self.variant, self.role)
    }
}

/// Catalog mapping `group -> variant -> role` to the location of the CSV
/// file backing that partition. Deserializable from a YAML document:
///
/// ```yaml
/// example:
///   balanced:
///     train: data/example/balanced/train.csv
///     test: data/example/balanced/test.csv
/// ```
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(transparent)]
pub struct DatasetLocations {
    groups: BTreeMap<String, BTreeMap<String, BTreeMap<String, PathBuf>>>,
}

impl DatasetLocations {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ExecutionError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&text)?)
    }

    /// Register a partition location. Intended for tests and programmatic
    /// catalog construction.
    pub fn insert(
        &mut self,
        group: impl Into<String>,
        variant: impl Into<String>,
        role: impl Into<String>,
        path: impl Into<PathBuf>,
    ) {
        self.groups
            .entry(group.into())
            .or_default()
            .entry(variant.into())
            .or_default()
            .insert(role.into(), path.into());
    }

    /// Resolve a reference to its storage location.
    ///
    /// # Errors
    /// Unknown group, variant and role each fail with their own variant so
    /// callers can tell the three cases apart.
    pub fn resolve(&self, dataset: &DatasetRef) -> Result<&Path, ExecutionError> {
        let variants = self
            .groups
            .get(&dataset.group)
            .ok_or_else(|| ExecutionError::UnknownGroup {
                group: dataset.group.clone(),
            })?;
        let roles = variants
            .get(&dataset.variant)
            .ok_or_else(|| ExecutionError::UnknownVariant {
                group: dataset.group.clone(),
                variant: dataset.variant.clone(),
            })?;
        let path = roles
            .get(&dataset.role)
            .ok_or_else(|| ExecutionError::UnknownRole {
                group: dataset.group.clone(),
                variant: dataset.variant.clone(),
                role: dataset.role.clone(),
            })?;
        Ok(path.as_path())
    }
}

/// Resolve, load and concatenate the named partitions into one dataset.
///
/// `features`, when given, restricts every partition to the named windows
/// before concatenation. The loader is stateless; each call re-reads the
/// backing storage.
pub fn load_datasets(
    dataset_locations: &DatasetLocations,
    datasets_to_load: &[String],
    features: Option<&[String]>,
) -> Result<WindowedDataset, ExecutionError> {
    let mut parts = Vec::with_capacity(datasets_to_load.len());
    for ident in datasets_to_load {
        let dataset_ref = DatasetRef::parse(ident)?;
        let path = dataset_locations.resolve(&dataset_ref)?;
        tracing::debug!(dataset = %dataset_ref, path = %path.display(), "loading partition");
        let mut part = read_windowed_csv(path)?;
        if let Some(names) = features {
            part = part.select_windows(names)?;
        }
        parts.push(part);
    }
    let merged = WindowedDataset::concat(parts)?;
    tracing::debug!(
        rows = merged.len(),
        width = merged.n_features(),
        windows = merged.num_windows(),
        "loaded dataset"
    );
    Ok(merged)
}

/// Strip a trailing `-<digits>` suffix to recover the window name.
fn window_name(column: &str) -> &str {
    match column.rsplit_once('-') {
        Some((prefix, suffix))
            if !prefix.is_empty() && !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) =>
        {
            prefix
        }
        _ => column,
    }
}

/// Read one windowed CSV partition.
fn read_windowed_csv(path: &Path) -> Result<WindowedDataset, ExecutionError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let label_index = headers
        .iter()
        .position(|h| h == LABEL_COLUMN)
        .ok_or_else(|| ExecutionError::MissingColumn(LABEL_COLUMN.to_string()))?;

    // Group feature columns by window, in first-seen order.
    let mut windows: Vec<String> = Vec::new();
    let mut window_columns: Vec<Vec<usize>> = Vec::new();
    for (i, header) in headers.iter().enumerate() {
        if i == label_index {
            continue;
        }
        let name = window_name(header);
        match windows.iter().position(|w| w == name) {
            Some(pos) => window_columns[pos].push(i),
            None => {
                windows.push(name.to_string());
                window_columns.push(vec![i]);
            }
        }
    }
    // Column order within the assembled matrix: windows in first-seen order,
    // each window's columns in file order.
    let column_order: Vec<usize> = window_columns.iter().flatten().copied().collect();

    let mut values: Vec<f64> = Vec::new();
    let mut labels: Vec<u32> = Vec::new();
    for record in reader.records() {
        let record = record?;
        let label_field = record.get(label_index).ok_or_else(|| {
            ExecutionError::Csv(format!("short record in {}", path.display()))
        })?;
        let label: u32 = label_field.trim().parse().map_err(|_| {
            ExecutionError::Parse(format!("invalid label '{}' in {}", label_field, path.display()))
        })?;
        labels.push(label);
        for &col in &column_order {
            let field = record.get(col).ok_or_else(|| {
                ExecutionError::Csv(format!("short record in {}", path.display()))
            })?;
            let value: f64 = field.trim().parse().map_err(|_| {
                ExecutionError::Parse(format!("invalid value '{}' in {}", field, path.display()))
            })?;
            values.push(value);
        }
    }

    let rows = labels.len();
    let width = column_order.len();
    let features = Array2::from_shape_vec((rows, width), values)?;
    WindowedDataset::new(features, Array1::from_vec(labels), windows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_dataset_ref_parse() {
        let parsed = DatasetRef::parse("example.balanced[train]").unwrap();
        assert_eq!(parsed.group, "example");
        assert_eq!(parsed.variant, "balanced");
        assert_eq!(parsed.role, "train");
        assert_eq!(parsed.to_string(), "example.balanced[train]");
    }

    #[test]
    fn test_dataset_ref_parse_invalid() {
        for ident in ["example", "example.balanced", "example.balanced[train", ".x[y]", "a.[b]"] {
            let err = DatasetRef::parse(ident).unwrap_err();
            assert!(matches!(err, ExecutionError::InvalidIdentifier(_)), "{}", ident);
        }
    }

    #[test]
    fn test_window_name() {
        assert_eq!(window_name("accel-x-0"), "accel-x");
        assert_eq!(window_name("accel-x-12"), "accel-x");
        assert_eq!(window_name("gyro-z"), "gyro-z");
        assert_eq!(window_name("plain"), "plain");
    }

    #[test]
    fn test_resolve_lookup_errors() {
        let mut locations = DatasetLocations::new();
        locations.insert("example", "balanced", "train", "train.csv");

        let err = locations
            .resolve(&DatasetRef::parse("xxx.balanced[train]").unwrap())
            .unwrap_err();
        assert!(matches!(err, ExecutionError::UnknownGroup { .. }));

        let err = locations
            .resolve(&DatasetRef::parse("example.ooo[train]").unwrap())
            .unwrap_err();
        assert!(matches!(err, ExecutionError::UnknownVariant { .. }));

        let err = locations
            .resolve(&DatasetRef::parse("example.balanced[what]").unwrap())
            .unwrap_err();
        assert!(matches!(err, ExecutionError::UnknownRole { .. }));
    }

    fn write_partition(dir: &Path, file: &str, rows: usize, label: u32) -> PathBuf {
        // 2 windows (accel-x, accel-y) of width 2 each
        let path = dir.join(file);
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "accel-x-0,accel-x-1,accel-y-0,accel-y-1,label").unwrap();
        for i in 0..rows {
            let base = i as f64;
            writeln!(f, "{},{},{},{},{}", base, base + 0.1, base + 0.2, base + 0.3, label).unwrap();
        }
        path
    }

    #[test]
    fn test_load_single_partition() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_partition(dir.path(), "train.csv", 5, 1);
        let mut locations = DatasetLocations::new();
        locations.insert("example", "balanced", "train", path);

        let dset = load_datasets(
            &locations,
            &["example.balanced[train]".to_string()],
            None,
        )
        .unwrap();
        assert_eq!(dset.len(), 5);
        assert_eq!(dset.n_features(), 4);
        assert_eq!(dset.num_windows(), 2);
        assert_eq!(dset.windows(), &["accel-x".to_string(), "accel-y".to_string()]);
        assert_eq!(dset.labels().to_vec(), vec![1; 5]);
        assert_eq!(dset.features()[[2, 3]], 2.3);
    }

    #[test]
    fn test_load_multiple_partitions_concatenates() {
        let dir = tempfile::tempdir().unwrap();
        let train = write_partition(dir.path(), "train.csv", 5, 0);
        let test = write_partition(dir.path(), "test.csv", 2, 1);
        let mut locations = DatasetLocations::new();
        locations.insert("example", "balanced", "train", train);
        locations.insert("example", "balanced", "test", test);

        let dset = load_datasets(
            &locations,
            &[
                "example.balanced[train]".to_string(),
                "example.balanced[test]".to_string(),
            ],
            None,
        )
        .unwrap();
        assert_eq!(dset.len(), 7);
        assert_eq!(dset.n_features(), 4);
        assert_eq!(dset.labels().to_vec(), vec![0, 0, 0, 0, 0, 1, 1]);
    }

    #[test]
    fn test_load_with_feature_subset() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_partition(dir.path(), "train.csv", 3, 0);
        let mut locations = DatasetLocations::new();
        locations.insert("example", "balanced", "train", path);

        let dset = load_datasets(
            &locations,
            &["example.balanced[train]".to_string()],
            Some(&["accel-y".to_string()]),
        )
        .unwrap();
        assert_eq!(dset.len(), 3);
        assert_eq!(dset.n_features(), 2);
        assert_eq!(dset.windows(), &["accel-y".to_string()]);
        assert_eq!(dset.features()[[0, 0]], 0.2);
    }

    #[test]
    fn test_load_unknown_feature() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_partition(dir.path(), "train.csv", 3, 0);
        let mut locations = DatasetLocations::new();
        locations.insert("example", "balanced", "train", path);

        let err = load_datasets(
            &locations,
            &["example.balanced[train]".to_string()],
            Some(&["gyro-z".to_string()]),
        )
        .unwrap_err();
        assert!(matches!(err, ExecutionError::UnknownFeature(_)));
    }

    #[test]
    fn test_catalog_from_yaml() {
        let yaml = "example:\n  balanced:\n    train: data/train.csv\n";
        let locations: DatasetLocations = serde_yaml::from_str(yaml).unwrap();
        let path = locations
            .resolve(&DatasetRef::parse("example.balanced[train]").unwrap())
            .unwrap();
        assert_eq!(path, Path::new("data/train.csv"));
    }
}
