//! Load per-segment artifacts from a models directory
//!
//! Layout, one set per segment:
//! - `model_{segment}.json` or `model_{segment}_{algorithm}.json`
//! - `scaler_{segment}.json`, shared by every algorithm of the segment
//! - `columns_{segment}.csv`, a single header row of feature names
//! - `last_values_{segment}.csv`, `feature,value` rows under a header

use super::{ArtifactKey, SegmentArtifacts};
use crate::error::{Result, SimulationError};
use crate::model::{ModelArtifact, Predictor, ScalerArtifact};
use crate::projection::FeatureSnapshot;
use csv::StringRecord;
use log::{debug, info};
use serde::de::DeserializeOwned;
use std::error::Error;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

type ParseResult<T> = std::result::Result<T, Box<dyn Error + Send + Sync>>;

/// Resolved file locations for one artifact key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
    pub columns: PathBuf,
    pub last_values: PathBuf,
}

impl ArtifactPaths {
    pub fn resolve(models_dir: &Path, key: &ArtifactKey) -> Self {
        let seg = key.segment.code();
        let model = match key.algorithm {
            Some(alg) => format!("model_{seg}_{}.json", alg.code()),
            None => format!("model_{seg}.json"),
        };
        Self {
            model: models_dir.join(model),
            scaler: models_dir.join(format!("scaler_{seg}.json")),
            columns: models_dir.join(format!("columns_{seg}.csv")),
            last_values: models_dir.join(format!("last_values_{seg}.csv")),
        }
    }

    pub fn all(&self) -> [&Path; 4] {
        [&self.model, &self.scaler, &self.columns, &self.last_values]
    }

    /// Modification time of each file, `None` where it cannot be read
    pub fn modification_times(&self) -> Vec<Option<SystemTime>> {
        self.all()
            .iter()
            .map(|path| std::fs::metadata(path).and_then(|meta| meta.modified()).ok())
            .collect()
    }
}

fn open_artifact(path: &Path, key: &ArtifactKey) -> Result<File> {
    File::open(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => SimulationError::ArtifactMissing {
            segment: key.to_string(),
            path: path.to_path_buf(),
        },
        _ => SimulationError::ArtifactInvalid {
            path: path.to_path_buf(),
            details: err.to_string(),
        },
    })
}

fn invalid(path: &Path, err: impl std::fmt::Display) -> SimulationError {
    SimulationError::ArtifactInvalid {
        path: path.to_path_buf(),
        details: err.to_string(),
    }
}

fn load_json<T: DeserializeOwned>(path: &Path, key: &ArtifactKey) -> Result<T> {
    let file = open_artifact(path, key)?;
    serde_json::from_reader(BufReader::new(file)).map_err(|err| invalid(path, err))
}

/// Load a fitted model (`kind`-tagged JSON)
pub fn load_model(path: &Path, key: &ArtifactKey) -> Result<ModelArtifact> {
    load_json(path, key)
}

/// Load a fitted scaler (`kind`-tagged JSON)
pub fn load_scaler(path: &Path, key: &ArtifactKey) -> Result<ScalerArtifact> {
    load_json(path, key)
}

/// Load the column list file
pub fn load_columns(path: &Path, key: &ArtifactKey) -> Result<Vec<String>> {
    let file = open_artifact(path, key)?;
    load_columns_from_reader(file).map_err(|err| invalid(path, err))
}

/// Column names from the header row of a CSV
pub fn load_columns_from_reader<R: Read>(reader: R) -> ParseResult<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let columns: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();

    if columns.is_empty() {
        return Err("column file has no header".into());
    }
    Ok(columns)
}

/// Load the last-known-values record
pub fn load_last_values(path: &Path, key: &ArtifactKey) -> Result<FeatureSnapshot> {
    let file = open_artifact(path, key)?;
    load_last_values_from_reader(file).map_err(|err| invalid(path, err))
}

/// Parse a last-known-values record into a snapshot.
///
/// Two layouts are accepted, both with the row label in column 0:
/// - long: a two-cell header whose value column is blank, `0` or `value`,
///   then one `feature,value` row per feature
/// - wide: feature names across the header and exactly one data row
pub fn load_last_values_from_reader<R: Read>(reader: R) -> ParseResult<FeatureSnapshot> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = rdr.records();
    let header = match records.next() {
        Some(header) => header?,
        None => return Err("last values file is empty".into()),
    };
    let rows = records.collect::<std::result::Result<Vec<_>, _>>()?;

    let snapshot = if is_long_layout(&header) {
        long_values(&rows)?
    } else {
        wide_values(&header, &rows)?
    };

    if snapshot.is_empty() {
        return Err("last values file has no rows".into());
    }
    Ok(snapshot)
}

fn is_long_layout(header: &StringRecord) -> bool {
    let value_column = header.get(1).map(str::to_ascii_lowercase);
    header.len() == 2 && matches!(value_column.as_deref(), Some("" | "0" | "value"))
}

fn long_values(rows: &[StringRecord]) -> ParseResult<FeatureSnapshot> {
    let mut snapshot = FeatureSnapshot::new();
    for (idx, record) in rows.iter().enumerate() {
        let line = idx + 2;
        let name = record.get(0).unwrap_or_default();
        if name.is_empty() {
            continue;
        }
        if record.len() != 2 {
            let cells = record.len();
            return Err(format!("row {line} ({name}) has {cells} cells, expected 2").into());
        }
        snapshot.set(name, parse_value(record.get(1).unwrap_or_default(), name, line)?);
    }
    Ok(snapshot)
}

fn wide_values(header: &StringRecord, rows: &[StringRecord]) -> ParseResult<FeatureSnapshot> {
    let record = match rows {
        [record] => record,
        [] => return Err("last values header has no data row".into()),
        more => {
            return Err(format!("wide last values need one data row, found {}", more.len()).into())
        }
    };
    if record.len() != header.len() {
        return Err(format!(
            "data row has {} cells for {} header cells",
            record.len(),
            header.len()
        )
        .into());
    }

    let mut snapshot = FeatureSnapshot::new();
    for (name, raw) in header.iter().zip(record.iter()).skip(1) {
        if name.is_empty() {
            return Err("last values header has an unnamed feature column".into());
        }
        snapshot.set(name, parse_value(raw, name, 2)?);
    }
    Ok(snapshot)
}

fn parse_value(raw: &str, name: &str, line: usize) -> ParseResult<f64> {
    raw.parse()
        .map_err(|_| format!("row {line} ({name}): '{raw}' is not a number").into())
}

/// Load every artifact for `key` from `models_dir`
pub fn load_segment(models_dir: &Path, key: &ArtifactKey) -> Result<SegmentArtifacts> {
    let paths = ArtifactPaths::resolve(models_dir, key);
    debug!("loading artifacts for {key} from {}", models_dir.display());

    let model = load_model(&paths.model, key)?;
    let scaler = load_scaler(&paths.scaler, key)?;
    let columns = load_columns(&paths.columns, key)?;
    let last_values = load_last_values(&paths.last_values, key)?;

    info!(
        "loaded {key}: {} model, {} columns, {} last values",
        model.name(),
        columns.len(),
        last_values.len()
    );

    Ok(SegmentArtifacts {
        key: *key,
        model,
        scaler,
        columns,
        last_values,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Fixture directories with a full artifact set

    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Fresh, empty models directory, removed on drop
    pub fn temp_models_dir() -> TempDir {
        tempfile::Builder::new().prefix("default_rate_sim").tempdir().unwrap()
    }

    pub const COLUMNS: &str = "selic_lag_6,ipca_lag_6,target_lag_1,mes,periodo_safra\n";

    pub const SCALER: &str = r#"{
        "kind": "standard",
        "feature_names": ["selic_lag_6", "ipca_lag_6", "target_lag_1", "mes", "periodo_safra"],
        "mean": [0.0, 0.0, 0.0, 0.0, 0.0],
        "scale": [1.0, 1.0, 1.0, 1.0, 1.0]
    }"#;

    /// Default rate = 0.5 + 0.1 * selic + 0.8 * lagged target
    pub const LINEAR_MODEL: &str = r#"{
        "kind": "linear",
        "coefficients": [0.1, 0.0, 0.8, 0.0, 0.0],
        "intercept": 0.5
    }"#;

    /// Long layout: one `feature,value` row per feature
    pub const LAST_VALUES: &str = "feature,value\nselic_lag_6,11.0\nipca_lag_6,0.4\n\
                                   target_lag_1,3.0\nmes,6\nperiodo_safra,0\n";

    /// Wide layout: the same record as a single dated row
    pub const WIDE_LAST_VALUES: &str = ",selic_lag_6,ipca_lag_6,target_lag_1,mes,periodo_safra\n\
                                        2024-05-01,11.0,0.4,3.0,6,0\n";

    /// Write a full artifact set for `segment` (single model, no algorithm suffix)
    pub fn write_segment(dir: &Path, segment: &str, model_json: &str, last_values: &str) {
        fs::write(dir.join(format!("model_{segment}.json")), model_json).unwrap();
        fs::write(dir.join(format!("scaler_{segment}.json")), SCALER).unwrap();
        fs::write(dir.join(format!("columns_{segment}.csv")), COLUMNS).unwrap();
        fs::write(dir.join(format!("last_values_{segment}.csv")), last_values).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::artifacts::{Algorithm, Segment};
    use std::fs;

    #[test]
    fn test_paths() {
        let dir = Path::new("models");
        let key = ArtifactKey::new(Segment::RuralIndividual, Some(Algorithm::XgBoost));
        let paths = ArtifactPaths::resolve(dir, &key);

        assert_eq!(paths.model, dir.join("model_Rural_PF_XGBoost.json"));
        assert_eq!(paths.scaler, dir.join("scaler_Rural_PF.json"));
        assert_eq!(paths.columns, dir.join("columns_Rural_PF.csv"));
        assert_eq!(paths.last_values, dir.join("last_values_Rural_PF.csv"));

        let single = ArtifactPaths::resolve(dir, &ArtifactKey::new(Segment::Corporate, None));
        assert_eq!(single.model, dir.join("model_PJ.json"));
    }

    #[test]
    fn test_columns_from_reader() {
        let header = "selic_lag_6, mes ,target_lag_1\n";
        let cols = load_columns_from_reader(header.as_bytes()).unwrap();
        assert_eq!(cols, vec!["selic_lag_6", "mes", "target_lag_1"]);
        assert!(load_columns_from_reader("".as_bytes()).is_err());
    }

    #[test]
    fn test_last_values_from_reader() {
        // pandas writes an unnamed index column and a "0" value header
        let csv = ",0\nselic_lag_6,0.1175\nmes,6\n\ntarget_lag_1,3.2\n";
        let snap = load_last_values_from_reader(csv.as_bytes()).unwrap();

        assert_eq!(snap.get("selic_lag_6"), Some(0.1175));
        assert_eq!(snap.get("mes"), Some(6.0));
        assert_eq!(snap.get("target_lag_1"), Some(3.2));

        let parse = |csv: &str| load_last_values_from_reader(csv.as_bytes());
        assert!(parse("feature,value\nmes,june\n").is_err());
        assert!(parse("feature,value\n").is_err());
        assert!(parse("").is_err());
        // Long rows carry exactly one value
        assert!(parse("feature,value\nselic_lag_6,11.0,12.0\n").is_err());
    }

    #[test]
    fn test_wide_last_values() {
        let snap = load_last_values_from_reader(WIDE_LAST_VALUES.as_bytes()).unwrap();
        let long = load_last_values_from_reader(LAST_VALUES.as_bytes()).unwrap();

        assert_eq!(snap, long);
        assert_eq!(snap.len(), 5);
        assert!(!snap.contains("2024-05-01"));

        let parse = |csv: &str| load_last_values_from_reader(csv.as_bytes());
        let single = parse(",mes\n2024-05-01,6\n").unwrap();
        assert_eq!(single.get("mes"), Some(6.0));

        assert!(parse(",selic_lag_6,mes\n2024-04-01,11.0,5\n2024-05-01,11.0,6\n").is_err());
        assert!(parse(",selic_lag_6,mes\n").is_err());
        assert!(parse(",selic_lag_6,mes\n2024-05-01,11.0\n").is_err());
        assert!(parse(",selic_lag_6,,mes\n2024-05-01,11.0,1,6\n").is_err());
        assert!(parse(",selic_lag_6,mes\n2024-05-01,high,6\n").is_err());
    }

    #[test]
    fn test_load_segment() {
        let dir = temp_models_dir();
        let key = ArtifactKey::new(Segment::Individual, None);

        for last_values in [LAST_VALUES, WIDE_LAST_VALUES] {
            write_segment(dir.path(), "PF", LINEAR_MODEL, last_values);
            let arts = load_segment(dir.path(), &key).unwrap();
            assert_eq!(arts.columns.len(), 5);
            assert_eq!(arts.last_values.get("selic_lag_6"), Some(11.0));
            assert_eq!(arts.last_values.get("mes"), Some(6.0));
            assert_eq!(arts.schema().unwrap().len(), 5);
        }
    }

    #[test]
    fn test_missing_and_invalid() {
        let dir = temp_models_dir();
        let key = ArtifactKey::new(Segment::Corporate, Some(Algorithm::Ridge));

        let err = load_segment(dir.path(), &key).unwrap_err();
        match err {
            SimulationError::ArtifactMissing { segment, path } => {
                assert_eq!(segment, "PJ/Ridge");
                assert!(path.ends_with("model_PJ_Ridge.json"));
            }
            other => panic!("unexpected error {other:?}"),
        }

        fs::write(dir.path().join("model_PJ_Ridge.json"), "{ not json").unwrap();
        let err = load_segment(dir.path(), &key).unwrap_err();
        assert!(matches!(err, SimulationError::ArtifactInvalid { .. }));
    }

    #[test]
    fn test_ambiguous_last_values_are_invalid() {
        let dir = temp_models_dir();
        let path = dir.path().join("last_values_PF.csv");
        let key = ArtifactKey::new(Segment::Individual, None);

        let rows = ",selic_lag_6,mes\n2024-04-01,11.0,5\n2024-05-01,11.0,6\n";
        fs::write(&path, rows).unwrap();
        let err = load_last_values(&path, &key).unwrap_err();
        assert!(matches!(err, SimulationError::ArtifactInvalid { .. }));
    }
}
