//! Per-segment model artifacts: identifiers, file loading and caching

pub mod loader;
mod cache;

pub use loader::{
    load_columns, load_columns_from_reader, load_last_values, load_last_values_from_reader,
    load_model, load_scaler, load_segment, ArtifactPaths,
};
pub use cache::ArtifactCache;

use crate::error::Result;
use crate::model::{FeatureScaler, ModelArtifact, ScalerArtifact};
use crate::projection::{FeatureSchema, FeatureSnapshot};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Customer segment with its own fitted model and scaler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Segment {
    /// Individuals
    #[serde(rename = "PF")]
    Individual,
    /// Companies
    #[serde(rename = "PJ")]
    Corporate,
    /// Rural producers, individuals
    #[serde(rename = "Rural_PF")]
    RuralIndividual,
    /// Rural producers, companies
    #[serde(rename = "Rural_PJ")]
    RuralCorporate,
}

impl Segment {
    pub const ALL: [Segment; 4] = [
        Self::Individual,
        Self::Corporate,
        Self::RuralIndividual,
        Self::RuralCorporate,
    ];

    /// Identifier used in artifact file names
    pub fn code(self) -> &'static str {
        match self {
            Self::Individual => "PF",
            Self::Corporate => "PJ",
            Self::RuralIndividual => "Rural_PF",
            Self::RuralCorporate => "Rural_PJ",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Individual => "Pessoa Física",
            Self::Corporate => "Pessoa Jurídica",
            Self::RuralIndividual => "Rural Pessoa Física",
            Self::RuralCorporate => "Rural Pessoa Jurídica",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Segment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|seg| seg.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown segment '{s}' (expected PF, PJ, Rural_PF or Rural_PJ)"))
    }
}

/// Algorithm family when a segment has several fitted models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Algorithm {
    Ridge,
    RandomForest,
    #[serde(rename = "XGBoost")]
    XgBoost,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Self::Ridge, Self::RandomForest, Self::XgBoost];

    /// Suffix used in model file names
    pub fn code(self) -> &'static str {
        match self {
            Self::Ridge => "Ridge",
            Self::RandomForest => "RandomForest",
            Self::XgBoost => "XGBoost",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Ridge => "Ridge (linear / trend following)",
            Self::RandomForest => "RandomForest (conservative)",
            Self::XgBoost => "XGBoost (aggressive)",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("unknown algorithm '{s}' (expected Ridge, RandomForest or XGBoost)")
            })
    }
}

/// Cache and lookup key: a segment, optionally narrowed to one algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactKey {
    pub segment: Segment,
    pub algorithm: Option<Algorithm>,
}

impl ArtifactKey {
    pub fn new(segment: Segment, algorithm: Option<Algorithm>) -> Self {
        Self { segment, algorithm }
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.algorithm {
            Some(alg) => write!(f, "{}/{}", self.segment, alg),
            None => write!(f, "{}", self.segment),
        }
    }
}

/// Everything needed to project one segment
#[derive(Debug, Clone)]
pub struct SegmentArtifacts {
    pub key: ArtifactKey,
    pub model: ModelArtifact,
    pub scaler: ScalerArtifact,
    /// Column list persisted next to the scaler
    pub columns: Vec<String>,
    /// Last known feature values, in the model's native units
    pub last_values: FeatureSnapshot,
}

impl SegmentArtifacts {
    /// Expected feature order: the scaler's own names, falling back to the
    /// persisted column list when the scaler carries none.
    pub fn schema(&self) -> Result<FeatureSchema> {
        let scaler_names = self.scaler.feature_names();
        if scaler_names.is_empty() {
            return FeatureSchema::new(self.columns.clone());
        }
        if !self.columns.is_empty() && self.columns != scaler_names {
            warn!(
                "{}: column list ({} names) differs from scaler schema ({} names); \
                 using the scaler's",
                self.key,
                self.columns.len(),
                scaler_names.len()
            );
        }
        FeatureSchema::new(scaler_names.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LinearModel, StandardScaler};

    fn artifacts(scaler_names: &[&str], columns: &[&str]) -> SegmentArtifacts {
        let width = scaler_names.len().max(columns.len());
        SegmentArtifacts {
            key: ArtifactKey::new(Segment::Individual, None),
            model: ModelArtifact::Linear(LinearModel::new(vec![0.0; width], 1.0)),
            scaler: ScalerArtifact::Standard(StandardScaler::new(
                scaler_names.iter().map(|s| s.to_string()).collect(),
                vec![0.0; width],
                vec![1.0; width],
            )),
            columns: columns.iter().map(|s| s.to_string()).collect(),
            last_values: FeatureSnapshot::new(),
        }
    }

    #[test]
    fn test_segment_codes() {
        assert_eq!("rural_pf".parse::<Segment>(), Ok(Segment::RuralIndividual));
        assert_eq!("PJ".parse::<Segment>(), Ok(Segment::Corporate));
        assert!("PX".parse::<Segment>().is_err());
        assert_eq!(Segment::RuralCorporate.to_string(), "Rural_PJ");
        assert_eq!(serde_json::to_string(&Segment::RuralIndividual).unwrap(), "\"Rural_PF\"");
    }

    #[test]
    fn test_algorithm_codes() {
        assert_eq!("xgboost".parse::<Algorithm>(), Ok(Algorithm::XgBoost));
        assert_eq!(Algorithm::RandomForest.to_string(), "RandomForest");
        let key = ArtifactKey::new(Segment::Individual, Some(Algorithm::Ridge));
        assert_eq!(key.to_string(), "PF/Ridge");
    }

    #[test]
    fn test_schema_prefers_scaler_names() {
        let arts = artifacts(&["mes", "selic_lag_6"], &["selic_lag_6", "mes"]);
        assert_eq!(arts.schema().unwrap().names(), ["mes", "selic_lag_6"]);

        let arts = artifacts(&[], &["selic_lag_6", "mes"]);
        assert_eq!(arts.schema().unwrap().names(), ["selic_lag_6", "mes"]);

        let arts = artifacts(&[], &[]);
        assert!(arts.schema().is_err());
    }
}
