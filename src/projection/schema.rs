//! Reconciliation of a feature snapshot against the scaler's expected schema

use super::FeatureSnapshot;
use crate::error::{Result, SimulationError};
use std::collections::HashSet;

/// Ordered feature names a scaler was fitted against
///
/// Guaranteed non-empty, with unique, non-blank names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Vec<String>,
    lookup: HashSet<String>,
}

impl FeatureSchema {
    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(SimulationError::schema("expected feature list is empty"));
        }

        let mut lookup = HashSet::with_capacity(names.len());
        for (idx, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                let msg = format!("feature name at position {idx} is blank");
                return Err(SimulationError::schema(msg));
            }
            if !lookup.insert(name.clone()) {
                let msg = format!("feature '{name}' listed more than once");
                return Err(SimulationError::schema(msg));
            }
        }

        Ok(Self { names, lookup })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup.contains(name)
    }

    /// Ordered row for the scaler; see [`reconcile`]
    pub fn reconcile(&self, snapshot: &FeatureSnapshot) -> Vec<f64> {
        reconcile(&self.names, snapshot)
    }

    /// Expected features the snapshot does not carry (filled with zero)
    pub fn missing<'a>(&'a self, snapshot: &FeatureSnapshot) -> Vec<&'a str> {
        self.names
            .iter()
            .filter(|name| !snapshot.contains(name))
            .map(String::as_str)
            .collect()
    }

    /// Snapshot features the scaler never sees
    pub fn extras<'a>(&self, snapshot: &'a FeatureSnapshot) -> Vec<&'a str> {
        snapshot
            .iter()
            .map(|(name, _)| name)
            .filter(|name| !self.contains(name))
            .collect()
    }
}

/// Build a row ordered by `expected`: absent features become 0, snapshot
/// features outside `expected` are dropped.
pub fn reconcile(expected: &[String], snapshot: &FeatureSnapshot) -> Vec<f64> {
    expected.iter().map(|name| snapshot.get_or(name, 0.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_superset_fills_zero() {
        let snap: FeatureSnapshot = [("selic_lag_6", 11.0), ("mes", 6.0)].into_iter().collect();
        let schema =
            FeatureSchema::new(names(&["mes", "spread_pf", "selic_lag_6", "ipca_lag_6"])).unwrap();

        assert_eq!(schema.reconcile(&snap), vec![6.0, 0.0, 11.0, 0.0]);
        assert_eq!(schema.missing(&snap), vec!["spread_pf", "ipca_lag_6"]);
    }

    #[test]
    fn test_subset_drops_extras() {
        let snap: FeatureSnapshot =
            [("selic_lag_6", 11.0), ("mes", 6.0), ("noise", 99.0)].into_iter().collect();
        let schema = FeatureSchema::new(names(&["selic_lag_6"])).unwrap();

        assert_eq!(schema.reconcile(&snap), vec![11.0]);
        assert_eq!(schema.extras(&snap), vec!["mes", "noise"]);
    }

    #[test]
    fn test_malformed_schemas() {
        assert!(matches!(
            FeatureSchema::new(Vec::new()),
            Err(SimulationError::SchemaMismatch { .. })
        ));
        assert!(matches!(
            FeatureSchema::new(names(&["mes", " "])),
            Err(SimulationError::SchemaMismatch { .. })
        ));
        assert!(matches!(
            FeatureSchema::new(names(&["mes", "selic_lag_6", "mes"])),
            Err(SimulationError::SchemaMismatch { .. })
        ));
    }
}
