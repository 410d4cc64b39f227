//! Feature snapshot and the per-step projection state

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named feature values describing one point-in-time economic state
///
/// Ordered by name so iteration (and therefore logging and any derived
/// output) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSnapshot(BTreeMap<String, f64>);

impl FeatureSnapshot {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn get_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).unwrap_or(default)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    /// Names of every feature containing `marker`
    pub fn names_containing<'a>(&'a self, marker: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0.keys().filter(move |k| k.contains(marker)).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for FeatureSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// State carried from one projection step to the next
///
/// Steps never mutate a state in place; [`super::ProjectionEngine`] derives
/// each new state from the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionState {
    pub(super) features: FeatureSnapshot,
    /// Calendar month of the state, 1..=12
    pub(super) month: u32,
}

impl ProjectionState {
    pub fn initial(features: FeatureSnapshot, month: u32) -> Self {
        Self { features, month }
    }

    pub fn features(&self) -> &FeatureSnapshot {
        &self.features
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Calendar month following this state's month, wrapping December to January
    pub fn next_month(&self) -> u32 {
        self.month % 12 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_access() {
        let mut snap: FeatureSnapshot =
            [("selic_lag_6", 11.0), ("selic_lag_12", 12.0), ("mes", 6.0)].into_iter().collect();

        assert_eq!(snap.get("mes"), Some(6.0));
        assert_eq!(snap.get_or("ipca_lag_6", 0.5), 0.5);
        let selic: Vec<_> = snap.names_containing("selic").collect();
        assert_eq!(selic, vec!["selic_lag_12", "selic_lag_6"]);

        snap.set("mes", 7.0);
        assert_eq!(snap.get("mes"), Some(7.0));
        assert_eq!(snap.len(), 3);
    }

    #[test]
    fn test_month_wraps() {
        let state = ProjectionState::initial(FeatureSnapshot::new(), 12);
        assert_eq!(state.month(), 12);
        assert_eq!(state.next_month(), 1);
        let state = ProjectionState::initial(FeatureSnapshot::new(), 6);
        assert_eq!(state.next_month(), 7);
    }

    #[test]
    fn test_snapshot_json_is_a_plain_map() {
        let json = r#"{"mes": 3, "target_lag_1": 2.5}"#;
        let snap: FeatureSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.get("mes"), Some(3.0));
        assert_eq!(snap.get("target_lag_1"), Some(2.5));
    }
}
