//! Process-wide artifact cache, invalidated by file modification time

use super::loader::{load_segment, ArtifactPaths};
use super::{ArtifactKey, SegmentArtifacts};
use crate::error::Result;
use log::{debug, info};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

#[derive(Debug)]
struct CachedEntry {
    artifacts: Arc<SegmentArtifacts>,
    /// Modification times of the files the entry was loaded from
    stamps: Vec<Option<SystemTime>>,
}

/// Loaded artifacts keyed by (segment, algorithm)
///
/// Artifacts are shared read-only through `Arc`; an entry is reloaded only
/// when one of its files changes on disk.
#[derive(Debug)]
pub struct ArtifactCache {
    models_dir: PathBuf,
    entries: RwLock<HashMap<ArtifactKey, CachedEntry>>,
}

impl ArtifactCache {
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Cached artifacts for `key`, loading or reloading as needed
    pub fn get(&self, key: &ArtifactKey) -> Result<Arc<SegmentArtifacts>> {
        let stamps = ArtifactPaths::resolve(&self.models_dir, key).modification_times();

        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = entries.get(key) {
                if entry.stamps == stamps {
                    debug!("artifact cache hit for {key}");
                    return Ok(Arc::clone(&entry.artifacts));
                }
                info!("artifacts for {key} changed on disk, reloading");
            }
        }

        let artifacts = Arc::new(load_segment(&self.models_dir, key)?);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(*key, CachedEntry { artifacts: Arc::clone(&artifacts), stamps });
        Ok(artifacts)
    }

    /// Drop the entry for `key`; returns whether one was cached
    pub fn invalidate(&self, key: &ArtifactKey) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::loader::test_support::*;
    use crate::artifacts::Segment;
    use std::fs::{self, File};
    use std::time::Duration;

    #[test]
    fn test_hit_then_reload_on_change() {
        let dir = temp_models_dir();
        write_segment(dir.path(), "PF", LINEAR_MODEL, LAST_VALUES);
        let cache = ArtifactCache::new(dir.path());
        let key = ArtifactKey::new(Segment::Individual, None);

        let first = cache.get(&key).unwrap();
        let second = cache.get(&key).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        let values = dir.path().join("last_values_PF.csv");
        fs::write(&values, "feature,value\nselic_lag_6,9.5\nmes,2\n").unwrap();
        let bumped = SystemTime::now() + Duration::from_secs(5);
        File::options().write(true).open(&values).unwrap().set_modified(bumped).unwrap();

        let third = cache.get(&key).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.last_values.get("selic_lag_6"), Some(9.5));

        assert!(cache.invalidate(&key));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_missing_is_not_cached() {
        let dir = temp_models_dir();
        let cache = ArtifactCache::new(dir.path());
        let key = ArtifactKey::new(Segment::RuralCorporate, None);

        assert!(cache.get(&key).is_err());
        assert!(cache.is_empty());
    }
}
