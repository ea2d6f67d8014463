use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use super::loader;
use super::model::Dataset;

// ---------------------------------------------------------------------------
// Load-once dataset cache
// ---------------------------------------------------------------------------

/// Memoized dataset accessor keyed by file path.
///
/// The first successful load of a path is kept for the lifetime of the
/// cache and entries are never invalidated, so edits to a file on disk are
/// not picked up until the process restarts. Failed loads are not stored.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<PathBuf, Arc<Dataset>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached dataset for `path`, loading it on first access.
    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<Dataset>> {
        self.get_or_load_with(path, loader::load_file)
    }

    /// Like [`get_or_load`](Self::get_or_load) with a custom loader.
    pub fn get_or_load_with<F>(&mut self, path: &Path, load: F) -> Result<Arc<Dataset>>
    where
        F: FnOnce(&Path) -> Result<Dataset>,
    {
        let key = cache_key(path);
        if let Some(ds) = self.entries.get(&key) {
            log::debug!("Dataset cache hit for {}", key.display());
            return Ok(Arc::clone(ds));
        }

        let dataset = Arc::new(load(path)?);
        log::info!(
            "Loaded {} rows with columns {:?} from {}",
            dataset.len(),
            dataset.column_names,
            path.display()
        );
        self.entries.insert(key, Arc::clone(&dataset));
        Ok(dataset)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(&cache_key(path))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Different spellings of the same existing file share one entry.
fn cache_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use anyhow::bail;

    use super::*;
    use crate::data::model::{Record, Value};

    fn tiny() -> Dataset {
        Dataset::from_records(
            vec!["a".into()],
            vec![Record::from_iter([("a", Value::Number(1.0))])],
        )
    }

    #[test]
    fn loads_once_per_path() {
        let mut cache = DatasetCache::new();
        let calls = Cell::new(0);
        let path = Path::new("not-on-disk.csv");

        let first = cache
            .get_or_load_with(path, |_| {
                calls.set(calls.get() + 1);
                Ok(tiny())
            })
            .unwrap();
        let second = cache
            .get_or_load_with(path, |_| {
                calls.set(calls.get() + 1);
                Ok(tiny())
            })
            .unwrap();

        assert_eq!(calls.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.contains(path));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failed_load_is_not_cached() {
        let mut cache = DatasetCache::new();
        let path = Path::new("broken.csv");

        assert!(cache.get_or_load_with(path, |_| bail!("boom")).is_err());
        assert!(cache.is_empty());

        let ds = cache.get_or_load_with(path, |_| Ok(tiny())).unwrap();
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn reads_csv_from_disk_once() {
        let path = std::env::temp_dir().join(format!(
            "penguin-panda-{}-cache.csv",
            std::process::id()
        ));
        std::fs::write(&path, "species,bill_length_mm\nAdelie,39.1\n").unwrap();

        let mut cache = DatasetCache::new();
        let first = cache.get_or_load(&path).unwrap();

        // Later edits are invisible: entries are never invalidated.
        std::fs::write(&path, "species,bill_length_mm\nGentoo,50.0\nAdelie,40.0\n").unwrap();
        let second = cache.get_or_load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(first.len(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }
}
