//! Dataset Cache Module
//! Memoizes normalized tables by source identity so repeated loads in one
//! process share a single read-only table.

use super::loader::{DataLoader, LoaderError};
use super::table::MissionTable;
use log::debug;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// Identity of a source file: where it is and what version of it we read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl SourceKey {
    pub fn for_path(path: &Path) -> Result<Self, LoaderError> {
        let unavailable = |e: std::io::Error| LoaderError::SourceUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let meta = fs::metadata(path).map_err(unavailable)?;
        let canonical = fs::canonicalize(path).map_err(unavailable)?;

        Ok(Self {
            path: canonical,
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

#[derive(Default)]
pub struct DatasetCache {
    tables: Mutex<HashMap<SourceKey, Arc<MissionTable>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for this source, loading it on first use.
    ///
    /// Failed loads are not cached.
    pub fn get_or_load(&self, path: &Path) -> Result<Arc<MissionTable>, LoaderError> {
        let key = SourceKey::for_path(path)?;
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(table) = tables.get(&key) {
            debug!("Cache hit for {}", key.path.display());
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(DataLoader::load(path)?);
        // At most one version per source path
        let before = tables.len();
        tables.retain(|cached, _| cached.path != key.path);
        if tables.len() < before {
            debug!("Evicted stale table for {}", key.path.display());
        }
        tables.insert(key, Arc::clone(&table));
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.tables.lock().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

static GLOBAL_CACHE: Lazy<DatasetCache> = Lazy::new(DatasetCache::new);

/// Load through the process-wide cache.
pub fn load_cached(path: &Path) -> Result<Arc<MissionTable>, LoaderError> {
    GLOBAL_CACHE.get_or_load(path)
}
