//! Process-lifetime storage backend.

use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{CacheEntry, Storage};

/// In-memory [`Storage`]. Entries live as long as the value does.
#[derive(Debug, Default)]
pub struct InMemStorage {
    entries: RwLock<BTreeMap<String, CacheEntry>>,
}

impl InMemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for InMemStorage {
    fn get(&self, logical_name: &str) -> Result<Option<CacheEntry>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow!("in-memory storage lock poisoned"))?;
        Ok(entries.get(logical_name).cloned())
    }

    fn put(&self, entry: CacheEntry) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("in-memory storage lock poisoned"))?;
        entries.insert(entry.logical_name.clone(), entry);
        Ok(())
    }

    fn all(&self) -> Result<Vec<CacheEntry>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow!("in-memory storage lock poisoned"))?;
        Ok(entries.values().cloned().collect())
    }
}
