//! Per-logical-name locks serializing resolve-and-store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Registry of logical name → lock. Two callers resolving the same name
/// queue on one mutex; different names never contend past the map lookup.
#[derive(Default)]
pub(super) struct NameLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl NameLocks {
    /// Lock handle for `name`, created on first use.
    pub(super) fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(locks.entry(name.to_string()).or_default())
    }
}
