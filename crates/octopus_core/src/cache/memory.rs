//! In-memory cache store for tests and ephemeral sessions.

use super::{CacheResult, CacheStore};
use std::cell::RefCell;
use std::collections::BTreeMap;

/// Process-local `CacheStore` with no persistence.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns stored keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }
}

impl CacheStore for MemoryCacheStore {
    fn read(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, payload: &str) -> CacheResult<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), payload.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
