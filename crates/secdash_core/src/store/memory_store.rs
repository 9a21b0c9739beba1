//! In-memory key-value store with an optional byte quota.

use super::kv_store::{KeyValueStore, StoreError, StoreResult};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Volatile store, useful for tests and ephemeral runtimes.
///
/// When a quota is set, a write that would push the summed key and value
/// lengths over it fails with `StoreError::QuotaExceeded` and leaves the
/// previous value in place.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Mutex::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self.lock()?;
        if let Some(limit) = self.quota_bytes {
            let used: usize = entries
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if used + key.len() + value.len() > limit {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    limit_bytes: limit,
                });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}
