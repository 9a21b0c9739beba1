//! Persisted developer-mode toggle.

use crate::store::{SharedStore, StoreResult};
use log::{info, warn};

pub const DEV_MODE_KEY: &str = "dev_mode_enabled";

/// Reads and flips the `dev_mode_enabled` flag.
pub struct DevModeService {
    store: SharedStore,
}

impl DevModeService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// True only when the stored flag is exactly `"true"`.
    pub fn is_enabled(&self) -> bool {
        match self.store.get(DEV_MODE_KEY) {
            Ok(value) => value.as_deref() == Some("true"),
            Err(err) => {
                warn!("event=dev_mode_read module=dev_mode status=error error={err}");
                false
            }
        }
    }

    pub fn enable(&self) -> StoreResult<()> {
        self.write(true)
    }

    pub fn disable(&self) -> StoreResult<()> {
        self.write(false)
    }

    /// Flips the flag and returns the new state.
    pub fn toggle(&self) -> StoreResult<bool> {
        let next = !self.is_enabled();
        self.write(next)?;
        Ok(next)
    }

    fn write(&self, enabled: bool) -> StoreResult<()> {
        self.store
            .set(DEV_MODE_KEY, if enabled { "true" } else { "false" })?;
        info!("event=dev_mode_set module=dev_mode status=ok enabled={enabled}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{DevModeService, DEV_MODE_KEY};
    use crate::store::{KeyValueStore, MemoryKeyValueStore, SharedStore};
    use std::sync::Arc;

    #[test]
    fn toggle_flips_and_persists() {
        let store: SharedStore = Arc::new(MemoryKeyValueStore::new());
        let dev_mode = DevModeService::new(Arc::clone(&store));

        assert!(!dev_mode.is_enabled());
        assert!(dev_mode.toggle().unwrap());
        assert_eq!(store.get(DEV_MODE_KEY).unwrap().as_deref(), Some("true"));
        assert!(!dev_mode.toggle().unwrap());
        assert!(!dev_mode.is_enabled());
    }

    #[test]
    fn unexpected_value_reads_as_disabled() {
        let store: SharedStore = Arc::new(MemoryKeyValueStore::new());
        store.set(DEV_MODE_KEY, "TRUE").unwrap();
        assert!(!DevModeService::new(store).is_enabled());
    }
}
