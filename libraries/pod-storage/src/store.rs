//! Key-value preference backends

use crate::error::{Result, StorageError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Key-value persistence for JSON values
///
/// One value per logical key. Implementations must survive process
/// restarts unless they are explicitly ephemeral ([`MemoryStore`]).
pub trait PreferenceStore: Send + Sync {
    /// Read a value, `Ok(None)` if the key was never written
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write (insert or replace) a value
    fn set(&self, key: &str, value: &Value) -> Result<()>;

    /// Delete a key, returning whether it existed
    fn remove(&self, key: &str) -> Result<bool>;
}

impl<T: PreferenceStore + ?Sized> PreferenceStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<bool> {
        (**self).remove(key)
    }
}

/// In-memory store
///
/// Used for tests and sessions that should not touch disk. Writes can be
/// made to fail on demand to exercise write-failure handling.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set`/`remove` fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.values.lock().map(|v| v.len()).unwrap_or(0)
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_writable(&self, key: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::write_rejected(key, "store is failing writes"));
        }
        Ok(())
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let values = self
            .values
            .lock()
            .map_err(|_| StorageError::write_rejected(key, "lock poisoned"))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        self.check_writable(key)?;
        let mut values = self
            .values
            .lock()
            .map_err(|_| StorageError::write_rejected(key, "lock poisoned"))?;
        values.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        self.check_writable(key)?;
        let mut values = self
            .values
            .lock()
            .map_err(|_| StorageError::write_rejected(key, "lock poisoned"))?;
        Ok(values.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("volume").unwrap(), None);

        store.set("volume", &json!(0.5)).unwrap();
        assert_eq!(store.get("volume").unwrap(), Some(json!(0.5)));

        assert!(store.remove("volume").unwrap());
        assert!(!store.remove("volume").unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn failing_writes_keep_previous_value() {
        let store = MemoryStore::new();
        store.set("k", &json!(1)).unwrap();

        store.set_fail_writes(true);
        assert!(matches!(
            store.set("k", &json!(2)),
            Err(StorageError::WriteRejected { .. })
        ));
        assert_eq!(store.get("k").unwrap(), Some(json!(1)));

        store.set_fail_writes(false);
        store.set("k", &json!(3)).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(json!(3)));
    }

    #[test]
    fn arc_store_delegates() {
        let store = Arc::new(MemoryStore::new());
        let shared: Arc<dyn PreferenceStore> = store.clone();
        shared.set("a", &json!("b")).unwrap();
        assert_eq!(store.get("a").unwrap(), Some(json!("b")));
    }
}
