//! Durable preference store on an embedded redb database

use crate::error::{Result, StorageError};
use crate::store::PreferenceStore;
use redb::{Database, ReadableTable, TableDefinition};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Single table: logical key -> JSON text
const PREFERENCES: TableDefinition<&str, &str> = TableDefinition::new("preferences");

/// redb-backed [`PreferenceStore`]
///
/// Every write runs in its own committed transaction, so a value is either
/// fully persisted or not at all.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open (or create) the database file at `path`
    ///
    /// Parent directories are created if missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::create(path)?;

        // Make sure the table exists so read transactions never see TableDoesNotExist
        let txn = db.begin_write()?;
        {
            txn.open_table(PREFERENCES)?;
        }
        txn.commit()?;

        debug!("Opened preference store at {}", path.display());
        Ok(Self { db })
    }
}

impl PreferenceStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(PREFERENCES)?;

        match table.get(key)? {
            Some(raw) => {
                let value = serde_json::from_str(raw.value())
                    .map_err(|e| StorageError::serialization(key, e))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        let text = serde_json::to_string(value).map_err(|e| StorageError::serialization(key, e))?;

        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(PREFERENCES)?;
            table.insert(key, text.as_str())?;
        }
        txn.commit()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let txn = self.db.begin_write()?;
        let existed = {
            let mut table = txn.open_table(PREFERENCES)?;
            let removed = table.remove(key)?;
            removed.is_some()
        };
        txn.commit()?;
        Ok(existed)
    }
}
