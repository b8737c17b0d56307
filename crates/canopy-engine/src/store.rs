//! Persistence store implementations.
//!
//! The engine persists small JSON snapshots (the access ledger)
//! through the `ContextStore` trait. `SledStore` is the on-disk
//! implementation; `MemoryStore` backs tests and ephemeral sessions.

use canopy_core::{ContextStore, ProviderError, ProviderResult};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// On-disk store: one sled tree, JSON bytes per key.
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Opens or creates a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> ProviderResult<Self> {
        let db = sled::open(path).map_err(to_store_error)?;
        Ok(Self { db })
    }
}

impl ContextStore for SledStore {
    fn load(&self, key: &str) -> ProviderResult<Option<serde_json::Value>> {
        match self.db.get(key).map_err(to_store_error)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save(&self, key: &str, value: &serde_json::Value) -> ProviderResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.db.insert(key, bytes).map_err(to_store_error)?;
        self.db.flush().map_err(to_store_error)?;
        Ok(())
    }
}

fn to_store_error(err: sled::Error) -> ProviderError {
    ProviderError::Store(err.to_string())
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> ProviderResult<std::sync::MutexGuard<'_, HashMap<String, serde_json::Value>>> {
        self.values
            .lock()
            .map_err(|_| ProviderError::Store("memory store poisoned".into()))
    }
}

impl ContextStore for MemoryStore {
    fn load(&self, key: &str) -> ProviderResult<Option<serde_json::Value>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn save(&self, key: &str, value: &serde_json::Value) -> ProviderResult<()> {
        self.lock()?.insert(key.to_string(), value.clone());
        Ok(())
    }
}
