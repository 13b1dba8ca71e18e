//! Browser-style persisted key-value storage
//!
//! The app keeps its whole list as one JSON array under a single key. The
//! `Storage` trait models the origin-scoped store that survives reloads;
//! `MemoryStorage` is the normal backing and `BlockedStorage` stands in for a
//! browser that refuses storage access.

use crate::types::TodoList;
use crate::{Error, Result};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Origin-scoped key-value store
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// In-process storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries.lock().clear();
        Ok(())
    }
}

/// Storage with access denied, as when the user blocks site data
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockedStorage;

impl BlockedStorage {
    fn denied() -> Error {
        Error::StorageUnavailable("access to storage is blocked".to_string())
    }
}

impl Storage for BlockedStorage {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(Self::denied())
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(Self::denied())
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Err(Self::denied())
    }

    fn clear(&self) -> Result<()> {
        Err(Self::denied())
    }
}

/// Read the persisted list. A missing key is an empty list.
pub fn load_list(storage: &dyn Storage, key: &str) -> Result<TodoList> {
    match storage.get(key)? {
        Some(raw) => {
            let list: TodoList = serde_json::from_str(&raw)?;
            debug!("Loaded {} todo(s) from '{}'", list.len(), key);
            Ok(list)
        }
        None => Ok(TodoList::new()),
    }
}

/// Persist the whole list as a JSON array
pub fn save_list(storage: &dyn Storage, key: &str, list: &TodoList) -> Result<()> {
    let raw = serde_json::to_string(list)?;
    storage.set(key, &raw)?;
    debug!("Saved {} todo(s) to '{}'", list.len(), key);
    Ok(())
}
