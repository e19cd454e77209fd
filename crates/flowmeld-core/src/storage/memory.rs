use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};

use super::{Storage, StorageKey};

/// Keeps entries for the lifetime of the process only.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<StorageKey, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a set of pre-existing entries, as if read from disk.
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (StorageKey, &'a str)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k, v.to_string()))
            .collect();
        Self {
            entries: Mutex::new(entries),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().map(|e| e.is_empty()).unwrap_or(true)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<StorageKey, String>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow!("memory storage lock poisoned"))
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: StorageKey) -> Result<Option<String>> {
        Ok(self.lock()?.get(&key).cloned())
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<()> {
        self.lock()?.insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<()> {
        self.lock()?.remove(&key);
        Ok(())
    }
}
