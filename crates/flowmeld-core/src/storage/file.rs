use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use super::{Storage, StorageKey};

/// Session file name in the data directory
const SESSION_FILE: &str = "session.json";

/// Stores every key in a single JSON object on disk.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .context("Failed to read session file")?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).context("Failed to parse session file")
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, contents).context("Failed to write session file")?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: StorageKey) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key.as_str()))
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.as_str().to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: StorageKey) -> Result<()> {
        let mut entries = self.read_all()?;
        if entries.remove(key.as_str()).is_none() {
            return Ok(());
        }
        debug!(key = key.as_str(), "Removed stored entry");
        self.write_all(&entries)
    }
}
