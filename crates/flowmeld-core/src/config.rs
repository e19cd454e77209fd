//! Client configuration management.
//!
//! Configuration is stored at `~/.config/flowmeld/config.json` and holds the
//! API base URL, the storage backend for tokens and the last used username.
//! `FLOWMELD_API_BASE_URL` overrides the stored base URL.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::storage::{FileStorage, KeyringStorage, MemoryStorage, Storage};

/// Application name used for config/data directory paths
const APP_NAME: &str = "flowmeld";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding `api_base_url`
pub const BASE_URL_ENV: &str = "FLOWMELD_API_BASE_URL";

const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/";

/// HTTP request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where tokens and preferences are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub storage: StorageBackend,
    pub request_timeout_secs: u64,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            storage: StorageBackend::default(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            last_username: None,
        }
    }
}

impl Config {
    /// Load from the default location and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(std::env::var(BASE_URL_ENV).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn apply_overrides(&mut self, base_url: Option<String>) {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            debug!(url = %url, "API base URL overridden from environment");
            self.api_base_url = url;
        }
    }

    /// Base URL with a trailing slash, so relative endpoint paths join onto it.
    pub fn base_url(&self) -> String {
        let url = self.api_base_url.trim();
        if url.ends_with('/') {
            url.to_string()
        } else {
            format!("{}/", url)
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Open the configured storage backend.
    pub fn open_storage(&self) -> Result<Arc<dyn Storage>> {
        let storage: Arc<dyn Storage> = match self.storage {
            StorageBackend::File => Arc::new(FileStorage::new(self.data_dir()?)),
            StorageBackend::Keyring => Arc::new(KeyringStorage::new()),
            StorageBackend::Memory => Arc::new(MemoryStorage::new()),
        };
        Ok(storage)
    }
}
