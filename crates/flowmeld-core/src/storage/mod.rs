//! Durable client-side storage for tokens and preferences.
//!
//! This module provides:
//! - `Storage`: the key/value trait the session store persists through
//! - `FileStorage`: a JSON file in the data directory
//! - `KeyringStorage`: OS keychain entries, one per key
//! - `MemoryStorage`: an in-process map for tests and throwaway sessions

pub mod file;
pub mod keychain;
pub mod memory;

use anyhow::Result;

pub use keychain::KeyringStorage;
pub use file::FileStorage;
pub use memory::MemoryStorage;

/// The entries the client persists between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    AccessToken,
    RefreshToken,
    Theme,
    AccentColor,
}

impl StorageKey {
    pub const ALL: [StorageKey; 4] = [
        StorageKey::AccessToken,
        StorageKey::RefreshToken,
        StorageKey::Theme,
        StorageKey::AccentColor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::AccessToken => "access_token",
            StorageKey::RefreshToken => "refresh_token",
            StorageKey::Theme => "theme",
            StorageKey::AccentColor => "accent_color",
        }
    }
}

/// Key/value persistence that survives a process restart.
///
/// Removing a key that is not stored is not an error.
pub trait Storage: Send + Sync {
    fn get(&self, key: StorageKey) -> Result<Option<String>>;
    fn set(&self, key: StorageKey, value: &str) -> Result<()>;
    fn remove(&self, key: StorageKey) -> Result<()>;
}
