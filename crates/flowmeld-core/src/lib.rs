//! Core library for the FlowMeld client.
//!
//! - `auth`: session store, preferences, token claims, navigation signals
//! - `api`: transport, authenticated request gateway, typed API client
//! - `storage`: durable key/value persistence for tokens and preferences
//! - `context`: wires the pieces together for a front end
//!
//! There is exactly one session per running client. It is owned by
//! [`SessionStore`] and shared through an `Arc`, never through a global.

pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod models;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, ApiError, Gateway, HttpTransport, Transport};
pub use auth::{AccentColor, AuthState, Route, Session, SessionEvent, SessionStore, Theme};
pub use config::{Config, StorageBackend};
pub use context::AuthContext;
pub use models::{Persona, Task, TaskStatus, TokenPair, User};
pub use storage::{FileStorage, KeyringStorage, MemoryStorage, Storage, StorageKey};
