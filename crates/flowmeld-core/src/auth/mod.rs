//! Authentication state for the client.
//!
//! This module provides:
//! - `SessionStore`: the single source of truth for tokens, profile and preferences
//! - `Theme`, `AccentColor`: cosmetic preferences persisted with the session
//! - `TokenClaims`: unverified JWT payload inspection for display
//! - `Route`, `SessionEvent`: navigation signals emitted on login/logout

pub mod claims;
pub mod navigation;
pub mod preferences;
pub mod session;

pub use claims::TokenClaims;
pub use navigation::{Route, SessionEvent};
pub use preferences::{AccentColor, Theme};
pub use session::{AuthState, Session, SessionStore};
