use std::fmt;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use super::{AccentColor, SessionEvent, Theme};
use crate::models::User;
use crate::storage::{Storage, StorageKey};

/// Capacity of the session event channel. Events are tiny and listeners
/// only need the latest transition, so lagging receivers are acceptable.
const EVENT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated,
}

/// Snapshot of the client-side session.
///
/// `is_authenticated` implies `access_token.is_some()`. `user` may be absent
/// while authenticated: the profile fetch may still be in flight.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub is_authenticated: bool,
    pub user: Option<User>,
    pub theme: Theme,
    pub accent_color: AccentColor,
}

impl Session {
    pub fn state(&self) -> AuthState {
        if self.is_authenticated {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("has_access_token", &self.access_token.is_some())
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("is_authenticated", &self.is_authenticated)
            .field("user", &self.user)
            .field("theme", &self.theme)
            .field("accent_color", &self.accent_color)
            .finish()
    }
}

struct Inner {
    session: Session,
    /// Bumped on every logout. Work started under an older generation must
    /// not write into the session.
    generation: u64,
}

/// Owns the session and its persistence.
///
/// Created once at startup from durable storage and shared through an `Arc`.
/// All transitions persist first and then update memory while holding the
/// write lock, so storage and memory never disagree for an observer. Storage
/// calls run on the blocking pool; the file and keychain backends do
/// synchronous I/O.
pub struct SessionStore {
    storage: Arc<dyn Storage>,
    inner: RwLock<Inner>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    /// Build the session from whatever was persisted by a previous run.
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let access_token = read_entry(storage.as_ref(), StorageKey::AccessToken);
        let refresh_token = read_entry(storage.as_ref(), StorageKey::RefreshToken);
        let theme = read_entry(storage.as_ref(), StorageKey::Theme)
            .map(|value| {
                value.parse().unwrap_or_else(|e| {
                    warn!(error = %e, "Ignoring stored theme");
                    Theme::default()
                })
            })
            .unwrap_or_default();
        let accent_color = read_entry(storage.as_ref(), StorageKey::AccentColor)
            .map(|value| {
                value.parse().unwrap_or_else(|e| {
                    warn!(error = %e, "Ignoring stored accent color");
                    AccentColor::default()
                })
            })
            .unwrap_or_default();

        let is_authenticated = access_token.is_some();
        debug!(
            is_authenticated,
            has_refresh_token = refresh_token.is_some(),
            %theme,
            %accent_color,
            "Session loaded"
        );

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            storage,
            inner: RwLock::new(Inner {
                session: Session {
                    access_token,
                    refresh_token,
                    is_authenticated,
                    user: None,
                    theme,
                    accent_color,
                },
                generation: 0,
            }),
            events,
        }
    }

    /// Store a new token pair and mark the session authenticated.
    ///
    /// Also used to commit a refreshed pair. Listeners receive
    /// `SessionEvent::LoggedIn`, which triggers the profile fetch.
    pub async fn login(&self, access: impl Into<String>, refresh: impl Into<String>) {
        let access = access.into();
        let refresh = refresh.into();

        {
            let mut inner = self.inner.write().await;
            self.persist(vec![
                (StorageKey::AccessToken, access.clone()),
                (StorageKey::RefreshToken, refresh.clone()),
            ])
            .await;
            inner.session.access_token = Some(access);
            inner.session.refresh_token = Some(refresh);
            inner.session.is_authenticated = true;
        }

        info!("Session authenticated");
        let _ = self.events.send(SessionEvent::LoggedIn);
    }

    /// Clear tokens, profile and preferences, in storage and in memory.
    ///
    /// Idempotent: an anonymous session stays anonymous.
    pub async fn logout(&self) {
        let was_authenticated = {
            let mut inner = self.inner.write().await;
            self.with_storage(|storage| {
                for key in StorageKey::ALL {
                    if let Err(e) = storage.remove(key) {
                        warn!(key = key.as_str(), error = %e, "Failed to clear stored entry");
                    }
                }
            })
            .await;
            let was_authenticated = inner.session.is_authenticated;
            inner.session = Session::default();
            inner.generation += 1;
            was_authenticated
        };

        info!(was_authenticated, "Session cleared");
        let _ = self.events.send(SessionEvent::LoggedOut);
    }

    /// Drop the profile and authentication flag without touching storage.
    /// Used when a profile lookup is requested with no token at all.
    pub async fn mark_anonymous(&self) {
        let mut inner = self.inner.write().await;
        inner.session.user = None;
        inner.session.is_authenticated = false;
    }

    /// Apply a fetched profile if the session is still the one the fetch
    /// was started for. Returns whether the profile was applied.
    pub async fn set_user(&self, generation: u64, user: User) -> bool {
        let mut inner = self.inner.write().await;
        if inner.generation != generation || inner.session.access_token.is_none() {
            debug!(
                started = generation,
                current = inner.generation,
                "Discarding profile for a session that has ended"
            );
            return false;
        }
        inner.session.user = Some(user);
        inner.session.is_authenticated = true;
        true
    }

    pub async fn set_theme(&self, theme: Theme) {
        let mut inner = self.inner.write().await;
        self.persist(vec![(StorageKey::Theme, theme.as_str().to_string())]).await;
        inner.session.theme = theme;
    }

    pub async fn set_accent_color(&self, color: AccentColor) {
        let mut inner = self.inner.write().await;
        self.persist(vec![(StorageKey::AccentColor, color.as_str().to_string())]).await;
        inner.session.accent_color = color;
    }

    pub async fn snapshot(&self) -> Session {
        self.inner.read().await.session.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.inner.read().await.session.access_token.clone()
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.inner.read().await.session.refresh_token.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.read().await.session.is_authenticated
    }

    pub async fn user(&self) -> Option<User> {
        self.inner.read().await.session.user.clone()
    }

    pub async fn generation(&self) -> u64 {
        self.inner.read().await.generation
    }

    /// Receive login/logout transitions from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn persist(&self, entries: Vec<(StorageKey, String)>) {
        self.with_storage(move |storage| {
            for (key, value) in entries {
                if let Err(e) = storage.set(key, &value) {
                    warn!(key = key.as_str(), error = %e, "Failed to persist session entry");
                }
            }
        })
        .await;
    }

    async fn with_storage<F>(&self, op: F)
    where
        F: FnOnce(&dyn Storage) + Send + 'static,
    {
        let storage = self.storage.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || op(storage.as_ref())).await {
            warn!(error = %e, "Storage task failed");
        }
    }
}

fn read_entry(storage: &dyn Storage, key: StorageKey) -> Option<String> {
    match storage.get(key) {
        Ok(value) => value,
        Err(e) => {
            warn!(key = key.as_str(), error = %e, "Failed to read stored entry");
            None
        }
    }
}
