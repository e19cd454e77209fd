//! The authentication context a front end talks to.
//!
//! `AuthContext` owns the one session store, the gateway every request goes
//! through and the typed API client. Pages call its operations in reaction
//! to user input and follow the `SessionEvent`s it broadcasts for
//! navigation.

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError, Gateway, HttpTransport, Transport};
use crate::auth::{AccentColor, Session, SessionEvent, SessionStore, Theme};
use crate::config::Config;
use crate::models::User;
use crate::storage::Storage;

pub struct AuthContext {
    session: Arc<SessionStore>,
    api: ApiClient,
    /// Background task fetching the profile after each login.
    profile_listener: Mutex<Option<JoinHandle<()>>>,
}

impl AuthContext {
    pub fn new(transport: Arc<dyn Transport>, storage: Arc<dyn Storage>) -> Arc<Self> {
        let session = Arc::new(SessionStore::load(storage));
        let gateway = Arc::new(Gateway::new(transport, session.clone()));
        Arc::new(Self {
            session,
            api: ApiClient::new(gateway),
            profile_listener: Mutex::new(None),
        })
    }

    /// Build the context from configuration: HTTP transport against the
    /// configured base URL and the configured storage backend.
    pub fn from_config(config: &Config) -> Result<Arc<Self>> {
        let transport = HttpTransport::new(&config.base_url(), config.request_timeout())?;
        let storage = config.open_storage()?;
        debug!(base_url = %transport.base_url(), storage = ?config.storage, "Auth context configured");
        Ok(Self::new(Arc::new(transport), storage))
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub async fn snapshot(&self) -> Session {
        self.session.snapshot().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.session.subscribe()
    }

    /// Start fetching the user profile after every login, including logins
    /// committed by a token renewal. Installing again replaces the previous
    /// listener, so each login triggers exactly one fetch.
    pub fn install(self: &Arc<Self>) {
        let mut events = self.session.subscribe();
        let context = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::LoggedIn) => {}
                    Ok(SessionEvent::LoggedOut) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Profile listener lagged behind session events");
                    }
                    Err(RecvError::Closed) => break,
                }
                let Some(context) = context.upgrade() else {
                    break;
                };
                context.fetch_user().await;
            }
        });

        let previous = self
            .profile_listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            debug!("Replacing existing profile listener");
            previous.abort();
        }
    }

    pub async fn login(&self, access: impl Into<String>, refresh: impl Into<String>) {
        self.session.login(access, refresh).await;
    }

    /// Sign in with credentials. A rejection leaves the session untouched.
    pub async fn login_with_password(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let pair = self.api.authenticate(username, password).await?;
        self.session.login(pair.access, pair.refresh).await;
        Ok(())
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User, ApiError> {
        let user = self.api.register(username, email, password).await?;
        info!(username = %user.username, "Account registered");
        Ok(user)
    }

    pub async fn logout(&self) {
        self.session.logout().await;
    }

    /// Exchange the stored refresh token for a new pair right away.
    ///
    /// A rejected refresh token ends the session. Other failures leave it
    /// alone so the next request can try again.
    pub async fn renew(&self) -> Result<(), ApiError> {
        let Some(refresh_token) = self.session.refresh_token().await else {
            return Err(ApiError::Unauthorized);
        };
        match self.api.refresh(&refresh_token).await {
            Ok(pair) => {
                self.session.login(pair.access, pair.refresh).await;
                info!("Access token renewed on request");
                Ok(())
            }
            Err(e) if e.is_unauthorized() => {
                warn!("Refresh token rejected, ending session");
                self.session.logout().await;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Load the profile of the signed-in user.
    ///
    /// Without an access token the session is marked anonymous and no
    /// request is made. Any failure to load the profile ends the session,
    /// unless the session already ended while the request was in flight.
    pub async fn fetch_user(&self) -> Option<User> {
        if self.session.access_token().await.is_none() {
            self.session.mark_anonymous().await;
            return None;
        }

        let generation = self.session.generation().await;
        match self.api.current_user().await {
            Ok(user) => {
                if self.session.set_user(generation, user.clone()).await {
                    debug!(username = %user.username, "Profile loaded");
                    Some(user)
                } else {
                    None
                }
            }
            Err(e) => {
                if self.session.generation().await != generation {
                    debug!(error = %e, "Profile fetch failed after session ended");
                    return None;
                }
                warn!(error = %e, "Failed to fetch user profile, ending session");
                self.session.logout().await;
                None
            }
        }
    }

    pub async fn set_theme(&self, theme: Theme) {
        self.session.set_theme(theme).await;
    }

    pub async fn set_accent_color(&self, color: AccentColor) {
        self.session.set_accent_color(color).await;
    }
}

impl Drop for AuthContext {
    fn drop(&mut self) {
        let listener = self
            .profile_listener
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = listener {
            handle.abort();
        }
    }
}
