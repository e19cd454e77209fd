//! Request gateway that makes token possession and renewal transparent.
//!
//! Every request goes out with the current access token. When the server
//! answers 401 the gateway renews the token once and re-issues the request
//! once; if renewal is impossible the session is ended and the original
//! 401 is handed back. A logical call never triggers more than one renewal.

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{endpoints, ApiError, ApiRequest, ApiResponse, Transport};
use crate::auth::SessionStore;
use crate::models::{RefreshedToken, TokenPair};

pub struct Gateway {
    transport: Arc<dyn Transport>,
    session: Arc<SessionStore>,
    /// Serializes renewals so concurrent 401s share one refresh call.
    renewal: Mutex<()>,
}

impl Gateway {
    pub fn new(transport: Arc<dyn Transport>, session: Arc<SessionStore>) -> Self {
        Self {
            transport,
            session,
            renewal: Mutex::new(()),
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// The raw transport, for endpoints that must not carry a bearer token.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Send an authenticated request.
    ///
    /// Returns the server's response whatever its status; only transport
    /// failures are errors. A 401 is returned as-is when renewal failed or
    /// the renewed retry was rejected too.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut token = self.session.access_token().await;
        let mut retried = false;

        loop {
            let attempt = request.clone().with_bearer(token.clone());
            let response = self.transport.send(&attempt).await?;

            if response.status != StatusCode::UNAUTHORIZED || retried {
                return Ok(response);
            }
            retried = true;

            debug!(path = %request.path, "Authorization failed, renewing access token");
            match self.renew(token.as_deref()).await {
                Some(renewed) => token = Some(renewed),
                None => return Ok(response),
            }
        }
    }

    /// Exchange a refresh token for a new pair. Does not touch the session.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        let request = ApiRequest::post(endpoints::TOKEN_REFRESH, json!({ "refresh": refresh_token }));
        let response = self.transport.send(&request).await?.check()?;
        let refreshed: RefreshedToken = response.json()?;
        Ok(refreshed.into_pair(refresh_token))
    }

    /// Obtain an access token to retry with, given the token the failed
    /// request used. Returns `None` when the session cannot be renewed, in
    /// which case it has been ended.
    async fn renew(&self, rejected: Option<&str>) -> Option<String> {
        let _guard = self.renewal.lock().await;

        // Someone else renewed or ended the session while we waited.
        let current = self.session.access_token().await;
        if current.as_deref() != rejected {
            debug!(renewed = current.is_some(), "Session changed during renewal wait");
            return current;
        }

        let Some(refresh_token) = self.session.refresh_token().await else {
            warn!("No refresh token available, ending session");
            self.session.logout().await;
            return None;
        };

        match self.refresh(&refresh_token).await {
            Ok(pair) => {
                let access = pair.access.clone();
                self.session.login(pair.access, pair.refresh).await;
                info!("Access token renewed");
                Some(access)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, ending session");
                self.session.logout().await;
                None
            }
        }
    }
}
