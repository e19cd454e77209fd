//! Typed client for the FlowMeld REST API.
//!
//! Credential endpoints (`token/`, `register/`, `token/verify/`) go straight
//! to the transport; everything that needs a session goes through the
//! [`Gateway`] so expired access tokens are renewed transparently.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use tracing::{debug, info, warn};

use super::{endpoints, ApiError, ApiRequest, Gateway};
use crate::models::{Persona, Task, TokenPair, User};

/// Shown when registration fails without a field-specific message.
const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";

/// List endpoints answer with a bare array, or with a page object when
/// pagination is enabled on the server.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Page { results: Vec<T> },
    Plain(Vec<T>),
}

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Page { results } => results,
            Listing::Plain(items) => items,
        }
    }
}

/// Everything the dashboard cards show.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub tasks: Vec<Task>,
    pub persona: Option<Persona>,
}

impl Dashboard {
    pub fn active_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| t.status.is_active())
    }
}

/// Clone is cheap - the gateway is shared.
#[derive(Clone)]
pub struct ApiClient {
    gateway: Arc<Gateway>,
}

impl ApiClient {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    // ===== Credentials =====

    /// Exchange username and password for a token pair.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<TokenPair, ApiError> {
        let request = ApiRequest::post(
            endpoints::TOKEN,
            json!({ "username": username, "password": password }),
        );
        let response = self.gateway.transport().send(&request).await?;

        match response.status {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                debug!(status = %response.status, "Credentials rejected");
                Err(ApiError::InvalidCredentials)
            }
            _ => {
                let pair: TokenPair = response.check()?.json()?;
                info!(username = username, "Authenticated");
                Ok(pair)
            }
        }
    }

    /// Create an account. Does not sign in.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User, ApiError> {
        let request = ApiRequest::post(
            endpoints::REGISTER,
            json!({ "username": username, "email": email, "password": password }),
        );
        let response = self.gateway.transport().send(&request).await?;
        if !response.is_success() {
            let error = ApiError::from_status(response.status, &response.body);
            warn!(error = %error, "Registration rejected");
            return Err(match error {
                ApiError::Validation(_) => error,
                _ => ApiError::Validation(REGISTRATION_FAILED.to_string()),
            });
        }
        if response.status != StatusCode::CREATED {
            warn!(status = %response.status, "Unexpected registration status");
        }
        response.json()
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        self.gateway.refresh(refresh_token).await
    }

    /// Ask the server whether a token is still valid.
    pub async fn verify(&self, token: &str) -> Result<bool, ApiError> {
        let request = ApiRequest::post(endpoints::TOKEN_VERIFY, json!({ "token": token }));
        let response = self.gateway.transport().send(&request).await?;
        match response.status {
            status if status.is_success() => Ok(true),
            StatusCode::UNAUTHORIZED => Ok(false),
            _ => Err(ApiError::from_status(response.status, &response.body)),
        }
    }

    // ===== Authenticated endpoints =====

    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.get(endpoints::CURRENT_USER).await
    }

    pub async fn tasks(&self) -> Result<Vec<Task>, ApiError> {
        let listing: Listing<Task> = self.get(endpoints::TASKS).await?;
        let mut tasks = listing.into_vec();
        tasks.sort_by_key(|t| t.sort_key());
        Ok(tasks)
    }

    pub async fn personas(&self) -> Result<Vec<Persona>, ApiError> {
        let listing: Listing<Persona> = self.get(endpoints::PERSONAS).await?;
        Ok(listing.into_vec())
    }

    /// Free-form plan produced by the daily planner.
    pub async fn daily_suggestions(&self) -> Result<serde_json::Value, ApiError> {
        self.get(endpoints::DAILY_SUGGESTIONS).await
    }

    /// Fetch tasks and persona concurrently.
    pub async fn dashboard(&self) -> Result<Dashboard, ApiError> {
        let (tasks, personas) = futures::try_join!(self.tasks(), self.personas())?;
        Ok(Dashboard {
            tasks,
            persona: personas.into_iter().next(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.gateway
            .send(ApiRequest::get(path))
            .await?
            .check()?
            .json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionStore;
    use crate::storage::{MemoryStorage, StorageKey};
    use crate::testing::{bearer, json, status, MockTransport};
    use assert_matches::assert_matches;

    fn client(transport: Arc<MockTransport>, storage: MemoryStorage) -> ApiClient {
        let session = Arc::new(SessionStore::load(Arc::new(storage)));
        ApiClient::new(Arc::new(Gateway::new(transport, session)))
    }

    fn logged_in() -> MemoryStorage {
        MemoryStorage::with_entries([
            (StorageKey::AccessToken, "A1"),
            (StorageKey::RefreshToken, "R1"),
        ])
    }

    #[tokio::test]
    async fn test_authenticate_returns_pair() {
        let transport = MockTransport::new(|request| {
            assert_eq!(request.path, "token/");
            assert_eq!(
                request.body,
                Some(serde_json::json!({"username": "ada", "password": "pw"}))
            );
            json(200, serde_json::json!({"access": "A1", "refresh": "R1"}))
        });
        let client = client(transport, MemoryStorage::new());

        let pair = client.authenticate("ada", "pw").await.unwrap();
        assert_eq!(pair.access, "A1");
        assert_eq!(pair.refresh, "R1");
    }

    #[tokio::test]
    async fn test_authenticate_rejection_is_invalid_credentials() {
        for code in [400, 401] {
            let transport = MockTransport::new(move |_| status(code));
            let client = client(transport, MemoryStorage::new());
            assert_matches!(
                client.authenticate("ada", "wrong").await,
                Err(ApiError::InvalidCredentials)
            );
        }
    }

    #[tokio::test]
    async fn test_authenticate_bypasses_renewal() {
        // A stale session must not turn a bad password into a refresh attempt
        let transport = MockTransport::new(|_| status(401));
        let client = client(transport.clone(), logged_in());

        let _ = client.authenticate("ada", "wrong").await;

        assert_eq!(transport.count("token/refresh/"), 0);
        assert!(client.gateway().session().is_authenticated().await);
    }

    #[tokio::test]
    async fn test_register_reports_field_errors() {
        let transport = MockTransport::new(|_| {
            json(400, serde_json::json!({"username": ["A user with that username already exists."]}))
        });
        let client = client(transport, MemoryStorage::new());

        let err = client.register("ada", "ada@x.io", "longpassword").await.unwrap_err();
        assert_eq!(err.user_message(), "Username: A user with that username already exists.");
    }

    #[tokio::test]
    async fn test_register_without_field_errors_shows_generic_message() {
        for code in [400, 500] {
            let transport = MockTransport::new(move |_| {
                json(code, serde_json::json!({"non_field_errors": ["Something odd"]}))
            });
            let client = client(transport, MemoryStorage::new());

            let err = client.register("ada", "ada@x.io", "longpassword").await.unwrap_err();
            assert_eq!(err.user_message(), "Registration failed. Please try again.");
        }
    }

    #[tokio::test]
    async fn test_register_network_failure_is_not_masked() {
        let transport = MockTransport::new(|_| Err(ApiError::Transport("offline".into())));
        let client = client(transport, MemoryStorage::new());

        assert_matches!(
            client.register("ada", "ada@x.io", "longpassword").await,
            Err(ApiError::Transport(_))
        );
    }

    #[tokio::test]
    async fn test_register_returns_created_user() {
        let transport = MockTransport::new(|_| {
            json(201, serde_json::json!({"id": 1, "username": "ada", "email": "ada@x.io"}))
        });
        let client = client(transport, MemoryStorage::new());

        let user = client.register("ada", "ada@x.io", "longpassword").await.unwrap();
        assert_eq!(user.username, "ada");
    }

    #[tokio::test]
    async fn test_verify() {
        let transport = MockTransport::new(|request| match request.body.as_ref() {
            Some(body) if body["token"] == "good" => json(200, serde_json::json!({})),
            _ => status(401),
        });
        let client = client(transport, MemoryStorage::new());

        assert!(client.verify("good").await.unwrap());
        assert!(!client.verify("bad").await.unwrap());
    }

    #[tokio::test]
    async fn test_tasks_accepts_plain_and_paged_lists() {
        let task = serde_json::json!({"id": 1, "title": "Plan week", "status": "pending"});
        let plain = MockTransport::new({
            let task = task.clone();
            move |_: &ApiRequest| json(200, serde_json::json!([task.clone()]))
        });
        let paged = MockTransport::new(move |_: &ApiRequest| {
            json(200, serde_json::json!({"count": 1, "results": [task.clone()]}))
        });

        assert_eq!(client(plain, logged_in()).tasks().await.unwrap().len(), 1);
        assert_eq!(client(paged, logged_in()).tasks().await.unwrap()[0].title, "Plan week");
    }

    #[tokio::test]
    async fn test_expired_session_surfaces_unauthorized() {
        let transport = MockTransport::new(|_| status(401));
        let client = client(transport.clone(), logged_in());

        assert_matches!(client.current_user().await, Err(ApiError::Unauthorized));
        assert_eq!(transport.count("token/refresh/"), 1);
        assert!(!client.gateway().session().is_authenticated().await);
    }

    #[tokio::test]
    async fn test_dashboard_takes_first_persona() {
        let transport = MockTransport::new(|request| {
            assert_eq!(bearer(request), Some("A1"));
            match request.path.as_str() {
                "tasks/" => json(200, serde_json::json!([
                    {"id": 1, "title": "Done", "status": "completed"},
                    {"id": 2, "title": "Open", "status": "in_progress"}
                ])),
                "personas/" => json(200, serde_json::json!([
                    {"id": 9, "ai_generated_persona_summary": "Focused planner"}
                ])),
                other => panic!("unexpected request to {}", other),
            }
        });
        let client = client(transport, logged_in());

        let dashboard = client.dashboard().await.unwrap();
        let active: Vec<i64> = dashboard.active_tasks().map(|t| t.id).collect();
        assert_eq!(active, vec![2]);
        assert_eq!(dashboard.persona.map(|p| p.id), Some(9));
    }
}
