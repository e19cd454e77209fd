//! Scripted transport shared by the unit tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::api::{ApiError, ApiRequest, ApiResponse, Transport};

type Handler = Box<dyn Fn(&ApiRequest) -> Result<ApiResponse, ApiError> + Send + Sync>;

pub(crate) struct MockTransport {
    handler: Handler,
    delay: Duration,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new(
        handler: impl Fn(&ApiRequest) -> Result<ApiResponse, ApiError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Self::with_delay(Duration::ZERO, handler)
    }

    /// Every response is held back by `delay`, so concurrent callers overlap.
    pub fn with_delay(
        delay: Duration,
        handler: impl Fn(&ApiRequest) -> Result<ApiResponse, ApiError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            delay,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }

    /// Bearer tokens sent to `path`, in order.
    pub fn bearers(&self, path: &str) -> Vec<Option<String>> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .map(|r| r.bearer)
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.handler)(request)
    }
}

pub(crate) fn json(status: u16, body: serde_json::Value) -> Result<ApiResponse, ApiError> {
    Ok(ApiResponse::new(
        StatusCode::from_u16(status).unwrap(),
        body.to_string(),
    ))
}

pub(crate) fn status(status: u16) -> Result<ApiResponse, ApiError> {
    Ok(ApiResponse::new(StatusCode::from_u16(status).unwrap(), ""))
}

pub(crate) fn bearer(request: &ApiRequest) -> Option<&str> {
    request.bearer.as_deref()
}
