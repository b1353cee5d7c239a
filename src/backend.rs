use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use reqwest::Url;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// BackendCall
///
/// One request to the external delivery backend. The path is kept as raw
/// segments; each one is percent-encoded when the URL is built, so invoice
/// numbers and ids taken from the client cannot change the target route.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendCall {
    pub method: Method,
    pub segments: Vec<String>,
    /// Sent as `Authorization: Bearer <value>` when present.
    pub bearer: Option<String>,
    /// JSON request body.
    pub body: Option<Value>,
}

impl BackendCall {
    pub fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            bearer: None,
            body: None,
        }
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Path as it appears on the wire, e.g. `/orders/status/INV%2F7`.
    pub fn url_for(&self, base: &Url) -> Result<Url, BackendError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::InvalidUrl)?
            .pop_if_empty()
            .extend(&self.segments);
        Ok(url)
    }
}

/// BackendReply
///
/// Status and JSON body returned by the backend, relayed to the browser as is.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendReply {
    pub status: StatusCode,
    pub body: Value,
}

impl BackendReply {
    /// The `message` field of an error body, if the backend sent one.
    pub fn message(&self) -> Option<&str> {
        self.body
            .get("message")
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Transport(String),
    #[error("backend returned a non-JSON body: {0}")]
    InvalidBody(String),
    #[error("backend URL cannot carry a path")]
    InvalidUrl,
}

// 1. BackendService Contract
/// BackendService
///
/// The abstract contract for the external delivery backend. Handlers only see
/// this trait, so the HTTP client can be replaced by `MockBackend` in tests.
#[async_trait]
pub trait BackendService: Send + Sync {
    async fn send(&self, call: BackendCall) -> Result<BackendReply, BackendError>;
}

// 2. The Real Implementation
/// HttpBackend
///
/// `reqwest` client rooted at the configured `BACKEND_URL`.
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl BackendService for HttpBackend {
    async fn send(&self, call: BackendCall) -> Result<BackendReply, BackendError> {
        let url = call.url_for(&self.base_url)?;
        tracing::debug!(method = %call.method, path = url.path(), "forwarding to backend");

        let mut request = self.client.request(call.method, url);
        if let Some(token) = call.bearer {
            request = request.bearer_auth(token);
        }
        if let Some(body) = call.body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .json::<Value>()
            .await
            .map_err(|e| BackendError::InvalidBody(e.to_string()))?;

        Ok(BackendReply { status, body })
    }
}

// 3. The Mock Implementation (For Tests)
/// MockBackend
///
/// Answers every call with the same canned reply (or a transport failure) and
/// records what it was asked, so tests can assert on the forwarded request.
#[derive(Clone)]
pub struct MockBackend {
    reply: BackendReply,
    /// When true, every call fails as if the backend were unreachable.
    pub should_fail: bool,
    calls: Arc<Mutex<Vec<BackendCall>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::replying(StatusCode::OK, serde_json::json!({ "success": true }))
    }

    pub fn replying(status: StatusCode, body: Value) -> Self {
        Self {
            reply: BackendReply { status, body },
            should_fail: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new()
        }
    }

    /// Every call received so far, oldest first.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackendService for MockBackend {
    async fn send(&self, call: BackendCall) -> Result<BackendReply, BackendError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }

        if self.should_fail {
            return Err(BackendError::Transport(
                "Mock Backend Error: Simulation requested".to_string(),
            ));
        }

        Ok(self.reply.clone())
    }
}

/// BackendState
///
/// The shared handle to the backend client held in the application state.
pub type BackendState = Arc<dyn BackendService>;
