//! Test doubles for the HTTP seam.
//!
//! [`ScriptedTransport`] answers requests from a per-route script and
//! records everything it was asked to send, including the `Authorization`
//! header as it was at send time.
//!
//! ```rust,ignore
//! let transport = Arc::new(ScriptedTransport::new());
//! transport.push(Method::Get, "/api/products", ScriptedResponse::json(&json!([])));
//! let api = ApiClient::new(Arc::clone(&transport), AuthHeader::new());
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use secrecy::ExposeSecret;
use serde_json::Value;

use crate::api::{ApiError, ApiRequest, ApiResponse, Method, Transport};

/// One scripted answer.
#[derive(Debug, Clone)]
pub struct ScriptedResponse {
    pub response: ApiResponse,
    /// Time to wait before answering.
    pub delay: Option<Duration>,
}

impl ScriptedResponse {
    /// `200 OK` with `body` as JSON.
    #[must_use]
    pub fn json(body: &Value) -> Self {
        Self::status(200, body.to_string())
    }

    /// Arbitrary status and raw body.
    #[must_use]
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            response: ApiResponse {
                status,
                body: body.into(),
            },
            delay: None,
        }
    }

    /// Answer only after `delay`.
    #[must_use]
    pub const fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// A request as the transport received it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug, Default)]
struct Script {
    routes: HashMap<(Method, String), VecDeque<ScriptedResponse>>,
    requests: Vec<RecordedRequest>,
}

/// Transport answering from a script instead of the network.
///
/// Responses queued for a route are consumed in order; the last one keeps
/// answering once the others are used up. Requests to a route with no
/// script fail with [`ApiError::Transport`].
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<Script>,
}

impl ScriptedTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue `response` for `method path`.
    pub fn push(&self, method: Method, path: impl Into<String>, response: ScriptedResponse) {
        self.lock()
            .routes
            .entry((method, path.into()))
            .or_default()
            .push_back(response);
    }

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Number of requests received for `path`.
    #[must_use]
    pub fn hits(&self, path: &str) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|request| request.path == path)
            .count()
    }

    fn answer(&self, request: &ApiRequest) -> Option<ScriptedResponse> {
        let mut script = self.lock();
        script.requests.push(RecordedRequest {
            method: request.method,
            path: request.path.clone(),
            authorization: request
                .authorization
                .as_ref()
                .map(|value| value.expose_secret().to_string()),
            body: request.body.clone(),
        });

        let queue = script
            .routes
            .get_mut(&(request.method, request.path.clone()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Transport for ScriptedTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let scripted = self.answer(&request).ok_or_else(|| {
            ApiError::Transport(format!(
                "no scripted response for {} {}",
                request.method, request.path
            ))
        })?;

        if let Some(delay) = scripted.delay {
            tokio::time::sleep(delay).await;
        }

        Ok(scripted.response)
    }
}
