//! Backend REST API client.
//!
//! # Architecture
//!
//! - [`Transport`] executes raw requests (`reqwest` in production)
//! - [`ApiClient`] builds requests, attaches the bearer token from the
//!   shared [`AuthHeader`] at send time and decodes JSON responses
//! - [`endpoints`] holds every path this core calls
//!
//! The [`AuthHeader`] is the only channel through which the session's token
//! reaches outgoing requests. `SessionManager` writes it; every `ApiClient`
//! built with a clone of the same handle reads it.
//!
//! # Example
//!
//! ```rust,ignore
//! use hugscape_storefront::api::{ApiClient, AuthHeader, HttpTransport};
//!
//! let auth = AuthHeader::new();
//! let api = ApiClient::new(HttpTransport::new(&config)?, auth.clone());
//!
//! let categories: Vec<String> = api.get(endpoints::CATEGORIES).await?;
//! ```

pub mod endpoints;
mod transport;

pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request could not be handed to the transport.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend rejected the bearer token (or none was sent).
    #[error("Unauthorized{}", format_message(.message.as_deref()))]
    Unauthorized { message: Option<String> },

    /// The backend answered with a non-success status.
    #[error("API error: HTTP {status}{}", format_message(.message.as_deref()))]
    Status { status: u16, message: Option<String> },

    /// JSON (de)serialization failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ApiError {
    /// Human-readable message supplied by the backend, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { message } | Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Whether the failure means the current token is no longer accepted.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

fn format_message(message: Option<&str>) -> String {
    message.map_or_else(String::new, |m| format!(": {m}"))
}

/// Shared handle to the bearer token attached to outgoing requests.
///
/// Cloning yields another handle to the same slot.
#[derive(Clone, Default)]
pub struct AuthHeader {
    token: Arc<RwLock<Option<SecretString>>>,
}

impl AuthHeader {
    /// Create an empty handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `token` to every request sent from now on.
    pub fn set(&self, token: SecretString) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    /// Stop attaching a token.
    pub fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Whether a token is currently attached.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// The current token, if any.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The `Authorization` header value for the current token.
    #[must_use]
    pub fn bearer(&self) -> Option<SecretString> {
        self.token()
            .map(|token| SecretString::from(format!("Bearer {}", token.expose_secret())))
    }
}

impl fmt::Debug for AuthHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthHeader")
            .field("token", &if self.is_set() { "[REDACTED]" } else { "None" })
            .finish()
    }
}

/// Error body shape returned by the backend.
#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Extract the backend's human-readable message from an error body.
///
/// Only `message` is meant for users; the `error` field is a short code.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
}

/// JSON client for the backend API.
///
/// Cheaply cloneable; clones share the transport and the [`AuthHeader`].
pub struct ApiClient<T> {
    inner: Arc<ApiClientInner<T>>,
}

struct ApiClientInner<T> {
    transport: T,
    auth: AuthHeader,
}

impl<T> Clone for ApiClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> ApiClient<T> {
    /// Create a client sending through `transport` with tokens from `auth`.
    #[must_use]
    pub fn new(transport: T, auth: AuthHeader) -> Self {
        Self {
            inner: Arc::new(ApiClientInner { transport, auth }),
        }
    }

    /// The token handle this client reads from.
    #[must_use]
    pub fn auth(&self) -> &AuthHeader {
        &self.inner.auth
    }

    /// The underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// `GET` a JSON resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the backend answers with a
    /// non-success status, or the body does not decode as `R`.
    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        self.request(Method::Get, path, None).await
    }

    /// `PUT` a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be encoded, the request fails,
    /// the backend answers with a non-success status, or the response does
    /// not decode as `R`.
    pub async fn put<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        self.request(Method::Put, path, Some(body)).await
    }

    /// `POST` without a body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the backend answers with a
    /// non-success status, or the response does not decode as `R`.
    pub async fn post<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        self.request(Method::Post, path, None).await
    }

    #[instrument(skip(self, body), fields(method = %method))]
    async fn request<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<R, ApiError> {
        let request = ApiRequest {
            method,
            path: path.to_string(),
            authorization: self.inner.auth.bearer(),
            body,
        };

        let response = self.inner.transport.execute(request).await?;

        if response.status == 401 {
            return Err(ApiError::Unauthorized {
                message: error_message(&response.body),
            });
        }

        if !response.is_success() {
            tracing::warn!(
                status = response.status,
                body = %response.body.chars().take(500).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(ApiError::Status {
                status: response.status,
                message: error_message(&response.body),
            });
        }

        serde_json::from_str(&response.body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response.body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }
}
