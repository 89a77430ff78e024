//! Integration tests for the Hugscape storefront client core.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p hugscape-integration-tests
//! ```
//!
//! No backend is needed: requests are answered by
//! [`ScriptedTransport`] and the stores persist to memory or a temporary
//! directory.
//!
//! # Test Categories
//!
//! - `cart_persistence` - Cart snapshots across restarts and storage backends
//! - `catalog_queries` - Filters, overlapping requests, shared auth header
//! - `session_flow` - Startup, OAuth completion, refresh, logout

use std::path::Path;
use std::sync::Arc;

use hugscape_storefront::api::{ApiClient, AuthHeader};
use hugscape_storefront::storage::{FileStore, KeyValueStore, MemoryStore};
use hugscape_storefront::testing::ScriptedTransport;
use hugscape_storefront::{CartStore, CatalogQueryEngine, ClientConfig, SessionManager};
use serde_json::{Value, json};

pub use hugscape_storefront::api::Method;
pub use hugscape_storefront::testing::ScriptedResponse;

/// Collaborators shared by every store built from this context, mirroring
/// how an application wires them.
pub struct TestContext<S> {
    pub transport: Arc<ScriptedTransport>,
    pub storage: Arc<S>,
    pub auth: AuthHeader,
    pub config: ClientConfig,
}

impl TestContext<MemoryStore> {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_storage(MemoryStore::new())
    }
}

impl TestContext<FileStore> {
    /// Context persisting under `dir`.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created.
    #[must_use]
    pub fn on_disk(dir: &Path) -> Self {
        Self::with_storage(FileStore::open(dir).expect("open file store"))
    }
}

impl<S: KeyValueStore> TestContext<S> {
    #[must_use]
    pub fn with_storage(storage: S) -> Self {
        Self {
            transport: Arc::new(ScriptedTransport::new()),
            storage: Arc::new(storage),
            auth: AuthHeader::new(),
            config: ClientConfig::default(),
        }
    }

    #[must_use]
    pub fn api(&self) -> ApiClient<Arc<ScriptedTransport>> {
        ApiClient::new(Arc::clone(&self.transport), self.auth.clone())
    }

    #[must_use]
    pub fn cart(&self) -> CartStore<Arc<S>> {
        CartStore::new(Arc::clone(&self.storage))
    }

    #[must_use]
    pub fn catalog(&self) -> CatalogQueryEngine<Arc<ScriptedTransport>> {
        CatalogQueryEngine::new(self.api(), &self.config)
    }

    #[must_use]
    pub fn session(&self) -> SessionManager<Arc<ScriptedTransport>, Arc<S>> {
        SessionManager::new(self.api(), Arc::clone(&self.storage))
    }

    /// Answer `GET path` with `body`.
    pub fn respond_json(&self, path: &str, body: &Value) {
        self.transport
            .push(Method::Get, path, ScriptedResponse::json(body));
    }
}

/// Product record as the backend serves it.
#[must_use]
pub fn product_json(id: i64, name: &str, price: &str, stock: Option<u32>) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": format!("{name} for little adventurers"),
        "price": price,
        "category": "boys",
        "brand": "Hugscape",
        "sizes": ["S", "M", "L"],
        "colors": ["Red", "Blue"],
        "images": [format!("/images/{id}.jpg")],
        "stockQuantity": stock,
    })
}

/// User record as the identity callback and profile endpoint send it.
#[must_use]
pub fn user_json() -> Value {
    json!({
        "id": 11,
        "email": "parent@example.com",
        "name": "Sam Parent",
        "givenName": "Sam",
        "familyName": "Parent",
        "emailVerified": true,
        "createdAt": "2024-05-01T10:00:00",
        "lastLogin": "2024-05-02T08:30:00",
    })
}

/// Callback query string carrying `token` and a URL-encoded `user`.
#[must_use]
pub fn callback_query(token: &str, user: &Value) -> String {
    format!(
        "?token={token}&user={}",
        urlencoding::encode(&user.to_string())
    )
}
