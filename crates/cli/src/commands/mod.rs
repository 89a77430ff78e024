//! Command implementations.
//!
//! Every command builds the stores it needs from a shared [`Context`] and
//! reports through `tracing`.

pub mod cart;
pub mod catalog;
pub mod session;

use std::sync::Arc;

use hugscape_core::ProductId;
use hugscape_storefront::api::{ApiClient, AuthHeader, HttpTransport};
use hugscape_storefront::session::{SessionError, persisted_token};
use hugscape_storefront::storage::FileStore;
use hugscape_storefront::{CartStore, CatalogQueryEngine, ClientConfig, SessionManager};
use thiserror::Error;

/// Log filter used when `RUST_LOG` is unset.
pub const LOG_FILTER: &str = "hugscape=info,hugscape_storefront=warn";

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Client(#[from] hugscape_storefront::Error),

    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A store recorded a failure message instead of returning an error.
    #[error("{0}")]
    Failed(String),
}

impl From<SessionError> for CommandError {
    fn from(e: SessionError) -> Self {
        Self::Client(e.into())
    }
}

/// Configuration plus the collaborators every store is built from.
pub struct Context {
    config: ClientConfig,
    api: ApiClient<HttpTransport>,
    storage: Arc<FileStore>,
}

impl Context {
    /// Load configuration from the environment and open storage.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid, the HTTP client cannot
    /// be built, or the storage directory cannot be created.
    pub fn load() -> Result<Self, hugscape_storefront::Error> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Build the context for `config`. A token saved by an earlier sign-in
    /// is attached to every request, whichever store sends it.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the storage
    /// directory cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self, hugscape_storefront::Error> {
        let auth = AuthHeader::new();
        let storage = Arc::new(FileStore::open(config.storage_dir.clone())?);
        if let Some(token) = persisted_token(&*storage) {
            auth.set(token);
        }
        let api = ApiClient::new(HttpTransport::new(&config)?, auth);

        Ok(Self {
            config,
            api,
            storage,
        })
    }

    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cart(&self) -> CartStore<Arc<FileStore>> {
        CartStore::new(Arc::clone(&self.storage))
    }

    pub fn catalog(&self) -> CatalogQueryEngine<HttpTransport> {
        CatalogQueryEngine::new(self.api.clone(), &self.config)
    }

    pub fn session(&self) -> SessionManager<HttpTransport, Arc<FileStore>> {
        SessionManager::new(self.api.clone(), Arc::clone(&self.storage))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hugscape_storefront::storage::{KeyValueStore, TOKEN_KEY};

    use super::*;

    fn config(dir: &std::path::Path) -> ClientConfig {
        ClientConfig {
            storage_dir: dir.to_path_buf(),
            ..ClientConfig::default()
        }
    }

    #[test]
    fn test_saved_token_reaches_catalog_requests() {
        let dir = tempfile::tempdir().unwrap();
        FileStore::open(dir.path()).unwrap().save(TOKEN_KEY, "abc").unwrap();

        let ctx = Context::new(config(dir.path())).unwrap();

        assert!(ctx.api.auth().is_set());
    }

    #[test]
    fn test_no_saved_token_sends_no_header() {
        let dir = tempfile::tempdir().unwrap();

        let ctx = Context::new(config(dir.path())).unwrap();

        assert!(!ctx.api.auth().is_set());
    }
}
