//! Hugscape storefront client core.
//!
//! Keeps a shopping cart, a filtered catalog view and the signed-in session
//! consistent across restarts and overlapping network round trips, with no
//! knowledge of how any of it is rendered.
//!
//! # Stores
//!
//! - [`cart::CartStore`] - cart lines, totals, persisted snapshot
//! - [`catalog::CatalogQueryEngine`] - filters, product results, categories, brands
//! - [`session::SessionManager`] - user, bearer token, OAuth completion
//!
//! # Collaborators
//!
//! - [`storage`] - key/value persistence (memory or one file per key)
//! - [`api`] - JSON client over a pluggable [`api::Transport`], sharing the
//!   bearer token through an [`api::AuthHeader`]
//!
//! # Example
//!
//! ```rust,ignore
//! let config = ClientConfig::from_env()?;
//! let auth = AuthHeader::new();
//! let api = ApiClient::new(HttpTransport::new(&config)?, auth);
//! let storage = Arc::new(FileStore::open(&config.storage_dir)?);
//!
//! let cart = CartStore::new(Arc::clone(&storage));
//! let catalog = CatalogQueryEngine::new(api.clone(), &config);
//! let session = SessionManager::new(api, storage);
//!
//! session.restore().await;
//! catalog.initialize().await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod session;
pub mod storage;
pub mod telemetry;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use cart::{CartLine, CartStore};
pub use catalog::{CatalogQueryEngine, CatalogSnapshot, FilterPatch, FilterSet};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use session::{SessionManager, SessionSnapshot, SessionStatus};
