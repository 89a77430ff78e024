//! Catalog query state.
//!
//! [`CatalogQueryEngine`] owns the active [`FilterSet`], the current product
//! list and the known categories and brands. Every fetch records its own
//! loading/error state and never fails past its boundary: a failed request
//! leaves the previous results in place and records a message.
//!
//! # Ordering
//!
//! Requests are not cancelled. Each resource (products, categories, brands)
//! numbers its requests and only applies the response of the most recently
//! issued one; older responses that arrive late are dropped.
//!
//! # Filters
//!
//! Every filter mutation is published on a `watch` channel (see
//! [`CatalogQueryEngine::subscribe_filters`]). A mutation that leaves at
//! least one field set issues exactly one filtered fetch.

mod filters;

pub use filters::{FilterPatch, FilterSet};

use std::sync::{Mutex, MutexGuard, PoisonError};

use hugscape_core::{Product, ProductId};
use moka::future::Cache;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::api::{ApiClient, ApiError, Transport, endpoints};
use crate::config::ClientConfig;

const FETCH_PRODUCTS_FAILED: &str = "Failed to fetch products";
const SEARCH_FAILED: &str = "Failed to search products";
const BY_CATEGORY_FAILED: &str = "Failed to fetch products by category";
const BY_PRICE_RANGE_FAILED: &str = "Failed to fetch products by price range";
const BY_SIZE_FAILED: &str = "Failed to fetch products by size";
const BY_BRAND_FAILED: &str = "Failed to fetch products by brand";
const APPLY_FILTERS_FAILED: &str = "Failed to apply filters";
const FETCH_CATEGORIES_FAILED: &str = "Failed to fetch categories";
const FETCH_BRANDS_FAILED: &str = "Failed to fetch brands";

/// Loading and error status of one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadState {
    pub loading: bool,
    /// Message of the last failed fetch, cleared by the next success.
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct Resource<V> {
    value: V,
    load: LoadState,
    /// Sequence number of the most recently issued request.
    latest: u64,
}

impl<V> Resource<V> {
    fn begin(&mut self) -> u64 {
        self.latest += 1;
        self.load.loading = true;
        self.latest
    }

    /// Apply the outcome of request `seq`. Returns `false` if a newer
    /// request has been issued since, in which case nothing changes.
    fn finish(&mut self, seq: u64, result: Result<V, ApiError>, failure: &str) -> bool {
        if seq != self.latest {
            return false;
        }
        self.load.loading = false;
        match result {
            Ok(value) => {
                self.value = value;
                self.load.error = None;
            }
            Err(e) => {
                warn!(error = %e, "{failure}");
                self.load.error = Some(failure.to_string());
            }
        }
        true
    }
}

#[derive(Debug, Default)]
struct CatalogState {
    products: Resource<Vec<Product>>,
    categories: Resource<Vec<String>>,
    brands: Resource<Vec<String>>,
}

type Slot<V> = fn(&mut CatalogState) -> &mut Resource<V>;

fn products(state: &mut CatalogState) -> &mut Resource<Vec<Product>> {
    &mut state.products
}

fn categories(state: &mut CatalogState) -> &mut Resource<Vec<String>> {
    &mut state.categories
}

fn brands(state: &mut CatalogState) -> &mut Resource<Vec<String>> {
    &mut state.brands
}

/// Read-only view of the catalog for presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    pub filters: FilterSet,
    pub products: Vec<Product>,
    pub categories: Vec<String>,
    pub brands: Vec<String>,
    pub products_state: LoadState,
    pub categories_state: LoadState,
    pub brands_state: LoadState,
}

/// Catalog query state manager.
pub struct CatalogQueryEngine<T> {
    api: ApiClient<T>,
    state: Mutex<CatalogState>,
    filters: watch::Sender<FilterSet>,
    product_cache: Cache<ProductId, Product>,
}

impl<T: Transport> CatalogQueryEngine<T> {
    /// Create an engine with empty results.
    ///
    /// Nothing is fetched until [`initialize`](Self::initialize) or another
    /// operation is called.
    #[must_use]
    pub fn new(api: ApiClient<T>, config: &ClientConfig) -> Self {
        let product_cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.product_cache_ttl)
            .build();
        let (filters, _) = watch::channel(FilterSet::default());

        Self {
            api,
            state: Mutex::new(CatalogState::default()),
            filters,
            product_cache,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn load<V: DeserializeOwned>(&self, slot: Slot<V>, path: &str, failure: &str) {
        let seq = slot(&mut self.lock()).begin();
        let result = self.api.get::<V>(path).await;
        if !slot(&mut self.lock()).finish(seq, result, failure) {
            debug!(path, seq, "Dropping stale response");
        }
    }

    /// Fetch products, categories and brands concurrently.
    #[instrument(skip(self))]
    pub async fn initialize(&self) {
        tokio::join!(self.fetch_all(), self.fetch_categories(), self.fetch_brands());
    }

    /// Replace the product list with the full, unfiltered catalog.
    #[instrument(skip(self))]
    pub async fn fetch_all(&self) {
        self.load(products, endpoints::PRODUCTS, FETCH_PRODUCTS_FAILED)
            .await;
    }

    #[instrument(skip(self))]
    pub async fn fetch_categories(&self) {
        self.load(categories, endpoints::CATEGORIES, FETCH_CATEGORIES_FAILED)
            .await;
    }

    #[instrument(skip(self))]
    pub async fn fetch_brands(&self) {
        self.load(brands, endpoints::BRANDS, FETCH_BRANDS_FAILED)
            .await;
    }

    /// Replace the product list with free-text search results.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) {
        self.load(products, &endpoints::search(term), SEARCH_FAILED)
            .await;
    }

    #[instrument(skip(self))]
    pub async fn by_category(&self, category: &str) {
        self.load(products, &endpoints::by_category(category), BY_CATEGORY_FAILED)
            .await;
    }

    #[instrument(skip(self))]
    pub async fn by_price_range(&self, min: Decimal, max: Decimal) {
        self.load(
            products,
            &endpoints::by_price_range(min, max),
            BY_PRICE_RANGE_FAILED,
        )
        .await;
    }

    #[instrument(skip(self))]
    pub async fn by_size(&self, size: &str) {
        self.load(products, &endpoints::by_size(size), BY_SIZE_FAILED)
            .await;
    }

    #[instrument(skip(self))]
    pub async fn by_brand(&self, brand: &str) {
        self.load(products, &endpoints::by_brand(brand), BY_BRAND_FAILED)
            .await;
    }

    /// Merge `patch` into the filter set.
    ///
    /// Publishes the change and, if any field remains set, applies the
    /// filters.
    #[instrument(skip(self))]
    pub async fn update_filters(&self, patch: FilterPatch) {
        self.filters.send_modify(|filters| filters.merge(patch));
        if !self.filters.borrow().is_empty() {
            self.apply_filters().await;
        }
    }

    /// Reset every filter and fetch the unfiltered catalog.
    #[instrument(skip(self))]
    pub async fn clear_filters(&self) {
        self.filters.send_replace(FilterSet::default());
        self.fetch_all().await;
    }

    /// Fetch the product list narrowed by the current filter set.
    #[instrument(skip(self))]
    pub async fn apply_filters(&self) {
        let query = self.filters.borrow().query_string();
        self.load(products, &endpoints::filtered(&query), APPLY_FILTERS_FAILED)
            .await;
    }

    /// Look up a single product.
    ///
    /// Returns `None` on any failure. Successful lookups are cached for the
    /// configured TTL.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_by_id(&self, id: ProductId) -> Option<Product> {
        if let Some(product) = self.product_cache.get(&id).await {
            debug!("Cache hit for product");
            return Some(product);
        }

        match self.api.get::<Product>(&endpoints::product(id)).await {
            Ok(product) => {
                self.product_cache.insert(id, product.clone()).await;
                Some(product)
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch product");
                None
            }
        }
    }

    /// Observe filter changes. The receiver sees the current set
    /// immediately and every change after it.
    #[must_use]
    pub fn subscribe_filters(&self) -> watch::Receiver<FilterSet> {
        self.filters.subscribe()
    }

    /// Current filter set.
    #[must_use]
    pub fn filters(&self) -> FilterSet {
        self.filters.borrow().clone()
    }

    /// Current product list.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.lock().products.value.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> CatalogSnapshot {
        let filters = self.filters();
        let state = self.lock();
        CatalogSnapshot {
            filters,
            products: state.products.value.clone(),
            categories: state.categories.value.clone(),
            brands: state.brands.value.clone(),
            products_state: state.products.load.clone(),
            categories_state: state.categories.load.clone(),
            brands_state: state.brands.load.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::{Value, json};

    use super::*;
    use crate::api::{AuthHeader, Method};
    use crate::testing::{ScriptedResponse, ScriptedTransport};

    fn product_json(id: i64, name: &str) -> Value {
        json!({ "id": id, "name": name, "price": "10.00", "stockQuantity": 5 })
    }

    fn engine() -> (Arc<ScriptedTransport>, CatalogQueryEngine<Arc<ScriptedTransport>>) {
        let transport = Arc::new(ScriptedTransport::new());
        let api = ApiClient::new(Arc::clone(&transport), AuthHeader::new());
        let engine = CatalogQueryEngine::new(api, &ClientConfig::default());
        (transport, engine)
    }

    fn names(engine: &CatalogQueryEngine<Arc<ScriptedTransport>>) -> Vec<String> {
        engine.products().into_iter().map(|p| p.name).collect()
    }

    #[tokio::test]
    async fn test_initialize_populates_everything() {
        let (transport, engine) = engine();
        transport.push(
            Method::Get,
            "/api/products",
            ScriptedResponse::json(&json!([product_json(1, "Hoodie")])),
        );
        transport.push(
            Method::Get,
            "/api/products/categories",
            ScriptedResponse::json(&json!(["boys", "girls"])),
        );
        transport.push(
            Method::Get,
            "/api/products/brands",
            ScriptedResponse::json(&json!(["Hugscape"])),
        );

        engine.initialize().await;

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.products.len(), 1);
        assert_eq!(snapshot.categories, ["boys", "girls"]);
        assert_eq!(snapshot.brands, ["Hugscape"]);
        assert_eq!(snapshot.products_state, LoadState::default());
    }

    #[tokio::test]
    async fn test_failure_keeps_results_and_records_message() {
        let (transport, engine) = engine();
        transport.push(
            Method::Get,
            "/api/products",
            ScriptedResponse::json(&json!([product_json(1, "Hoodie")])),
        );
        engine.fetch_all().await;

        transport.push(
            Method::Get,
            "/api/products/search?q=bear",
            ScriptedResponse::status(500, r#"{"error":"boom"}"#),
        );
        engine.search("bear").await;

        let snapshot = engine.snapshot();
        assert_eq!(names(&engine), ["Hoodie"]);
        assert!(!snapshot.products_state.loading);
        assert_eq!(
            snapshot.products_state.error.as_deref(),
            Some("Failed to search products")
        );
    }

    #[tokio::test]
    async fn test_success_clears_previous_error() {
        let (transport, engine) = engine();
        engine.fetch_brands().await;
        assert_eq!(
            engine.snapshot().brands_state.error.as_deref(),
            Some("Failed to fetch brands")
        );

        transport.push(
            Method::Get,
            "/api/products/brands",
            ScriptedResponse::json(&json!(["Hugscape"])),
        );
        engine.fetch_brands().await;
        assert_eq!(engine.snapshot().brands_state.error, None);
    }

    #[tokio::test]
    async fn test_single_dimension_queries_hit_expected_paths() {
        let (transport, engine) = engine();
        let list = ScriptedResponse::json(&json!([product_json(2, "Socks")]));
        for path in [
            "/api/products/category/boys",
            "/api/products/price-range?minPrice=5&maxPrice=20.5",
            "/api/products/size/M",
            "/api/products/brand/Hug%20scape",
        ] {
            transport.push(Method::Get, path, list.clone());
        }

        engine.by_category("boys").await;
        engine
            .by_price_range(Decimal::from(5), Decimal::from_str("20.5").unwrap())
            .await;
        engine.by_size("M").await;
        engine.by_brand("Hug scape").await;

        assert_eq!(names(&engine), ["Socks"]);
        assert_eq!(engine.snapshot().products_state.error, None);
        assert_eq!(transport.requests().len(), 4);
    }

    #[tokio::test]
    async fn test_filter_updates_accumulate_and_fetch_once_each() {
        let (transport, engine) = engine();
        let list = ScriptedResponse::json(&json!([product_json(3, "Bear")]));
        transport.push(Method::Get, "/api/products?category=boys", list.clone());
        transport.push(
            Method::Get,
            "/api/products?category=boys&minPrice=10",
            list,
        );

        engine
            .update_filters(FilterPatch::default().category("boys"))
            .await;
        engine
            .update_filters(FilterPatch::default().min_price("10"))
            .await;

        assert_eq!(engine.filters().query_string(), "category=boys&minPrice=10");
        assert_eq!(transport.hits("/api/products?category=boys"), 1);
        assert_eq!(transport.hits("/api/products?category=boys&minPrice=10"), 1);
        assert_eq!(names(&engine), ["Bear"]);
    }

    #[tokio::test]
    async fn test_update_leaving_filters_empty_does_not_fetch() {
        let (transport, engine) = engine();
        engine.update_filters(FilterPatch::default().size("")).await;
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_clear_filters_refetches_unfiltered_list() {
        let (transport, engine) = engine();
        transport.push(
            Method::Get,
            "/api/products?brand=Hugscape",
            ScriptedResponse::json(&json!([])),
        );
        transport.push(
            Method::Get,
            "/api/products",
            ScriptedResponse::json(&json!([product_json(1, "Hoodie"), product_json(2, "Socks")])),
        );

        engine
            .update_filters(FilterPatch::default().brand("Hugscape"))
            .await;
        engine.clear_filters().await;

        assert!(engine.filters().is_empty());
        assert_eq!(names(&engine), ["Hoodie", "Socks"]);
    }

    #[tokio::test]
    async fn test_filter_changes_are_published() {
        let (transport, engine) = engine();
        transport.push(
            Method::Get,
            "/api/products?size=L",
            ScriptedResponse::json(&json!([])),
        );
        let mut filters = engine.subscribe_filters();

        engine.update_filters(FilterPatch::default().size("L")).await;

        assert!(filters.has_changed().unwrap());
        assert_eq!(filters.borrow_and_update().size.as_deref(), Some("L"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_dropped() {
        let (transport, engine) = engine();
        transport.push(
            Method::Get,
            "/api/products/search?q=slow",
            ScriptedResponse::json(&json!([product_json(1, "Slow")]))
                .delayed(Duration::from_millis(200)),
        );
        transport.push(
            Method::Get,
            "/api/products/search?q=fast",
            ScriptedResponse::json(&json!([product_json(2, "Fast")]))
                .delayed(Duration::from_millis(10)),
        );

        tokio::join!(engine.search("slow"), engine.search("fast"));

        assert_eq!(names(&engine), ["Fast"]);
        assert!(!engine.snapshot().products_state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_failure_does_not_record_error() {
        let (transport, engine) = engine();
        transport.push(
            Method::Get,
            "/api/products/size/XS",
            ScriptedResponse::status(503, "").delayed(Duration::from_millis(200)),
        );
        transport.push(
            Method::Get,
            "/api/products/size/S",
            ScriptedResponse::json(&json!([product_json(4, "Tee")])),
        );

        tokio::join!(engine.by_size("XS"), engine.by_size("S"));

        assert_eq!(names(&engine), ["Tee"]);
        assert_eq!(engine.snapshot().products_state.error, None);
    }

    #[tokio::test]
    async fn test_get_by_id_returns_none_on_failure() {
        let (transport, engine) = engine();
        transport.push(
            Method::Get,
            "/api/products/9",
            ScriptedResponse::status(404, r#"{"error":"Not found"}"#),
        );

        assert!(engine.get_by_id(ProductId::new(9)).await.is_none());
    }

    #[tokio::test]
    async fn test_get_by_id_caches_success() {
        let (transport, engine) = engine();
        transport.push(
            Method::Get,
            "/api/products/1",
            ScriptedResponse::json(&product_json(1, "Hoodie")),
        );

        let first = engine.get_by_id(ProductId::new(1)).await.unwrap();
        let second = engine.get_by_id(ProductId::new(1)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(transport.hits("/api/products/1"), 1);
    }
}
