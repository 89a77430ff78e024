//! Backend paths.
//!
//! Path segments are percent-encoded like `encodeURIComponent`; query
//! strings are form-encoded.

use hugscape_core::ProductId;
use rust_decimal::Decimal;
use url::form_urlencoded;

/// Full product list; also the base for filtered queries.
pub const PRODUCTS: &str = "/api/products";
pub const CATEGORIES: &str = "/api/products/categories";
pub const BRANDS: &str = "/api/products/brands";

pub const PROFILE: &str = "/api/auth/profile";
pub const REFRESH_TOKEN: &str = "/api/auth/refresh";

/// Identity-provider login entry point (a navigation target, not an API call).
pub const OAUTH_LOGIN: &str = "/api/oauth2/authorization/google";

/// Free-text search.
#[must_use]
pub fn search(term: &str) -> String {
    let query: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("q", term)
        .finish();
    format!("{PRODUCTS}/search?{query}")
}

#[must_use]
pub fn by_category(category: &str) -> String {
    format!("{PRODUCTS}/category/{}", urlencoding::encode(category))
}

#[must_use]
pub fn by_price_range(min: Decimal, max: Decimal) -> String {
    format!("{PRODUCTS}/price-range?minPrice={min}&maxPrice={max}")
}

#[must_use]
pub fn by_size(size: &str) -> String {
    format!("{PRODUCTS}/size/{}", urlencoding::encode(size))
}

#[must_use]
pub fn by_brand(brand: &str) -> String {
    format!("{PRODUCTS}/brand/{}", urlencoding::encode(brand))
}

#[must_use]
pub fn product(id: ProductId) -> String {
    format!("{PRODUCTS}/{id}")
}

/// Product list narrowed by an already-built query string.
#[must_use]
pub fn filtered(query: &str) -> String {
    if query.is_empty() {
        PRODUCTS.to_string()
    } else {
        format!("{PRODUCTS}?{query}")
    }
}
