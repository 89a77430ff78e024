//! Catalog product record.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ProductId;

/// A product as served by the catalog API.
///
/// Only `id`, `name` and `price` are guaranteed by the backend; list fields
/// default to empty when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price in the store currency.
    pub price: Decimal,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub care_instructions: Option<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    /// Image URLs, primary image first.
    #[serde(default)]
    pub images: Vec<String>,
    /// Units in stock, if the backend tracks it.
    #[serde(default)]
    pub stock_quantity: Option<u32>,
}

impl Product {
    /// The primary image URL, if the product has any images.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Maximum quantity a shopper may hold in a cart (0 when stock is unknown).
    #[must_use]
    pub fn max_purchasable(&self) -> u32 {
        self.stock_quantity.unwrap_or(0)
    }

    /// Whether at least one unit is in stock.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.max_purchasable() > 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_deserialize_backend_product() {
        let json = r#"{
            "id": 12,
            "name": "Cloud Hoodie",
            "description": "Soft fleece",
            "price": 39.99,
            "category": "boys",
            "brand": "Hugscape",
            "sizes": ["S", "M"],
            "colors": ["Red"],
            "images": ["/img/hoodie-front.jpg", "/img/hoodie-back.jpg"],
            "stockQuantity": 8,
            "isActive": true
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, ProductId::new(12));
        assert_eq!(product.price, Decimal::from_str("39.99").unwrap());
        assert_eq!(product.primary_image(), Some("/img/hoodie-front.jpg"));
        assert_eq!(product.max_purchasable(), 8);
        assert!(product.in_stock());
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let product: Product =
            serde_json::from_str(r#"{"id": 1, "name": "Socks", "price": 10}"#).unwrap();
        assert!(product.sizes.is_empty());
        assert!(product.images.is_empty());
        assert_eq!(product.primary_image(), None);
        assert_eq!(product.max_purchasable(), 0);
        assert!(!product.in_stock());
    }
}
