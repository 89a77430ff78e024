//! Cart line and snapshot encoding.

use std::collections::HashSet;

use hugscape_core::{Product, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One purchasable variant and its quantity.
///
/// Serialized field names match the persisted snapshot format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: ProductId,
    pub name: String,
    /// Unit price.
    pub price: Decimal,
    /// Primary image URL, empty when the product has none.
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub selected_size: Option<String>,
    #[serde(default)]
    pub selected_color: Option<String>,
    pub quantity: u32,
    /// Stock count captured when the line was created.
    #[serde(default)]
    pub max_quantity: u32,
}

impl CartLine {
    pub(super) fn new(
        product: &Product,
        size: Option<&str>,
        color: Option<&str>,
        quantity: u32,
    ) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            image: product.primary_image().unwrap_or_default().to_string(),
            selected_size: size.map(String::from),
            selected_color: color.map(String::from),
            quantity,
            max_quantity: product.max_purchasable(),
        }
    }

    /// Whether this line is the variant `(id, size, color)`.
    #[must_use]
    pub fn is_variant(&self, id: ProductId, size: Option<&str>, color: Option<&str>) -> bool {
        self.id == id
            && self.selected_size.as_deref() == size
            && self.selected_color.as_deref() == color
    }

    /// `price × quantity`, saturating at the bounds of `Decimal`.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }
}

/// Why a persisted snapshot was rejected.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("unparsable cart snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("cart line for product {0} has zero quantity")]
    ZeroQuantity(ProductId),

    #[error("duplicate cart line for product {0}")]
    DuplicateVariant(ProductId),
}

/// Decode and validate a persisted snapshot.
///
/// A snapshot that parses but breaks the line invariants is rejected as a
/// whole.
pub fn decode_snapshot(raw: &str) -> Result<Vec<CartLine>, SnapshotError> {
    let lines: Vec<CartLine> = serde_json::from_str(raw)?;

    let mut seen = HashSet::new();
    for line in &lines {
        if line.quantity == 0 {
            return Err(SnapshotError::ZeroQuantity(line.id));
        }
        let key = (
            line.id,
            line.selected_size.as_deref(),
            line.selected_color.as_deref(),
        );
        if !seen.insert(key) {
            return Err(SnapshotError::DuplicateVariant(line.id));
        }
    }

    Ok(lines)
}

/// Encode lines for persistence.
pub fn encode_snapshot(lines: &[CartLine]) -> Result<String, serde_json::Error> {
    serde_json::to_string(lines)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_original_snapshot_format() {
        let raw = r#"[{
            "id": 1,
            "name": "Cloud Hoodie",
            "price": 10,
            "image": "",
            "selectedSize": "M",
            "selectedColor": "Red",
            "quantity": 3,
            "maxQuantity": 5
        }]"#;

        let lines = decode_snapshot(raw).unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].is_variant(ProductId::new(1), Some("M"), Some("Red")));
        assert_eq!(lines[0].subtotal(), Decimal::from(30));
    }

    #[test]
    fn test_subtotal_saturates_instead_of_overflowing() {
        let raw = r#"[{"id": 1, "name": "x", "price": "79228162514264337593543950335", "quantity": 2}]"#;

        let lines = decode_snapshot(raw).unwrap();

        assert_eq!(lines[0].subtotal(), Decimal::MAX);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_snapshot("{not json"),
            Err(SnapshotError::Parse(_))
        ));
        assert!(matches!(
            decode_snapshot(r#"{"id": 1}"#),
            Err(SnapshotError::Parse(_))
        ));
        assert!(matches!(
            decode_snapshot(r#"[{"id": 1, "name": "x", "price": 1, "quantity": -2}]"#),
            Err(SnapshotError::Parse(_))
        ));
    }

    #[test]
    fn test_decode_rejects_invariant_violations() {
        let zero = r#"[{"id": 1, "name": "x", "price": 1, "quantity": 0}]"#;
        assert!(matches!(
            decode_snapshot(zero),
            Err(SnapshotError::ZeroQuantity(_))
        ));

        let duplicate = r#"[
            {"id": 1, "name": "x", "price": 1, "quantity": 1, "selectedSize": "M"},
            {"id": 1, "name": "x", "price": 1, "quantity": 2, "selectedSize": "M"}
        ]"#;
        assert!(matches!(
            decode_snapshot(duplicate),
            Err(SnapshotError::DuplicateVariant(_))
        ));
    }

    #[test]
    fn test_variant_key_distinguishes_missing_size() {
        let line: CartLine =
            serde_json::from_str(r#"{"id": 2, "name": "Socks", "price": 4, "quantity": 1}"#)
                .unwrap();
        assert!(line.is_variant(ProductId::new(2), None, None));
        assert!(!line.is_variant(ProductId::new(2), Some("M"), None));
    }
}
