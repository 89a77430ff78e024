//! Catalog filter set and its query-string form.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Active catalog query dimensions.
///
/// An empty string is treated the same as an absent field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSet {
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub size: Option<String>,
    pub search_term: Option<String>,
}

/// Partial filter update: only `Some` fields are applied.
///
/// Supplying `Some(String::new())` clears that field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPatch {
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub size: Option<String>,
    pub search_term: Option<String>,
}

impl FilterPatch {
    #[must_use]
    pub fn category(mut self, value: impl Into<String>) -> Self {
        self.category = Some(value.into());
        self
    }

    #[must_use]
    pub fn brand(mut self, value: impl Into<String>) -> Self {
        self.brand = Some(value.into());
        self
    }

    #[must_use]
    pub fn min_price(mut self, value: impl Into<String>) -> Self {
        self.min_price = Some(value.into());
        self
    }

    #[must_use]
    pub fn max_price(mut self, value: impl Into<String>) -> Self {
        self.max_price = Some(value.into());
        self
    }

    #[must_use]
    pub fn size(mut self, value: impl Into<String>) -> Self {
        self.size = Some(value.into());
        self
    }

    #[must_use]
    pub fn search_term(mut self, value: impl Into<String>) -> Self {
        self.search_term = Some(value.into());
        self
    }
}

fn non_empty(field: Option<&String>) -> Option<&str> {
    field.map(String::as_str).filter(|v| !v.is_empty())
}

impl FilterSet {
    /// Merge the supplied fields of `patch`, leaving the others unchanged.
    pub fn merge(&mut self, patch: FilterPatch) {
        let FilterPatch {
            category,
            brand,
            min_price,
            max_price,
            size,
            search_term,
        } = patch;

        for (slot, value) in [
            (&mut self.category, category),
            (&mut self.brand, brand),
            (&mut self.min_price, min_price),
            (&mut self.max_price, max_price),
            (&mut self.size, size),
            (&mut self.search_term, search_term),
        ] {
            if let Some(value) = value {
                *slot = Some(value).filter(|v| !v.is_empty());
            }
        }
    }

    /// Non-empty fields as wire `(key, value)` pairs in query order.
    #[must_use]
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("category", non_empty(self.category.as_ref())),
            ("brand", non_empty(self.brand.as_ref())),
            ("minPrice", non_empty(self.min_price.as_ref())),
            ("maxPrice", non_empty(self.max_price.as_ref())),
            ("size", non_empty(self.size.as_ref())),
            ("q", non_empty(self.search_term.as_ref())),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }

    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs().is_empty()
    }

    /// Form-encoded query string of the non-empty fields, without a
    /// leading `?`. Empty when no field is set.
    #[must_use]
    pub fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs())
            .finish()
    }
}
