//! Catalog commands.
//!
//! # Usage
//!
//! ```bash
//! hugscape products
//! hugscape products --category boys --brand Hugscape --max-price 40
//! hugscape products --search "teddy bear"
//! hugscape product 42
//! hugscape categories
//! ```

use hugscape_core::{Product, ProductId};
use hugscape_storefront::catalog::{FilterPatch, LoadState};
use rust_decimal::Decimal;
use tracing::info;

use super::{CommandError, Context};

/// Filter flags of `hugscape products`.
#[derive(Debug, Default)]
pub struct ProductFilters {
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub size: Option<String>,
    pub search: Option<String>,
}

impl ProductFilters {
    fn into_patch(self) -> Option<FilterPatch> {
        let patch = FilterPatch {
            category: self.category,
            brand: self.brand,
            min_price: self.min_price.map(|p| p.to_string()),
            max_price: self.max_price.map(|p| p.to_string()),
            size: self.size,
            search_term: self.search,
        };
        (patch != FilterPatch::default()).then_some(patch)
    }
}

fn check(state: &LoadState) -> Result<(), CommandError> {
    state
        .error
        .as_ref()
        .map_or(Ok(()), |message| Err(CommandError::Failed(message.clone())))
}

fn log_product(product: &Product) {
    let stock = product
        .stock_quantity
        .map_or_else(|| "-".to_string(), |n| n.to_string());
    info!(
        "#{} {} - {} (stock: {stock})",
        product.id, product.name, product.price
    );
}

/// List products, filtered when any flag is given.
pub async fn products(context: &Context, filters: ProductFilters) -> Result<(), CommandError> {
    let catalog = context.catalog();

    match filters.into_patch() {
        Some(patch) => catalog.update_filters(patch).await,
        None => catalog.fetch_all().await,
    }

    let snapshot = catalog.snapshot();
    check(&snapshot.products_state)?;

    if !snapshot.filters.is_empty() {
        info!("Filters: {}", snapshot.filters.query_string());
    }
    info!("{} product(s)", snapshot.products.len());
    snapshot.products.iter().for_each(log_product);
    Ok(())
}

/// Show one product in detail.
pub async fn product(context: &Context, id: ProductId) -> Result<(), CommandError> {
    let product = context
        .catalog()
        .get_by_id(id)
        .await
        .ok_or(CommandError::ProductNotFound(id))?;

    log_product(&product);
    if let Some(description) = &product.description {
        info!("{description}");
    }
    for (label, values) in [("Sizes", &product.sizes), ("Colors", &product.colors)] {
        if !values.is_empty() {
            info!("{label}: {}", values.join(", "));
        }
    }
    Ok(())
}

pub async fn categories(context: &Context) -> Result<(), CommandError> {
    let catalog = context.catalog();
    catalog.fetch_categories().await;

    let snapshot = catalog.snapshot();
    check(&snapshot.categories_state)?;
    for category in &snapshot.categories {
        info!("{category}");
    }
    Ok(())
}

pub async fn brands(context: &Context) -> Result<(), CommandError> {
    let catalog = context.catalog();
    catalog.fetch_brands().await;

    let snapshot = catalog.snapshot();
    check(&snapshot.brands_state)?;
    for brand in &snapshot.brands {
        info!("{brand}");
    }
    Ok(())
}
