//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! hugscape cart add 42 --size M --color Red -q 2
//! hugscape cart set 42 5
//! hugscape cart remove 42
//! hugscape cart show
//! ```

use hugscape_core::ProductId;
use tracing::info;

use super::{CommandError, Context};

pub fn show(context: &Context) {
    let cart = context.cart();

    if cart.is_empty() {
        info!("Cart is empty");
        return;
    }

    for line in cart.lines() {
        let variant: Vec<&str> = [line.selected_size.as_deref(), line.selected_color.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        info!(
            "#{} {} [{}] {} x {} = {}",
            line.id,
            line.name,
            variant.join(" / "),
            line.quantity,
            line.price,
            line.subtotal().round_dp(2)
        );
    }
    info!("{} item(s), total {}", cart.count(), cart.total().round_dp(2));
}

/// Look the product up, then add it to the cart.
pub async fn add(
    context: &Context,
    id: ProductId,
    size: Option<&str>,
    color: Option<&str>,
    quantity: u32,
) -> Result<(), CommandError> {
    let product = context
        .catalog()
        .get_by_id(id)
        .await
        .ok_or(CommandError::ProductNotFound(id))?;

    let cart = context.cart();
    cart.add_line(&product, size, color, quantity);
    info!(
        "Added {quantity} x {}; cart now holds {} item(s)",
        product.name,
        cart.count()
    );
    Ok(())
}

pub fn set(context: &Context, id: ProductId, quantity: i64) {
    let cart = context.cart();
    cart.set_quantity(id, quantity);
    info!("Cart now holds {} item(s)", cart.count());
}

pub fn remove(context: &Context, id: ProductId) {
    let cart = context.cart();
    cart.remove_line(id);
    info!("Removed product {id}; cart now holds {} item(s)", cart.count());
}

pub fn clear(context: &Context) {
    context.cart().clear();
    info!("Cart cleared");
}
