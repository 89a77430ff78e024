//! Shopping cart state.
//!
//! [`CartStore`] owns the cart lines, keeps them consistent with the
//! variant-key invariant (at most one line per product, size and color) and
//! persists the full line list after every mutation.
//!
//! Quantity changes and removals are addressed by product ID and affect
//! every size/color line of that product; additions and lookups use the
//! full variant key.

mod line;

pub use line::{CartLine, SnapshotError, decode_snapshot, encode_snapshot};

use std::sync::{Mutex, MutexGuard, PoisonError};

use hugscape_core::{Product, ProductId};
use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use crate::error::add_breadcrumb;
use crate::storage::{CART_KEY, KeyValueStore};

#[derive(Debug, Default)]
struct CartState {
    lines: Vec<CartLine>,
    open: bool,
}

/// Cart state manager backed by persisted storage.
#[derive(Debug)]
pub struct CartStore<S> {
    storage: S,
    state: Mutex<CartState>,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Create a store, restoring the last persisted snapshot.
    ///
    /// An unreadable or invalid snapshot is discarded: the store starts
    /// empty and the stored entry is overwritten.
    #[must_use]
    pub fn new(storage: S) -> Self {
        let lines = Self::restore(&storage);
        Self {
            storage,
            state: Mutex::new(CartState {
                lines,
                open: false,
            }),
        }
    }

    fn restore(storage: &S) -> Vec<CartLine> {
        let raw = match storage.load(CART_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read cart snapshot, starting empty");
                return Vec::new();
            }
        };

        match decode_snapshot(&raw) {
            Ok(lines) => {
                debug!(lines = lines.len(), "Restored cart snapshot");
                lines
            }
            Err(e) => {
                warn!(error = %e, "Discarding invalid cart snapshot");
                if let Err(e) = storage.save(CART_KEY, "[]") {
                    warn!(error = %e, "Failed to overwrite invalid cart snapshot");
                }
                Vec::new()
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` to the lines and persist the result before returning.
    fn mutate<F>(&self, f: F)
    where
        F: FnOnce(&mut Vec<CartLine>),
    {
        let mut state = self.lock();
        f(&mut state.lines);
        self.persist(&state.lines);
    }

    fn persist(&self, lines: &[CartLine]) {
        let result = encode_snapshot(lines)
            .map_err(|e| e.to_string())
            .and_then(|raw| {
                self.storage
                    .save(CART_KEY, &raw)
                    .map_err(|e| e.to_string())
            });
        if let Err(e) = result {
            tracing::error!(error = %e, "Failed to persist cart snapshot");
        }
    }

    /// Add `quantity` units of a variant.
    ///
    /// An existing line for the same variant has its quantity increased
    /// (without clamping to stock); otherwise a new line is appended with
    /// the product's stock count as its maximum. Adding zero units is a
    /// no-op.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add_line(
        &self,
        product: &Product,
        size: Option<&str>,
        color: Option<&str>,
        quantity: u32,
    ) {
        if quantity == 0 {
            debug!("Ignoring add of zero units");
            return;
        }

        self.mutate(|lines| {
            if let Some(line) = lines
                .iter_mut()
                .find(|line| line.is_variant(product.id, size, color))
            {
                line.quantity = line.quantity.saturating_add(quantity);
            } else {
                lines.push(CartLine::new(product, size, color, quantity));
            }
        });

        let product_id = product.id.to_string();
        let quantity = quantity.to_string();
        add_breadcrumb(
            "cart",
            "Added to cart",
            Some(&[
                ("product_id", product_id.as_str()),
                ("quantity", quantity.as_str()),
            ]),
        );
    }

    /// Remove every line of `product_id`, whatever its size and color.
    #[instrument(skip(self))]
    pub fn remove_line(&self, product_id: ProductId) {
        self.mutate(|lines| lines.retain(|line| line.id != product_id));
        let id = product_id.to_string();
        add_breadcrumb("cart", "Removed from cart", Some(&[("product_id", id.as_str())]));
    }

    /// Set the quantity of every line of `product_id`.
    ///
    /// Values ≤ 0 remove the lines. Positive values are clamped to each
    /// line's maximum; a line whose clamped quantity is 0 is removed.
    #[instrument(skip(self))]
    pub fn set_quantity(&self, product_id: ProductId, quantity: i64) {
        let Ok(requested) = u32::try_from(quantity) else {
            if quantity <= 0 {
                self.remove_line(product_id);
            } else {
                self.set_quantity(product_id, i64::from(u32::MAX));
            }
            return;
        };
        if requested == 0 {
            self.remove_line(product_id);
            return;
        }

        self.mutate(|lines| {
            for line in lines.iter_mut().filter(|line| line.id == product_id) {
                line.quantity = requested.min(line.max_quantity);
            }
            lines.retain(|line| line.quantity > 0);
        });
    }

    /// Remove all lines.
    #[instrument(skip(self))]
    pub fn clear(&self) {
        self.mutate(Vec::clear);
        add_breadcrumb("cart", "Cleared cart", None);
    }

    /// Sum of `price × quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lock()
            .lines
            .iter()
            .fold(Decimal::ZERO, |total, line| total.saturating_add(line.subtotal()))
    }

    /// Total number of units in the cart.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.lock()
            .lines
            .iter()
            .fold(0_u32, |count, line| count.saturating_add(line.quantity))
    }

    /// Whether the exact variant is in the cart.
    #[must_use]
    pub fn contains(&self, product_id: ProductId, size: Option<&str>, color: Option<&str>) -> bool {
        self.lock()
            .lines
            .iter()
            .any(|line| line.is_variant(product_id, size, color))
    }

    /// Quantity of the exact variant, 0 when absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId, size: Option<&str>, color: Option<&str>) -> u32 {
        self.lock()
            .lines
            .iter()
            .find(|line| line.is_variant(product_id, size, color))
            .map_or(0, |line| line.quantity)
    }

    /// Snapshot of the current lines.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.lock().lines.clone()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().lines.is_empty()
    }

    // =========================================================================
    // Drawer visibility
    // =========================================================================

    pub fn open(&self) {
        self.lock().open = true;
    }

    pub fn close(&self) {
        self.lock().open = false;
    }

    pub fn toggle(&self) {
        let mut state = self.lock();
        state.open = !state.open;
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    /// The storage backend this store persists to.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }
}
