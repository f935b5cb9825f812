//! # Stock Policy
//!
//! Pure rules for stock reservation. The counting of quantities held by
//! other sessions happens in `storefront-cart`'s ledger; this module decides
//! whether a check applies and whether it passes.
//!
//! ## Availability
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   catalog stock          held by OTHER live sessions                   │
//! │        5          -                  3                  = 2 available  │
//! │                                                                         │
//! │   requested total (already in my cart + this add)  must be <= 2       │
//! │                                                                         │
//! │   The shopper's own cart is never counted against them.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CartError, CartResult};
use crate::types::{CatalogProduct, CatalogVariant};

/// Checks run only when tracking is on globally AND for the product.
pub fn requires_check(tracking_enabled: bool, product: &CatalogProduct) -> bool {
    tracking_enabled && product.track_stock
}

/// The stock figure that applies to a line: the variant's when one is
/// selected, else the product's. `None` means unlimited.
pub fn effective_stock(product: &CatalogProduct, variant: Option<&CatalogVariant>) -> Option<i64> {
    match variant {
        Some(v) => v.stock,
        None => product.stock,
    }
}

/// `max(stock - held_by_others, 0)`
pub fn net_available(stock: i64, held_by_others: i64) -> i64 {
    (stock - held_by_others).max(0)
}

/// Verifies a new total quantity for a line fits the available stock.
///
/// `requested_total` is the quantity the line would have after the
/// operation, not the delta.
pub fn check_quantity(
    cart_id: &str,
    requested_total: i64,
    stock: Option<i64>,
    held_by_others: i64,
) -> CartResult<()> {
    let Some(stock) = stock else {
        return Ok(());
    };

    let available = net_available(stock, held_by_others);
    if requested_total > available {
        return Err(CartError::InsufficientStock {
            cart_id: cart_id.to_string(),
            available,
            requested: requested_total,
        });
    }

    Ok(())
}
