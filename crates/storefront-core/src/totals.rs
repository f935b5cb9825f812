//! # Totals
//!
//! Recomputes [`CartTotals`] from scratch after every mutation.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  net       = Σ line.total_item_price                                   │
//! │  discount  = evaluate(code, net)          (0 when no live code)        │
//! │  shipping  = rule.quote(net)              (or caller override)         │
//! │  grand     = max(net - discount, 0) + shipping                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::discount;
use crate::money::Money;
use crate::shipping::{ShippingQuote, ShippingRule};
use crate::types::{Cart, CartTotals, Discount};

/// Recomputes totals.
///
/// `discount` must already be resolved and known to be active; pass `None`
/// when the cart has no code or the code has lapsed.
pub fn recompute(cart: &Cart, discount: Option<&Discount>, shipping: &dyn ShippingRule) -> CartTotals {
    let net = cart.net_amount();
    let quote = shipping.quote(net);
    recompute_with_quote(cart, discount, quote)
}

/// Like [`recompute`], with a precomputed shipping quote (checkout override).
pub fn recompute_with_quote(cart: &Cart, discount: Option<&Discount>, quote: ShippingQuote) -> CartTotals {
    let net = cart.net_amount();
    let discount_amount = discount.map_or(Money::zero(), |d| discount::evaluate(d, net));
    let grand = net.saturating_sub_floor_zero(discount_amount) + quote.amount;

    CartTotals {
        total_cart_items: cart.item_count() as i64,
        total_cart_products: cart.total_quantity(),
        net_amount_cents: net.cents(),
        discount_amount_cents: discount_amount.cents(),
        shipping_amount_cents: quote.amount.cents(),
        grand_total_cents: grand.cents(),
        shipping_message: quote.message,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shipping::{FlatRateShipping, NoShipping};
    use crate::types::{CatalogProduct, DiscountKind, LineItem};
    use chrono::{Duration, Utc};

    fn cart_with(price_cents: i64, qty: i64) -> Cart {
        let product = CatalogProduct {
            id: "p1".to_string(),
            title: "Widget".to_string(),
            price_cents,
            stock: None,
            track_stock: false,
            subscription_id: None,
            image: None,
            permalink: None,
            published: true,
        };
        let mut cart = Cart::new("s1");
        cart.add_line(LineItem::from_catalog(&product, None, qty, None));
        cart
    }

    fn amount_off(cents: i64) -> Discount {
        let now = Utc::now();
        Discount {
            code: "TEN".to_string(),
            kind: DiscountKind::Amount,
            value: cents,
            start: now - Duration::days(1),
            end: now + Duration::days(1),
        }
    }

    fn shipping() -> FlatRateShipping {
        FlatRateShipping::new(Money::from_cents(10_000), Money::from_cents(1000))
    }

    #[test]
    fn test_basic_totals() {
        let totals = recompute(&cart_with(1999, 3), None, &NoShipping);
        assert_eq!(totals.net_amount_cents, 5997);
        assert_eq!(totals.grand_total_cents, 5997);
        assert_eq!(totals.total_cart_items, 1);
        assert_eq!(totals.total_cart_products, 3);
    }

    #[test]
    fn test_amount_discount_with_shipping() {
        let totals = recompute(&cart_with(1999, 3), Some(&amount_off(1000)), &shipping());
        assert_eq!(totals.discount_amount_cents, 1000);
        assert_eq!(totals.shipping_amount_cents, 1000);
        assert_eq!(totals.grand_total_cents, 4997 + 1000);
        assert_eq!(totals.shipping_message.as_deref(), Some("Estimated shipping"));
    }

    #[test]
    fn test_grand_total_never_negative() {
        let totals = recompute(&cart_with(3000, 1), Some(&amount_off(10_000)), &NoShipping);
        assert_eq!(totals.discount_amount_cents, 3000);
        assert_eq!(totals.grand_total_cents, 0);
    }

    #[test]
    fn test_free_shipping_above_threshold() {
        let totals = recompute(&cart_with(6000, 2), None, &shipping());
        assert_eq!(totals.shipping_amount_cents, 0);
        assert_eq!(totals.grand_total_cents, 12_000);
    }

    #[test]
    fn test_empty_cart_totals_are_zero() {
        let totals = recompute(&Cart::new("s1"), Some(&amount_off(500)), &shipping());
        assert_eq!(totals.grand_total_cents, 0);
        assert_eq!(totals.total_cart_items, 0);
    }

    #[test]
    fn test_shipping_override() {
        let quote = ShippingQuote {
            amount: Money::from_cents(250),
            message: None,
        };
        let totals = recompute_with_quote(&cart_with(1000, 1), None, quote);
        assert_eq!(totals.grand_total_cents, 1250);
    }
}
