//! # Cart Aggregate
//!
//! Pure, in-memory cart mutations. Stock checks and persistence are done by
//! the caller (`storefront-cart`) around these methods.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Service Operation        Cart Method              State Change          │
//! │  ─────────────────        ───────────              ────────────          │
//! │                                                                         │
//! │  add_item ───────────────► ensure_can_add() ──────► (subscription rule) │
//! │                            add_line() ────────────► insert or merge     │
//! │                                                                         │
//! │  update_item ────────────► set_quantity() ────────► qty = n / remove    │
//! │                                                                         │
//! │  remove_item ────────────► remove_item() ─────────► items.remove(id)    │
//! │                                                                         │
//! │  empty_cart ─────────────► clear() ───────────────► back to Empty       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `cart_id` (adding again increases quantity)
//! - `quantity >= 1` for every stored line
//! - `total_item_price == unit_price × quantity` after every mutation
//! - A subscription line is always the only line in its cart

use chrono::Utc;

use crate::error::{CartError, CartResult, ValidationError};
use crate::money::Money;
use crate::types::{Cart, CartState, CatalogProduct, CatalogVariant, LineItem};

/// Returns the key a product/variant is stored under in a cart.
///
/// The variant id wins when a variant is selected.
pub fn line_cart_id(product_id: &str, variant_id: Option<&str>) -> String {
    match variant_id {
        Some(variant_id) => variant_id.to_string(),
        None => product_id.to_string(),
    }
}

impl LineItem {
    /// Creates a line from catalog data, freezing title, image, link and price.
    pub fn from_catalog(
        product: &CatalogProduct,
        variant: Option<&CatalogVariant>,
        quantity: i64,
        comment: Option<String>,
    ) -> Self {
        let (title, unit_price_cents) = match variant {
            Some(v) => (format!("{} - {}", product.title, v.title), v.price_cents),
            None => (product.title.clone(), product.price_cents),
        };

        LineItem {
            cart_id: line_cart_id(&product.id, variant.map(|v| v.id.as_str())),
            product_id: product.id.clone(),
            variant_id: variant.map(|v| v.id.clone()),
            title,
            product_image: product.image.clone(),
            link: product.permalink.clone(),
            quantity,
            unit_price_cents,
            total_item_price_cents: Money::from_cents(unit_price_cents)
                .multiply_quantity(quantity)
                .cents(),
            product_subscription: product.subscription_id.clone(),
            product_comment: comment,
        }
    }

    /// Sets the quantity and recomputes the line total.
    fn set_quantity(&mut self, quantity: i64) {
        self.quantity = quantity;
        self.total_item_price_cents = self.unit_price().multiply_quantity(quantity).cents();
    }
}

fn quantity_out_of_range(max: i64) -> CartError {
    ValidationError::OutOfRange {
        field: "productQuantity".to_string(),
        min: 1,
        max: max.max(1),
    }
    .into()
}

impl Cart {
    /// Creates a new empty cart for a session.
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Cart {
            session_id: session_id.into(),
            items: Default::default(),
            discount_code: None,
            pending_order_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> CartState {
        if self.items.is_empty() {
            CartState::Empty
        } else if self.is_subscription() {
            CartState::Subscription
        } else {
            CartState::NonEmpty
        }
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True when the cart holds a subscription line.
    pub fn is_subscription(&self) -> bool {
        self.items.values().any(LineItem::is_subscription)
    }

    /// Returns the number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total quantity of all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.values().map(|i| i.quantity).sum()
    }

    /// Σ total_item_price.
    pub fn net_amount(&self) -> Money {
        self.items.values().map(LineItem::total_item_price).sum()
    }

    /// Returns a line by key.
    pub fn get(&self, cart_id: &str) -> Option<&LineItem> {
        self.items.get(cart_id)
    }

    /// Quantity currently held by this cart for `cart_id` (0 if absent).
    pub fn quantity_of(&self, cart_id: &str) -> i64 {
        self.items.get(cart_id).map_or(0, |i| i.quantity)
    }

    /// Quantity the line for `cart_id` would hold after adding `additional`.
    ///
    /// `unit_price` is only used for a new line; an existing line keeps its
    /// frozen price. Fails when the result would not fit the cart's totals.
    pub fn merged_quantity(&self, cart_id: &str, unit_price: Money, additional: i64) -> CartResult<i64> {
        let held = self.quantity_of(cart_id);
        let merged = held
            .checked_add(additional)
            .ok_or_else(|| quantity_out_of_range(i64::MAX.saturating_sub(held)))?;
        self.ensure_line_fits(cart_id, unit_price, merged)?;
        Ok(merged)
    }

    /// Checks that setting the line for `cart_id` to `quantity` keeps the
    /// line total, the net amount and the total quantity within `i64`.
    ///
    /// ## Example
    /// ```text
    /// other lines: net $10.00, 3 units
    /// this line:   $4.99 × quantity
    ///
    /// max quantity = min((i64::MAX - 1000) / 499, i64::MAX - 3)
    /// ```
    pub fn ensure_line_fits(&self, cart_id: &str, unit_price: Money, quantity: i64) -> CartResult<()> {
        let unit_price = self.get(cart_id).map_or(unit_price, LineItem::unit_price);

        let mut other_net = Money::zero();
        let mut other_quantity: i64 = 0;
        for line in self.items.values().filter(|l| l.cart_id != cart_id) {
            other_net += line.total_item_price();
            other_quantity = other_quantity.saturating_add(line.quantity);
        }

        let by_quantity = i64::MAX - other_quantity;
        let by_price = match unit_price.cents() {
            cents if cents > 0 => (i64::MAX - other_net.cents().max(0)) / cents,
            _ => i64::MAX,
        };
        let max = by_quantity.min(by_price);

        if quantity > max {
            return Err(quantity_out_of_range(max));
        }
        Ok(())
    }

    /// Enforces subscription exclusivity for an incoming product.
    ///
    /// ## Rules
    /// - A subscription cart accepts nothing else (not even a second
    ///   subscription).
    /// - A subscription product cannot join a non-empty cart.
    pub fn ensure_can_add(&self, product: &CatalogProduct) -> CartResult<()> {
        if self.is_subscription() {
            return Err(CartError::subscription(
                "Subscription already existing in cart. You cannot add more.",
            ));
        }

        if product.is_subscription() && !self.is_empty() {
            return Err(CartError::subscription(
                "You cannot combine subscription products with existing in your cart. Empty your cart and try again.",
            ));
        }

        Ok(())
    }

    /// Inserts a line, or merges its quantity into an existing line with the
    /// same `cart_id`. The existing line keeps its frozen price.
    ///
    /// Returns the resulting quantity for that line.
    pub fn add_line(&mut self, line: LineItem) -> i64 {
        let quantity = match self.items.get_mut(&line.cart_id) {
            Some(existing) => {
                let merged = existing.quantity.saturating_add(line.quantity);
                existing.set_quantity(merged);
                if line.product_comment.is_some() {
                    existing.product_comment = line.product_comment;
                }
                merged
            }
            None => {
                let quantity = line.quantity;
                self.items.insert(line.cart_id.clone(), line);
                quantity
            }
        };

        self.touch();
        quantity
    }

    /// Sets a line's quantity. Zero removes the line.
    pub fn set_quantity(&mut self, cart_id: &str, quantity: i64) -> CartResult<()> {
        if quantity == 0 {
            return self.remove_item(cart_id).map(|_| ());
        }

        let item = self
            .items
            .get_mut(cart_id)
            .ok_or_else(|| CartError::ItemNotFound(cart_id.to_string()))?;
        item.set_quantity(quantity);
        self.touch();
        Ok(())
    }

    /// Removes a line by key.
    pub fn remove_item(&mut self, cart_id: &str) -> CartResult<LineItem> {
        let removed = self
            .items
            .remove(cart_id)
            .ok_or_else(|| CartError::ItemNotFound(cart_id.to_string()))?;
        self.touch();
        Ok(removed)
    }

    /// Returns the cart to `Empty`: lines, discount code and pending order
    /// reference are all cleared.
    pub fn clear(&mut self) {
        self.items.clear();
        self.discount_code = None;
        self.pending_order_id = None;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, price_cents: i64) -> CatalogProduct {
        CatalogProduct {
            id: id.to_string(),
            title: format!("Product {}", id),
            price_cents,
            stock: None,
            track_stock: false,
            subscription_id: None,
            image: Some(format!("/uploads/{}.jpg", id)),
            permalink: Some(format!("/product/{}", id)),
            published: true,
        }
    }

    fn subscription(id: &str) -> CatalogProduct {
        CatalogProduct {
            subscription_id: Some(format!("plan_{}", id)),
            ..product(id, 1500)
        }
    }

    fn variant(id: &str, product_id: &str, price_cents: i64) -> CatalogVariant {
        CatalogVariant {
            id: id.to_string(),
            product_id: product_id.to_string(),
            title: "Large".to_string(),
            price_cents,
            stock: Some(4),
        }
    }

    #[test]
    fn test_line_cart_id_prefers_variant() {
        assert_eq!(line_cart_id("p1", None), "p1");
        assert_eq!(line_cart_id("p1", Some("v9")), "v9");
    }

    #[test]
    fn test_from_catalog_snapshots_fields() {
        let line = LineItem::from_catalog(&product("p1", 1999), None, 3, None);
        assert_eq!(line.cart_id, "p1");
        assert_eq!(line.unit_price_cents, 1999);
        assert_eq!(line.total_item_price_cents, 5997);
        assert_eq!(line.link.as_deref(), Some("/product/p1"));
        assert!(!line.is_subscription());
    }

    #[test]
    fn test_from_catalog_uses_variant_price_and_key() {
        let p = product("p1", 1000);
        let v = variant("v1", "p1", 1250);
        let line = LineItem::from_catalog(&p, Some(&v), 2, Some("gift wrap".into()));
        assert_eq!(line.cart_id, "v1");
        assert_eq!(line.variant_id.as_deref(), Some("v1"));
        assert_eq!(line.title, "Product p1 - Large");
        assert_eq!(line.total_item_price_cents, 2500);
        assert_eq!(line.product_comment.as_deref(), Some("gift wrap"));
    }

    #[test]
    fn test_add_same_line_merges_quantity() {
        let mut cart = Cart::new("s1");
        let p = product("p1", 999);

        assert_eq!(cart.add_line(LineItem::from_catalog(&p, None, 2, None)), 2);
        assert_eq!(cart.add_line(LineItem::from_catalog(&p, None, 3, None)), 5);

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
        assert_eq!(cart.net_amount().cents(), 4995);
    }

    #[test]
    fn test_merged_quantity_rejects_overflow() {
        let mut cart = Cart::new("s1");
        let sticker = product("sticker", 499);
        cart.add_line(LineItem::from_catalog(&sticker, None, 2, None));

        assert_eq!(cart.merged_quantity("sticker", sticker.price(), 3).unwrap(), 5);

        let err = cart
            .merged_quantity("sticker", sticker.price(), i64::MAX)
            .unwrap_err();
        assert!(matches!(
            err,
            CartError::Validation(ValidationError::OutOfRange { max, .. }) if max == i64::MAX - 2
        ));

        // The line total is what overflows first at this price.
        let err = cart
            .merged_quantity("sticker", sticker.price(), i64::MAX / 100)
            .unwrap_err();
        assert!(matches!(
            err,
            CartError::Validation(ValidationError::OutOfRange { max, .. }) if max == i64::MAX / 499
        ));
    }

    #[test]
    fn test_line_fit_accounts_for_other_lines() {
        let mut cart = Cart::new("s1");
        cart.add_line(LineItem::from_catalog(&product("mug", 1000), None, 1, None));

        let free = product("sample", 0);
        assert!(cart.ensure_line_fits("sample", free.price(), i64::MAX - 1).is_ok());
        assert!(cart.ensure_line_fits("sample", free.price(), i64::MAX).is_err());

        let max = (i64::MAX - 1000) / 250;
        assert!(cart.ensure_line_fits("pen", Money::from_cents(250), max).is_ok());
        assert!(cart.ensure_line_fits("pen", Money::from_cents(250), max + 1).is_err());
    }

    #[test]
    fn test_merge_keeps_frozen_price() {
        let mut cart = Cart::new("s1");
        cart.add_line(LineItem::from_catalog(&product("p1", 1000), None, 1, None));
        cart.add_line(LineItem::from_catalog(&product("p1", 2000), None, 1, None));

        let line = cart.get("p1").unwrap();
        assert_eq!(line.unit_price_cents, 1000);
        assert_eq!(line.total_item_price_cents, 2000);
    }

    #[test]
    fn test_set_quantity_recomputes_total() {
        let mut cart = Cart::new("s1");
        cart.add_line(LineItem::from_catalog(&product("p1", 1999), None, 1, None));

        cart.set_quantity("p1", 3).unwrap();
        assert_eq!(cart.get("p1").unwrap().total_item_price_cents, 5997);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::new("s1");
        cart.add_line(LineItem::from_catalog(&product("p1", 1999), None, 1, None));

        cart.set_quantity("p1", 0).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.state(), CartState::Empty);
    }

    #[test]
    fn test_unknown_line_errors() {
        let mut cart = Cart::new("s1");
        assert!(matches!(cart.set_quantity("nope", 2), Err(CartError::ItemNotFound(_))));
        assert!(matches!(cart.remove_item("nope"), Err(CartError::ItemNotFound(_))));
    }

    #[test]
    fn test_subscription_blocks_further_adds() {
        let mut cart = Cart::new("s1");
        let sub = subscription("gold");
        cart.ensure_can_add(&sub).unwrap();
        cart.add_line(LineItem::from_catalog(&sub, None, 1, None));

        assert_eq!(cart.state(), CartState::Subscription);
        assert!(matches!(
            cart.ensure_can_add(&product("p1", 100)),
            Err(CartError::SubscriptionConflict(_))
        ));
        assert!(matches!(
            cart.ensure_can_add(&subscription("silver")),
            Err(CartError::SubscriptionConflict(_))
        ));
    }

    #[test]
    fn test_subscription_cannot_join_non_empty_cart() {
        let mut cart = Cart::new("s1");
        cart.add_line(LineItem::from_catalog(&product("p1", 100), None, 1, None));

        assert!(matches!(
            cart.ensure_can_add(&subscription("gold")),
            Err(CartError::SubscriptionConflict(_))
        ));
        assert!(cart.ensure_can_add(&product("p2", 100)).is_ok());
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut cart = Cart::new("s1");
        cart.add_line(LineItem::from_catalog(&product("p1", 100), None, 1, None));
        cart.discount_code = Some("SAVE10".into());
        cart.pending_order_id = Some("order-1".into());

        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.discount_code.is_none());
        assert!(cart.pending_order_id.is_none());

        // Idempotent
        cart.clear();
        assert_eq!(cart.state(), CartState::Empty);
    }
}
