//! # Cart Service
//!
//! Every cart operation a storefront request handler calls.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     add_item(session, request)                          │
//! │                                                                         │
//! │  validate input                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  session lock ─────────────────────────────────────────────┐           │
//! │       │                                                    │           │
//! │       ▼                                                    │           │
//! │  catalog: product (+ variant)       ProductNotFound        │           │
//! │       │                                                    │           │
//! │       ▼                                                    │           │
//! │  load cart (session store → cart rows → new)               │           │
//! │       │                                                    │           │
//! │       ▼                                                    │           │
//! │  subscription rule                  SubscriptionConflict   │           │
//! │  quantity cap (merged total)        QuantityExceedsMax     │           │
//! │  merged total fits in i64           Validation             │           │
//! │       │                                                    │           │
//! │       ▼                                                    │           │
//! │  stock lock + ledger check          InsufficientStock      │           │
//! │       │                             Transient              │           │
//! │       ▼                                                    │           │
//! │  merge/insert line                                         │           │
//! │       │                                                    │           │
//! │       ▼                                                    │           │
//! │  commit: resolve discount → recompute totals → persist     │           │
//! │       │                                                    │           │
//! │       ▼                                                    ▼           │
//! │  CartSnapshot                                      locks released      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Persistence
//! A commit writes the durable cart rows the ledger reads first, then the
//! session snapshot. An empty cart deletes its rows instead. If the session
//! write fails, the rows are put back to what they held before the commit,
//! so a failed operation leaves neither store changed.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{OwnedMutexGuard, RwLock};
use tracing::{debug, error, info, instrument, warn};

use storefront_core::cart::line_cart_id;
use storefront_core::validation::{
    validate_comment, validate_discount_code, validate_id, validate_quantity,
    validate_update_quantity,
};
use storefront_core::{
    discount, stock, totals, Cart, CartError, CartResult, CartSnapshot, CartTotals,
    CatalogProduct, CatalogVariant, Discount, LineItem, ShippingRule,
};

use crate::config::StoreConfig;
use crate::error::ConfigResult;
use crate::ledger::StockLedger;
use crate::locks::KeyedLocks;
use crate::ports::{CartStore, Catalog, DiscountSource, Ports, SessionStore};

// =============================================================================
// Requests
// =============================================================================

/// Body of an add-to-cart request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: String,
    #[serde(default)]
    pub variant_id: Option<String>,
    /// Values below 1 are treated as 1.
    #[serde(default = "default_quantity", rename = "productQuantity")]
    pub quantity: i64,
    #[serde(default, rename = "productComment")]
    pub comment: Option<String>,
}

fn default_quantity() -> i64 {
    1
}

impl AddItemRequest {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        AddItemRequest {
            product_id: product_id.into(),
            variant_id: None,
            quantity,
            comment: None,
        }
    }

    pub fn with_variant(mut self, variant_id: impl Into<String>) -> Self {
        self.variant_id = Some(variant_id.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

// =============================================================================
// Service
// =============================================================================

/// Config snapshot plus the shipping rule derived from it.
#[derive(Clone)]
struct Settings {
    config: Arc<StoreConfig>,
    shipping: Arc<dyn ShippingRule>,
}

/// The cart service. Share it as `Arc<CartService>`.
pub struct CartService {
    settings: RwLock<Settings>,
    custom_shipping: Option<Arc<dyn ShippingRule>>,
    catalog: Arc<dyn Catalog>,
    discounts: Arc<dyn DiscountSource>,
    sessions: Arc<dyn SessionStore>,
    carts: Arc<dyn CartStore>,
    ledger: StockLedger,
    session_locks: KeyedLocks,
    stock_locks: KeyedLocks,
}

impl CartService {
    pub fn new(config: StoreConfig, ports: Ports) -> Self {
        let shipping = config.shipping_rule();
        CartService {
            settings: RwLock::new(Settings {
                config: Arc::new(config),
                shipping,
            }),
            custom_shipping: None,
            catalog: ports.catalog,
            discounts: ports.discounts,
            sessions: ports.sessions,
            ledger: StockLedger::new(ports.carts.clone()),
            carts: ports.carts,
            session_locks: KeyedLocks::new(),
            stock_locks: KeyedLocks::new(),
        }
    }

    /// Replaces the config-derived flat-rate shipping with a custom rule.
    pub fn with_shipping_rule(mut self, rule: Arc<dyn ShippingRule>) -> Self {
        self.custom_shipping = Some(rule);
        self
    }

    /// The active configuration snapshot.
    pub async fn config(&self) -> Arc<StoreConfig> {
        self.settings.read().await.config.clone()
    }

    /// Validates and swaps in a new configuration. In-flight operations
    /// finish with the snapshot they started with.
    pub async fn reload_config(&self, config: StoreConfig) -> ConfigResult<()> {
        config.validate()?;
        let shipping = config.shipping_rule();

        let mut settings = self.settings.write().await;
        *settings = Settings {
            config: Arc::new(config),
            shipping,
        };
        info!("Store configuration reloaded");
        Ok(())
    }

    async fn settings(&self) -> Settings {
        let mut settings = self.settings.read().await.clone();
        if let Some(rule) = &self.custom_shipping {
            settings.shipping = rule.clone();
        }
        settings
    }

    // =========================================================================
    // Cart Operations
    // =========================================================================

    /// Adds a product (or variant) to the session's cart.
    #[instrument(skip(self, request), fields(product_id = %request.product_id))]
    pub async fn add_item(&self, session_id: &str, request: AddItemRequest) -> CartResult<CartSnapshot> {
        validate_id("sessionId", session_id)?;
        validate_id("productId", &request.product_id)?;
        if let Some(variant_id) = &request.variant_id {
            validate_id("variantId", variant_id)?;
        }
        let comment = validate_comment(request.comment.as_deref())?;
        let quantity = request.quantity.max(1);

        let settings = self.settings().await;
        let max = settings.config.cart.max_quantity;
        validate_quantity(quantity, max)?;

        let _session = self.session_locks.lock(session_id).await;

        let (product, variant) = self
            .fetch_product(&request.product_id, request.variant_id.as_deref())
            .await?;

        let mut cart = self
            .load_cart(session_id)
            .await?
            .unwrap_or_else(|| Cart::new(session_id));

        cart.ensure_can_add(&product)?;

        let cart_id = line_cart_id(&product.id, variant.as_ref().map(|v| v.id.as_str()));
        let unit_price = variant.as_ref().map_or(product.price(), CatalogVariant::price);
        let new_total = cart.merged_quantity(&cart_id, unit_price, quantity)?;
        validate_quantity(new_total, max)?;

        let _stock = self
            .reserve_stock(&settings, session_id, &cart_id, new_total, &product, variant.as_ref())
            .await?;

        cart.add_line(LineItem::from_catalog(&product, variant.as_ref(), quantity, comment));
        let snapshot = self.commit(&settings, cart, settings.shipping.as_ref()).await?;

        info!(
            session_id = %session_id,
            cart_id = %cart_id,
            quantity = new_total,
            "Item added to cart"
        );
        Ok(snapshot)
    }

    /// Sets a line's quantity. Zero removes the line.
    #[instrument(skip(self))]
    pub async fn update_item(&self, session_id: &str, cart_id: &str, quantity: i64) -> CartResult<CartSnapshot> {
        validate_id("cartId", cart_id)?;

        let settings = self.settings().await;
        validate_update_quantity(quantity, settings.config.cart.max_quantity)?;

        let _session = self.session_locks.lock(session_id).await;
        let mut cart = self.require_cart(session_id).await?;

        let line = cart
            .get(cart_id)
            .cloned()
            .ok_or_else(|| CartError::ItemNotFound(cart_id.to_string()))?;

        if quantity == 0 {
            cart.remove_item(cart_id)?;
            debug!(session_id = %session_id, cart_id = %cart_id, "Line removed by zero quantity");
            return self.commit(&settings, cart, settings.shipping.as_ref()).await;
        }

        cart.ensure_line_fits(cart_id, line.unit_price(), quantity)?;

        let (product, variant) = self
            .fetch_product(&line.product_id, line.variant_id.as_deref())
            .await?;

        let _stock = self
            .reserve_stock(&settings, session_id, cart_id, quantity, &product, variant.as_ref())
            .await?;

        cart.set_quantity(cart_id, quantity)?;
        let snapshot = self.commit(&settings, cart, settings.shipping.as_ref()).await?;

        info!(session_id = %session_id, cart_id = %cart_id, quantity, "Cart line updated");
        Ok(snapshot)
    }

    /// Removes a line from the cart.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, session_id: &str, cart_id: &str) -> CartResult<CartSnapshot> {
        let settings = self.settings().await;
        let _session = self.session_locks.lock(session_id).await;

        let mut cart = self
            .load_cart(session_id)
            .await?
            .ok_or_else(|| CartError::ItemNotFound(cart_id.to_string()))?;
        cart.remove_item(cart_id)?;

        info!(session_id = %session_id, cart_id = %cart_id, "Item removed from cart");
        self.commit(&settings, cart, settings.shipping.as_ref()).await
    }

    /// Empties the cart. Idempotent.
    #[instrument(skip(self))]
    pub async fn empty_cart(&self, session_id: &str) -> CartResult<CartSnapshot> {
        let settings = self.settings().await;
        let _session = self.session_locks.lock(session_id).await;

        let snapshot = self
            .commit(&settings, Cart::new(session_id), settings.shipping.as_ref())
            .await?;

        info!(session_id = %session_id, "Cart emptied");
        Ok(snapshot)
    }

    /// Reads the cart. A session without one gets an empty snapshot.
    pub async fn get_cart(&self, session_id: &str) -> CartResult<CartSnapshot> {
        if let Some(snapshot) = self.sessions.load(session_id).await? {
            return Ok(snapshot);
        }

        match self.carts.load_cart(session_id).await? {
            Some(mut cart) => {
                let settings = self.settings().await;
                let discount = self.resolve_discount(&settings, &mut cart).await?;
                let totals = totals::recompute(&cart, discount.as_ref(), settings.shipping.as_ref());
                Ok(CartSnapshot { cart, totals })
            }
            None => Ok(CartSnapshot::empty(session_id)),
        }
    }

    /// Re-checks every line against current stock before checkout.
    ///
    /// Lines are checked in order; the first shortfall is returned.
    #[instrument(skip(self))]
    pub async fn validate_cart_stock(&self, session_id: &str) -> CartResult<()> {
        let settings = self.settings().await;
        let _session = self.session_locks.lock(session_id).await;

        let Some(cart) = self.load_cart(session_id).await? else {
            return Ok(());
        };

        if !settings.config.cart.track_stock {
            return Ok(());
        }

        for line in cart.items.values() {
            let (product, variant) = self
                .fetch_product(&line.product_id, line.variant_id.as_deref())
                .await?;

            if !stock::requires_check(true, &product) {
                continue;
            }

            let available = stock::effective_stock(&product, variant.as_ref());
            self.ledger
                .check(&line.cart_id, session_id, line.quantity, available)
                .await?;
        }

        debug!(session_id = %session_id, lines = cart.items.len(), "Cart stock validated");
        Ok(())
    }

    /// Fresh totals immediately before payment.
    ///
    /// `shipping` overrides the configured rule for this checkout, e.g.
    /// [`storefront_core::NoShipping`] for in-store pickup.
    #[instrument(skip(self, shipping))]
    pub async fn checkout_totals(
        &self,
        session_id: &str,
        shipping: Option<&dyn ShippingRule>,
    ) -> CartResult<CartTotals> {
        let settings = self.settings().await;
        let _session = self.session_locks.lock(session_id).await;

        let cart = self.require_cart(session_id).await?;
        let rule = shipping.unwrap_or(settings.shipping.as_ref());
        let snapshot = self.commit(&settings, cart, rule).await?;

        info!(
            session_id = %session_id,
            grand_total_cents = snapshot.totals.grand_total_cents,
            "Checkout totals computed"
        );
        Ok(snapshot.totals)
    }

    /// Records the order created for this cart while payment is pending.
    #[instrument(skip(self))]
    pub async fn set_pending_order(&self, session_id: &str, order_id: &str) -> CartResult<CartSnapshot> {
        validate_id("orderId", order_id)?;
        let settings = self.settings().await;
        let _session = self.session_locks.lock(session_id).await;

        let mut cart = self.require_cart(session_id).await?;
        cart.pending_order_id = Some(order_id.to_string());
        self.commit(&settings, cart, settings.shipping.as_ref()).await
    }

    /// Destroys the cart after a successful payment, returning what was
    /// purchased.
    #[instrument(skip(self))]
    pub async fn complete_checkout(&self, session_id: &str) -> CartResult<CartSnapshot> {
        let settings = self.settings().await;
        let _session = self.session_locks.lock(session_id).await;

        let mut cart = self.require_cart(session_id).await?;
        let discount = self.resolve_discount(&settings, &mut cart).await?;
        let totals = totals::recompute(&cart, discount.as_ref(), settings.shipping.as_ref());
        let snapshot = CartSnapshot { cart, totals };

        self.sessions.remove(session_id).await?;
        self.carts.delete_cart(session_id).await?;
        info!(
            session_id = %session_id,
            order_id = ?snapshot.cart.pending_order_id,
            grand_total_cents = snapshot.totals.grand_total_cents,
            "Checkout completed"
        );
        Ok(snapshot)
    }

    // =========================================================================
    // Discounts
    // =========================================================================

    /// Applies a discount code.
    ///
    /// An unknown or lapsed code also clears whatever code was applied
    /// before; the cleared totals are persisted before the error returns.
    #[instrument(skip(self))]
    pub async fn apply_discount(&self, session_id: &str, code: &str) -> CartResult<CartSnapshot> {
        validate_discount_code(code)?;
        let code = code.trim();

        let settings = self.settings().await;
        let _session = self.session_locks.lock(session_id).await;
        let mut cart = self.require_cart(session_id).await?;

        let found = if settings.config.cart.discounts_enabled {
            self.discounts.get_discount(code).await?
        } else {
            None
        };

        match found {
            Some(d) if discount::is_active(&d, Utc::now()) => {
                cart.discount_code = Some(d.code);
                let snapshot = self.commit(&settings, cart, settings.shipping.as_ref()).await?;
                info!(
                    session_id = %session_id,
                    code = %code,
                    discount_cents = snapshot.totals.discount_amount_cents,
                    "Discount applied"
                );
                Ok(snapshot)
            }
            _ => {
                cart.discount_code = None;
                self.commit(&settings, cart, settings.shipping.as_ref()).await?;
                warn!(session_id = %session_id, code = %code, "Rejected discount code");
                Err(CartError::InvalidOrExpiredCode(code.to_string()))
            }
        }
    }

    /// Removes the applied discount code.
    #[instrument(skip(self))]
    pub async fn remove_discount(&self, session_id: &str) -> CartResult<CartSnapshot> {
        let settings = self.settings().await;
        let _session = self.session_locks.lock(session_id).await;

        let mut cart = self.require_cart(session_id).await?;
        cart.discount_code = None;
        self.commit(&settings, cart, settings.shipping.as_ref()).await
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Purges expired sessions and deletes cart rows no live session owns.
    ///
    /// Stored rows are listed before live sessions, and every candidate is
    /// re-checked under its session lock right before its rows go. A shopper
    /// who comes back mid-sweep keeps the cart.
    pub async fn sweep_orphans(&self) -> CartResult<SweepReport> {
        let purged_sessions = self.sessions.purge_expired().await?;

        let stored = self.carts.stored_session_ids().await?;
        let live: HashSet<String> = self.sessions.live_session_ids().await?.into_iter().collect();

        let mut deleted_carts = 0;
        for session_id in stored.into_iter().filter(|id| !live.contains(id)) {
            let _session = self.session_locks.lock(&session_id).await;
            if self.sessions.load(&session_id).await?.is_some() {
                debug!(session_id = %session_id, "Session came back during sweep, keeping cart");
                continue;
            }
            deleted_carts += self.carts.delete_carts(std::slice::from_ref(&session_id)).await?;
        }

        let pruned_locks = self.session_locks.prune().await + self.stock_locks.prune().await;

        Ok(SweepReport {
            purged_sessions,
            deleted_carts,
            pruned_locks,
        })
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Product plus optional variant. Missing, unpublished or a variant of
    /// another product all read as not found.
    async fn fetch_product(
        &self,
        product_id: &str,
        variant_id: Option<&str>,
    ) -> CartResult<(CatalogProduct, Option<CatalogVariant>)> {
        let product = self
            .catalog
            .get_product(product_id)
            .await?
            .filter(|p| p.published)
            .ok_or_else(|| CartError::ProductNotFound(product_id.to_string()))?;

        let variant = match variant_id {
            Some(id) => Some(
                self.catalog
                    .get_variant(id, product_id)
                    .await?
                    .ok_or_else(|| CartError::ProductNotFound(id.to_string()))?,
            ),
            None => None,
        };

        Ok((product, variant))
    }

    /// Session snapshot first, durable rows as fallback.
    async fn load_cart(&self, session_id: &str) -> CartResult<Option<Cart>> {
        if let Some(snapshot) = self.sessions.load(session_id).await? {
            return Ok(Some(snapshot.cart));
        }
        self.carts.load_cart(session_id).await
    }

    /// A non-empty cart, or `CartNotFound`.
    async fn require_cart(&self, session_id: &str) -> CartResult<Cart> {
        self.load_cart(session_id)
            .await?
            .filter(|c| !c.is_empty())
            .ok_or_else(|| CartError::CartNotFound(session_id.to_string()))
    }

    /// Takes the stock lock and checks availability when tracking applies.
    /// The returned guard must live until the cart is persisted.
    async fn reserve_stock(
        &self,
        settings: &Settings,
        session_id: &str,
        cart_id: &str,
        requested_total: i64,
        product: &CatalogProduct,
        variant: Option<&CatalogVariant>,
    ) -> CartResult<Option<OwnedMutexGuard<()>>> {
        if !stock::requires_check(settings.config.cart.track_stock, product) {
            return Ok(None);
        }

        let Some(available) = stock::effective_stock(product, variant) else {
            return Ok(None);
        };

        let guard = self.stock_locks.lock(cart_id).await;
        self.ledger
            .check(cart_id, session_id, requested_total, Some(available))
            .await?;
        Ok(Some(guard))
    }

    /// Looks up the applied code. A missing or lapsed code is cleared.
    async fn resolve_discount(&self, settings: &Settings, cart: &mut Cart) -> CartResult<Option<Discount>> {
        let Some(code) = cart.discount_code.clone() else {
            return Ok(None);
        };

        if settings.config.cart.discounts_enabled {
            if let Some(d) = self.discounts.get_discount(&code).await? {
                if discount::is_active(&d, Utc::now()) {
                    return Ok(Some(d));
                }
            }
        }

        info!(session_id = %cart.session_id, code = %code, "Clearing lapsed discount code");
        cart.discount_code = None;
        Ok(None)
    }

    /// Recomputes totals and persists. An empty cart is reset and its rows
    /// deleted.
    ///
    /// ## Write Order
    /// ```text
    /// load previous rows
    ///      │
    ///      ▼
    /// write rows (save or delete) ──► Err: nothing changed, return
    ///      │
    ///      ▼
    /// write session snapshot ───────► Err: restore previous rows, return
    ///      │
    ///      ▼
    /// Ok(snapshot)
    /// ```
    async fn commit(&self, settings: &Settings, mut cart: Cart, shipping: &dyn ShippingRule) -> CartResult<CartSnapshot> {
        let snapshot = if cart.is_empty() {
            cart.clear();
            CartSnapshot {
                cart,
                totals: CartTotals::default(),
            }
        } else {
            let discount = self.resolve_discount(settings, &mut cart).await?;
            let totals = totals::recompute(&cart, discount.as_ref(), shipping);
            CartSnapshot { cart, totals }
        };
        let session_id = snapshot.cart.session_id.as_str();

        let previous = self.carts.load_cart(session_id).await?;
        if snapshot.cart.is_empty() {
            self.carts.delete_cart(session_id).await?;
        } else {
            self.carts.save_cart(&snapshot.cart, &snapshot.totals).await?;
        }

        if let Err(err) = self.sessions.save(session_id, &snapshot).await {
            self.restore_rows(settings, session_id, previous, shipping).await;
            return Err(err);
        }

        debug!(
            session_id = %snapshot.cart.session_id,
            net_cents = snapshot.totals.net_amount_cents,
            grand_total_cents = snapshot.totals.grand_total_cents,
            "Cart committed"
        );
        Ok(snapshot)
    }

    /// Puts a session's cart rows back after its session write failed.
    async fn restore_rows(&self, settings: &Settings, session_id: &str, previous: Option<Cart>, shipping: &dyn ShippingRule) {
        let restored = match previous {
            Some(mut cart) => match self.resolve_discount(settings, &mut cart).await {
                Ok(discount) => {
                    let totals = totals::recompute(&cart, discount.as_ref(), shipping);
                    self.carts.save_cart(&cart, &totals).await
                }
                Err(err) => Err(err),
            },
            None => self.carts.delete_cart(session_id).await,
        };

        if let Err(err) = restored {
            error!(session_id = %session_id, error = %err, "Failed to restore cart rows after session write failure");
        }
    }
}

/// What one sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub purged_sessions: u64,
    pub deleted_carts: u64,
    pub pruned_locks: usize,
}
