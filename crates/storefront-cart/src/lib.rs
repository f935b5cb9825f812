//! # storefront-cart: Cart Service for the Storefront
//!
//! Stock-aware cart operations for shopper sessions: add, update, remove,
//! empty, discount codes and checkout totals.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Request handler (one per shopper request)            │
//! │                               │                                         │
//! │                               ▼                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                         CartService                              │  │
//! │  │                                                                  │  │
//! │  │  KeyedLocks (session) ──► KeyedLocks (cart_id) ──► StockLedger  │  │
//! │  │                                                                  │  │
//! │  │  storefront-core: Cart rules, discount, totals, shipping        │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │ ports                                   │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │ Catalog        │  │ SessionStore   │  │ CartStore              │    │
//! │  │ DiscountSource │  │ idle expiry    │  │ rows the ledger sums   │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! │                                                                         │
//! │  Sweeper task: expired sessions out, orphaned cart rows deleted        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`service`] - `CartService` and its operations
//! - [`ledger`] - Stock held by other sessions
//! - [`locks`] - Per-key async mutexes
//! - [`ports`] - Collaborator traits
//! - [`sqlite`] / [`memory`] - Port implementations
//! - [`config`] - Layered `StoreConfig`
//! - [`response`] - `CartResponse` and `ApiError`
//! - [`sweeper`] - Background orphan sweep
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use storefront_cart::{sqlite, AddItemRequest, CartService, StoreConfig};
//! use storefront_db::{Database, DbConfig};
//!
//! let config = StoreConfig::load(None)?;
//! let db = Database::new(DbConfig::new(&config.database.path)).await?;
//! let service = Arc::new(CartService::new(
//!     config.clone(),
//!     sqlite::ports(db, config.session_ttl()),
//! ));
//!
//! let snapshot = service
//!     .add_item("sess-a", AddItemRequest::new("mug", 2))
//!     .await?;
//! println!("Grand total: {}", snapshot.totals.grand_total());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod ledger;
pub mod locks;
pub mod memory;
pub mod ports;
pub mod response;
pub mod service;
pub mod sqlite;
pub mod sweeper;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::StoreConfig;
pub use error::{ConfigError, ConfigResult};
pub use ledger::{StockLedger, StockLevel};
pub use ports::Ports;
pub use response::{ApiError, CartResponse, ErrorCode};
pub use service::{AddItemRequest, CartService, SweepReport};
pub use sweeper::spawn_sweeper;
