//! # Repository Module
//!
//! Database repository implementations for the storefront cart.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  storefront-cart adapters (sqlite.rs)                                  │
//! │       │                                                                 │
//! │       │  db.carts().held_quantity("mug", "sess-a")                     │
//! │       ▼                                                                 │
//! │  CartRepository                                                        │
//! │  ├── load / save / delete                                              │
//! │  ├── held_quantity(cart_id, excluding_session)                         │
//! │  └── session_ids / delete_many                                         │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Products and variants
//! - [`discount::DiscountRepository`] - Discount codes
//! - [`cart::CartRepository`] - Persisted carts and stock aggregation
//! - [`session::SessionRepository`] - Session snapshots with expiry

pub mod cart;
pub mod discount;
pub mod product;
pub mod session;
