//! Lockerroom cart state management.
//!
//! This crate owns the shopping cart: one authoritative in-memory line-item
//! set per session, persisted through whichever backend the visitor's
//! identity selects. Anonymous carts live in a local JSON snapshot;
//! authenticated carts live in remote `cart_items` rows. An identity
//! transition (login or logout) triggers a full reload from the newly active
//! backend, never a merge.
//!
//! Mutations apply to the in-memory set immediately and propagate to the
//! backend afterwards (optimistic updates). A failed write is logged and
//! leaves the in-memory state as the user saw it; the divergence is
//! observable through [`CartManager::is_synced`] and per-line dirty flags
//! until the next reload.
//!
//! # Example
//!
//! ```
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use lockerroom_cart::{CartManager, IdentitySignal, LineItem};
//! use lockerroom_cart::{MemoryCartStore, MemorySnapshotStore};
//! use lockerroom_core::{Price, ProductId};
//!
//! let identity = IdentitySignal::default();
//! let mut cart = CartManager::new(
//!     MemoryCartStore::default(),
//!     MemorySnapshotStore::default(),
//!     identity.subscribe(),
//! );
//! cart.load().await;
//!
//! let jersey = LineItem::new(
//!     ProductId::new(10),
//!     "Home Jersey 24/25",
//!     Price::from_cents(8999),
//!     "/images/home-jersey.webp",
//!     1,
//!     Some("M"),
//! );
//! cart.add_line(jersey).await;
//!
//! assert_eq!(cart.count(), 1);
//! assert_eq!(cart.total().to_string(), "$89.99");
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod item;
pub mod manager;
pub mod memory;
pub mod snapshot;
pub mod store;

pub use config::{CartConfig, ConfigError};
pub use db::CartItemRepository;
pub use error::{CartError, Result};
pub use identity::{IdentitySignal, IdentityWatch};
pub use item::{CartSummary, LineItem};
pub use manager::{CartManager, Persistence};
pub use memory::{MemoryCartStore, MemorySnapshotStore};
pub use snapshot::{FileSnapshotStore, SnapshotError, SnapshotStore};
pub use store::{CartRow, CartStore, StoreError};
