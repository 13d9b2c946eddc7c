//! Database operations for the remote `PostgreSQL` cart store.
//!
//! # Tables
//!
//! - `cart_items` - One row per (user, product, size) cart line, unique on
//!   that key with `NULL` sizes not distinct
//! - `products` - Catalog display fields joined at list time (owned by the
//!   catalog migrations, referenced here)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/cart/migrations/` and run via:
//! ```bash
//! sqlx migrate run --source crates/cart/migrations
//! ```

pub mod cart_items;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub use cart_items::CartItemRepository;

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
