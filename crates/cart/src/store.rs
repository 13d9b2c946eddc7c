//! Remote cart store contract.
//!
//! The engine never talks to the database directly; it goes through
//! [`CartStore`], which any row store with a composite-key upsert can
//! implement. The production implementation is
//! [`CartItemRepository`](crate::db::CartItemRepository); tests use
//! [`MemoryCartStore`](crate::memory::MemoryCartStore).

use thiserror::Error;

use lockerroom_core::{CartItemId, Price, ProductId, UserId};

/// Errors from a remote cart store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// One listed cart row, carrying the joined product display fields.
///
/// Resolving `name`/`unit_price`/`image_url` for a row is the store's
/// responsibility; the engine only consumes the finished shape.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CartRow {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub size: Option<String>,
    pub quantity: i32,
    pub name: String,
    pub unit_price: Price,
    pub image_url: String,
}

/// Remote cart persistence, scoped per call to an authenticated user.
///
/// Rows are keyed uniquely on `(user_id, product_id, size)` with a `NULL`
/// size treated as one more variant value, so two sizeless rows for the same
/// product cannot coexist.
#[allow(async_fn_in_trait)]
pub trait CartStore {
    /// List every cart row for a user, including product display fields.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the read fails, or
    /// `StoreError::DataCorruption` if a row cannot be resolved to a product.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<CartRow>, StoreError>;

    /// Insert or update the row keyed by `(user_id, product_id, size)`,
    /// setting its quantity to the absolute `quantity`. Returns the row id.
    ///
    /// Rapid writes to the same key converge last-write-wins on quantity
    /// rather than producing duplicate rows.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the write fails.
    async fn upsert(
        &self,
        user_id: UserId,
        product_id: ProductId,
        size: Option<&str>,
        quantity: u32,
    ) -> Result<CartItemId, StoreError>;

    /// Delete one row. A `None` size deletes the sizeless variant
    /// specifically, not all sizes of the product. Deleting a row that does
    /// not exist is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the delete fails.
    async fn delete(
        &self,
        user_id: UserId,
        product_id: ProductId,
        size: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Delete every cart row belonging to the user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the delete fails.
    async fn delete_all(&self, user_id: UserId) -> Result<(), StoreError>;
}
