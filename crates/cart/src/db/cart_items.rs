//! Cart item repository for database operations.
//!
//! Queries use the runtime-checked sqlx API; the crate must build without a
//! reachable database.

use sqlx::PgPool;

use lockerroom_core::{CartItemId, ProductId, UserId};

use crate::store::{CartRow, CartStore, StoreError};

/// Repository for cart item database operations.
///
/// Cheaply cloneable; the pool is reference-counted internally.
#[derive(Debug, Clone)]
pub struct CartItemRepository {
    pool: PgPool,
}

impl CartItemRepository {
    /// Create a new cart item repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CartStore for CartItemRepository {
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<CartRow>, StoreError> {
        let rows = sqlx::query_as::<_, CartRow>(
            r"
            SELECT ci.id, ci.product_id, ci.size, ci.quantity,
                   p.name, p.price AS unit_price, p.image_url
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.user_id = $1
            ORDER BY ci.created_at ASC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn upsert(
        &self,
        user_id: UserId,
        product_id: ProductId,
        size: Option<&str>,
        quantity: u32,
    ) -> Result<CartItemId, StoreError> {
        let quantity = i32::try_from(quantity).unwrap_or(i32::MAX);

        let id = sqlx::query_scalar::<_, CartItemId>(
            r"
            INSERT INTO cart_items (user_id, product_id, size, quantity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, product_id, size)
            DO UPDATE SET quantity = EXCLUDED.quantity
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(size)
        .bind(quantity)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn delete(
        &self,
        user_id: UserId,
        product_id: ProductId,
        size: Option<&str>,
    ) -> Result<(), StoreError> {
        // IS NOT DISTINCT FROM makes a NULL size match the sizeless row only.
        sqlx::query(
            r"
            DELETE FROM cart_items
            WHERE user_id = $1 AND product_id = $2 AND size IS NOT DISTINCT FROM $3
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(size)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_all(&self, user_id: UserId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
