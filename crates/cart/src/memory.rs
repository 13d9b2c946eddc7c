//! In-memory reference backends.
//!
//! Both stores are cloneable handles over shared state: a clone observes the
//! same rows and snapshot slot as its source. Tests keep one handle to
//! inspect what the engine persisted through the other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lockerroom_core::{CartItemId, Price, ProductId, UserId};

use crate::item::LineItem;
use crate::snapshot::{SnapshotError, SnapshotStore};
use crate::store::{CartRow, CartStore, StoreError};

#[derive(Debug, Clone)]
struct Product {
    name: String,
    price: Price,
    image_url: String,
}

#[derive(Debug)]
struct Row {
    id: CartItemId,
    user_id: UserId,
    product_id: ProductId,
    size: Option<String>,
    quantity: i32,
}

#[derive(Debug, Default)]
struct CartState {
    products: HashMap<ProductId, Product>,
    rows: Vec<Row>,
    last_id: i32,
}

impl CartState {
    fn next_id(&mut self) -> CartItemId {
        self.last_id += 1;
        CartItemId::new(self.last_id)
    }
}

/// In-memory [`CartStore`] with its own tiny product catalog, so listed rows
/// can be joined to display fields the way the database store joins them.
#[derive(Debug, Clone, Default)]
pub struct MemoryCartStore {
    inner: Arc<Mutex<CartState>>,
}

impl MemoryCartStore {
    /// Seed a catalog product for rows to join against.
    pub fn insert_product(&self, id: ProductId, name: &str, price: Price, image_url: &str) {
        self.lock().products.insert(
            id,
            Product {
                name: name.to_owned(),
                price,
                image_url: image_url.to_owned(),
            },
        );
    }

    fn lock(&self) -> MutexGuard<'_, CartState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CartStore for MemoryCartStore {
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<CartRow>, StoreError> {
        let state = self.lock();
        state
            .rows
            .iter()
            .filter(|row| row.user_id == user_id)
            .map(|row| {
                let product = state.products.get(&row.product_id).ok_or_else(|| {
                    StoreError::DataCorruption(format!(
                        "cart row {} references unknown product {}",
                        row.id, row.product_id
                    ))
                })?;

                Ok(CartRow {
                    id: row.id,
                    product_id: row.product_id,
                    size: row.size.clone(),
                    quantity: row.quantity,
                    name: product.name.clone(),
                    unit_price: product.price,
                    image_url: product.image_url.clone(),
                })
            })
            .collect()
    }

    async fn upsert(
        &self,
        user_id: UserId,
        product_id: ProductId,
        size: Option<&str>,
        quantity: u32,
    ) -> Result<CartItemId, StoreError> {
        let quantity = i32::try_from(quantity).unwrap_or(i32::MAX);
        let mut state = self.lock();

        if let Some(row) = state.rows.iter_mut().find(|row| {
            row.user_id == user_id && row.product_id == product_id && row.size.as_deref() == size
        }) {
            row.quantity = quantity;
            return Ok(row.id);
        }

        let id = state.next_id();
        state.rows.push(Row {
            id,
            user_id,
            product_id,
            size: size.map(str::to_owned),
            quantity,
        });
        Ok(id)
    }

    async fn delete(
        &self,
        user_id: UserId,
        product_id: ProductId,
        size: Option<&str>,
    ) -> Result<(), StoreError> {
        self.lock().rows.retain(|row| {
            row.user_id != user_id || row.product_id != product_id || row.size.as_deref() != size
        });
        Ok(())
    }

    async fn delete_all(&self, user_id: UserId) -> Result<(), StoreError> {
        self.lock().rows.retain(|row| row.user_id != user_id);
        Ok(())
    }
}

/// In-memory [`SnapshotStore`] holding the serialized cart in one slot.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemorySnapshotStore {
    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SnapshotStore for MemorySnapshotStore {
    async fn read(&self) -> Option<Vec<LineItem>> {
        let slot = self.lock();
        let json = slot.as_ref()?;
        match serde_json::from_str(json) {
            Ok(items) => Some(items),
            Err(e) => {
                tracing::warn!("Discarding malformed cart snapshot: {e}");
                None
            }
        }
    }

    async fn write(&self, items: &[LineItem]) -> Result<(), SnapshotError> {
        let json = serde_json::to_string(items)?;
        *self.lock() = Some(json);
        Ok(())
    }

    async fn clear(&self) -> Result<(), SnapshotError> {
        *self.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use uuid::Uuid;

    use super::*;

    fn user() -> UserId {
        UserId::new(Uuid::new_v4())
    }

    fn seeded_store() -> MemoryCartStore {
        let store = MemoryCartStore::default();
        store.insert_product(
            ProductId::new(10),
            "Home Jersey 24/25",
            Price::from_cents(8999),
            "/images/home-jersey.webp",
        );
        store
    }

    #[tokio::test]
    async fn upsert_updates_in_place_and_keeps_the_row_id() {
        let store = seeded_store();
        let user = user();

        let first = store
            .upsert(user, ProductId::new(10), Some("M"), 1)
            .await
            .unwrap();
        let second = store
            .upsert(user, ProductId::new(10), Some("M"), 3)
            .await
            .unwrap();
        assert_eq!(first, second);

        let rows = store.list_for_user(user).await.unwrap();
        assert_eq!(rows.len(), 1);
        let row = rows.first().unwrap();
        assert_eq!(row.quantity, 3);
        assert_eq!(row.name, "Home Jersey 24/25");
        assert_eq!(row.unit_price, Price::from_cents(8999));
    }

    #[tokio::test]
    async fn sizeless_delete_spares_sized_rows() {
        let store = seeded_store();
        let user = user();

        store
            .upsert(user, ProductId::new(10), Some("M"), 1)
            .await
            .unwrap();
        store
            .upsert(user, ProductId::new(10), None, 1)
            .await
            .unwrap();

        store.delete(user, ProductId::new(10), None).await.unwrap();

        let rows = store.list_for_user(user).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows.first().unwrap().size.as_deref(), Some("M"));
    }

    #[tokio::test]
    async fn rows_are_scoped_per_user() {
        let store = seeded_store();
        let (alice, bob) = (user(), user());

        store
            .upsert(alice, ProductId::new(10), None, 2)
            .await
            .unwrap();
        store
            .upsert(bob, ProductId::new(10), None, 5)
            .await
            .unwrap();

        store.delete_all(alice).await.unwrap();

        assert!(store.list_for_user(alice).await.unwrap().is_empty());
        assert_eq!(store.list_for_user(bob).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn listing_a_row_without_its_product_is_corruption() {
        let store = MemoryCartStore::default();
        let user = user();
        store
            .upsert(user, ProductId::new(99), None, 1)
            .await
            .unwrap();

        let err = store.list_for_user(user).await.unwrap_err();
        assert!(matches!(err, StoreError::DataCorruption(_)));
    }

    #[tokio::test]
    async fn malformed_slot_content_reads_as_no_cart() {
        let store = MemorySnapshotStore::default();
        *store.lock() = Some("{ not json".to_owned());

        assert_eq!(store.read().await, None);
    }

    #[tokio::test]
    async fn snapshot_clones_share_the_slot() {
        let store = MemorySnapshotStore::default();
        let observer = store.clone();

        let items = vec![LineItem::new(
            ProductId::new(5),
            "Keeper Gloves",
            Price::from_cents(4500),
            "/images/gloves.webp",
            1,
            None,
        )];
        store.write(&items).await.unwrap();
        assert_eq!(observer.read().await, Some(items));

        store.clear().await.unwrap();
        assert_eq!(observer.read().await, None);
    }
}
