//! The cart engine.
//!
//! [`CartManager`] owns the authoritative line set in memory and mirrors it
//! to whichever backend the current identity selects: database rows for an
//! authenticated user, a local snapshot for a guest. Mutations update memory
//! first and treat the backend write as best-effort, so a flaky backend
//! slows nothing down and loses nothing visible.

use lockerroom_core::{Price, ProductId, UserId};
use tracing::{debug, error, instrument, warn};

use crate::identity::IdentityWatch;
use crate::item::{CartSummary, LineItem};
use crate::snapshot::SnapshotStore;
use crate::store::{CartStore, StoreError};

/// Outcome of the backend write that follows a mutation.
///
/// Mutations never fail. `Pending` means the in-memory cart is ahead of its
/// backend; a later successful write or a reload converges the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    /// The backend accepted the write.
    Saved,
    /// The write was skipped or refused; memory holds the newer state.
    Pending,
}

/// Reconciles the in-memory cart with its identity-selected backend.
#[derive(Debug)]
pub struct CartManager<R, S> {
    remote: R,
    local: S,
    identity: IdentityWatch,
    current: Option<UserId>,
    items: Vec<LineItem>,
    loaded: bool,
    stale: bool,
}

impl<R: CartStore, S: SnapshotStore> CartManager<R, S> {
    #[must_use]
    pub fn new(remote: R, local: S, mut identity: IdentityWatch) -> Self {
        let current = *identity.borrow_and_update();
        Self {
            remote,
            local,
            identity,
            current,
            items: Vec::new(),
            loaded: false,
            stale: false,
        }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Replace the in-memory lines with whatever the current identity's
    /// backend holds.
    ///
    /// Loading is fail-open: a backend that cannot be read yields an empty
    /// cart and a log line, never an error for the caller to handle.
    #[instrument(skip(self))]
    pub async fn load(&mut self) {
        self.current = *self.identity.borrow_and_update();

        self.items = match self.current {
            Some(user_id) => match self.remote.list_for_user(user_id).await {
                Ok(rows) => {
                    self.stale = false;
                    rows.into_iter().map(LineItem::from).collect()
                }
                Err(err) => {
                    if matches!(err, StoreError::DataCorruption(_)) {
                        error!(error = %err, %user_id, "Cart rows are corrupted, starting empty");
                    } else {
                        warn!(error = %err, %user_id, "Failed to load cart rows, starting empty");
                    }
                    self.stale = true;
                    Vec::new()
                }
            },
            None => {
                self.stale = false;
                self.local.read().await.unwrap_or_default()
            }
        };

        self.loaded = true;
    }

    /// Wait for the next identity transition, then reload for it.
    ///
    /// The previous identity's lines are replaced wholesale; nothing is
    /// carried across an identity boundary. Returns `false` once the
    /// identity publisher has gone away.
    pub async fn identity_changed(&mut self) -> bool {
        if self.identity.changed().await.is_err() {
            return false;
        }
        self.load().await;
        true
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add a line, folding it into an existing line with the same product
    /// and size by summing quantities.
    #[instrument(skip(self, item), fields(product_id = %item.product_id))]
    pub async fn add_line(&mut self, item: LineItem) -> Persistence {
        let product_id = item.product_id;
        let size = item.size.clone();

        let quantity = if let Some(line) = self.find_line_mut(product_id, size.as_deref()) {
            line.quantity = line.quantity.saturating_add(item.quantity.max(1));
            line.quantity
        } else {
            let mut line = item;
            line.quantity = line.quantity.max(1);
            let quantity = line.quantity;
            self.items.push(line);
            quantity
        };

        if !self.loaded {
            debug!(%product_id, "Cart not loaded yet, holding write");
            self.mark_dirty(product_id, size.as_deref());
            return Persistence::Pending;
        }

        match self.current {
            Some(user_id) => {
                self.upsert_remote(user_id, product_id, size.as_deref(), quantity)
                    .await
            }
            None => self.write_snapshot().await,
        }
    }

    /// Shift a line's quantity by `delta`, clamping at one.
    ///
    /// A line never reaches zero this way; removal is explicit.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_quantity(
        &mut self,
        product_id: ProductId,
        size: Option<&str>,
        delta: i64,
    ) -> Persistence {
        let Some(line) = self.find_line_mut(product_id, size) else {
            debug!(%product_id, "No matching line to update");
            return Persistence::Saved;
        };

        let shifted = i64::from(line.quantity).saturating_add(delta).max(1);
        let quantity = u32::try_from(shifted).unwrap_or(u32::MAX);
        if quantity == line.quantity {
            debug!(%product_id, quantity, "Quantity unchanged, skipping write");
            return Persistence::Saved;
        }
        line.quantity = quantity;

        if !self.loaded {
            debug!(%product_id, "Cart not loaded yet, holding write");
            self.mark_dirty(product_id, size);
            return Persistence::Pending;
        }

        match self.current {
            Some(user_id) => self.upsert_remote(user_id, product_id, size, quantity).await,
            None => self.write_snapshot().await,
        }
    }

    /// Remove the line matching `product_id` and `size` exactly.
    ///
    /// `None` removes the sizeless line only, never a sized sibling.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_line(&mut self, product_id: ProductId, size: Option<&str>) -> Persistence {
        let before = self.items.len();
        self.items.retain(|line| !line.matches(product_id, size));
        if self.items.len() == before {
            debug!(%product_id, "No matching line to remove");
            return Persistence::Saved;
        }

        if !self.loaded {
            debug!(%product_id, "Cart not loaded yet, holding write");
            self.stale = true;
            return Persistence::Pending;
        }

        match self.current {
            Some(user_id) => match self.remote.delete(user_id, product_id, size).await {
                Ok(()) => Persistence::Saved,
                Err(err) => {
                    warn!(error = %err, %product_id, "Failed to delete cart row");
                    self.stale = true;
                    Persistence::Pending
                }
            },
            None => self.write_snapshot().await,
        }
    }

    /// Empty the cart and its backend.
    ///
    /// The backend write goes out even when memory is already empty, so a
    /// clear issued after a failed load still scrubs whatever the backend
    /// holds.
    #[instrument(skip(self))]
    pub async fn clear(&mut self) -> Persistence {
        self.items.clear();

        if !self.loaded {
            debug!("Cart not loaded yet, holding write");
            self.stale = true;
            return Persistence::Pending;
        }

        match self.current {
            Some(user_id) => match self.remote.delete_all(user_id).await {
                Ok(()) => {
                    self.stale = false;
                    Persistence::Saved
                }
                Err(err) => {
                    warn!(error = %err, %user_id, "Failed to clear cart rows");
                    self.stale = true;
                    Persistence::Pending
                }
            },
            None => match self.local.clear().await {
                Ok(()) => {
                    self.stale = false;
                    Persistence::Saved
                }
                Err(err) => {
                    warn!(error = %err, "Failed to clear cart snapshot");
                    self.stale = true;
                    Persistence::Pending
                }
            },
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |count, line| count.saturating_add(line.quantity))
    }

    /// Sum of every line's unit price times quantity.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(LineItem::line_total).sum()
    }

    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary {
            count: self.count(),
            total: self.total(),
        }
    }

    /// Identity the current lines belong to.
    #[must_use]
    pub const fn identity(&self) -> Option<UserId> {
        self.current
    }

    /// Whether an initial load has completed for the current identity.
    #[must_use]
    pub const fn has_loaded(&self) -> bool {
        self.loaded
    }

    /// True when every line has reached its backend.
    #[must_use]
    pub fn is_synced(&self) -> bool {
        !self.stale && self.items.iter().all(|line| !line.dirty)
    }

    // =========================================================================
    // Backend writes
    // =========================================================================

    async fn upsert_remote(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
        size: Option<&str>,
        quantity: u32,
    ) -> Persistence {
        match self.remote.upsert(user_id, product_id, size, quantity).await {
            Ok(row_id) => {
                if let Some(line) = self.find_line_mut(product_id, size) {
                    line.remote_row_id = Some(row_id);
                    line.dirty = false;
                }
                Persistence::Saved
            }
            Err(err) => {
                warn!(error = %err, %product_id, "Failed to upsert cart row");
                self.mark_dirty(product_id, size);
                Persistence::Pending
            }
        }
    }

    async fn write_snapshot(&mut self) -> Persistence {
        match self.local.write(&self.items).await {
            Ok(()) => {
                for line in &mut self.items {
                    line.dirty = false;
                }
                self.stale = false;
                Persistence::Saved
            }
            Err(err) => {
                warn!(error = %err, "Failed to write cart snapshot");
                self.stale = true;
                Persistence::Pending
            }
        }
    }

    fn find_line_mut(
        &mut self,
        product_id: ProductId,
        size: Option<&str>,
    ) -> Option<&mut LineItem> {
        self.items
            .iter_mut()
            .find(|line| line.matches(product_id, size))
    }

    fn mark_dirty(&mut self, product_id: ProductId, size: Option<&str>) {
        if let Some(line) = self.find_line_mut(product_id, size) {
            line.dirty = true;
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use lockerroom_core::CartItemId;
    use uuid::Uuid;

    use super::*;
    use crate::identity::IdentitySignal;
    use crate::memory::{MemoryCartStore, MemorySnapshotStore};
    use crate::store::{CartRow, StoreError};

    /// Store whose writes always fail, as a pool with no reachable database.
    #[derive(Debug, Clone, Default)]
    struct DownStore;

    impl CartStore for DownStore {
        async fn list_for_user(&self, _user_id: UserId) -> Result<Vec<CartRow>, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn upsert(
            &self,
            _user_id: UserId,
            _product_id: ProductId,
            _size: Option<&str>,
            _quantity: u32,
        ) -> Result<CartItemId, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn delete(
            &self,
            _user_id: UserId,
            _product_id: ProductId,
            _size: Option<&str>,
        ) -> Result<(), StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn delete_all(&self, _user_id: UserId) -> Result<(), StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    fn jersey(quantity: u32) -> LineItem {
        LineItem::new(
            ProductId::new(10),
            "Home Jersey 24/25",
            Price::from_cents(8999),
            "/images/home-jersey.webp",
            quantity,
            Some("M"),
        )
    }

    async fn guest_manager() -> CartManager<MemoryCartStore, MemorySnapshotStore> {
        let identity = IdentitySignal::default();
        let mut cart = CartManager::new(
            MemoryCartStore::default(),
            MemorySnapshotStore::default(),
            identity.subscribe(),
        );
        cart.load().await;
        cart
    }

    #[tokio::test]
    async fn adding_the_same_variant_merges_into_one_line() {
        let mut cart = guest_manager().await;

        assert_eq!(cart.add_line(jersey(1)).await, Persistence::Saved);
        assert_eq!(cart.add_line(jersey(2)).await, Persistence::Saved);

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.count(), 3);
    }

    #[tokio::test]
    async fn sizeless_and_sized_are_distinct_lines() {
        let mut cart = guest_manager().await;

        cart.add_line(jersey(1)).await;
        let mut sizeless = jersey(1);
        sizeless.size = None;
        cart.add_line(sizeless).await;

        assert_eq!(cart.items().len(), 2);

        cart.remove_line(ProductId::new(10), None).await;
        assert_eq!(cart.items().len(), 1);
        assert_eq!(
            cart.items().first().unwrap().size.as_deref(),
            Some("M")
        );
    }

    #[tokio::test]
    async fn quantity_never_drops_below_one() {
        let mut cart = guest_manager().await;
        cart.add_line(jersey(2)).await;

        cart.update_quantity(ProductId::new(10), Some("M"), -100)
            .await;

        assert_eq!(cart.items().first().unwrap().quantity, 1);
    }

    #[tokio::test]
    async fn extreme_deltas_clamp_without_overflow() {
        let mut cart = guest_manager().await;
        cart.add_line(jersey(2)).await;

        cart.update_quantity(ProductId::new(10), Some("M"), i64::MIN)
            .await;
        assert_eq!(cart.items().first().unwrap().quantity, 1);

        cart.update_quantity(ProductId::new(10), Some("M"), i64::MAX)
            .await;
        assert_eq!(cart.items().first().unwrap().quantity, u32::MAX);
    }

    #[tokio::test]
    async fn removing_the_last_line_leaves_an_empty_cart() {
        let mut cart = guest_manager().await;
        cart.add_line(jersey(1)).await;

        cart.remove_line(ProductId::new(10), Some("M")).await;

        assert!(cart.is_empty());
        assert_eq!(cart.count(), 0);
        assert_eq!(cart.total().to_string(), "$0.00");
    }

    #[tokio::test]
    async fn updating_an_absent_line_is_a_quiet_no_op() {
        let mut cart = guest_manager().await;

        let outcome = cart.update_quantity(ProductId::new(404), None, 1).await;

        assert_eq!(outcome, Persistence::Saved);
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn clear_scrubs_the_snapshot_slot() {
        let identity = IdentitySignal::default();
        let local = MemorySnapshotStore::default();
        let mut cart = CartManager::new(
            MemoryCartStore::default(),
            local.clone(),
            identity.subscribe(),
        );
        cart.load().await;

        cart.add_line(jersey(1)).await;
        assert!(local.read().await.is_some());

        assert_eq!(cart.clear().await, Persistence::Saved);
        assert!(cart.is_empty());
        assert_eq!(local.read().await, None);
    }

    #[tokio::test]
    async fn mutations_before_load_stay_in_memory() {
        let identity = IdentitySignal::default();
        let local = MemorySnapshotStore::default();
        let mut cart = CartManager::new(
            MemoryCartStore::default(),
            local.clone(),
            identity.subscribe(),
        );

        let outcome = cart.add_line(jersey(1)).await;

        assert_eq!(outcome, Persistence::Pending);
        assert_eq!(cart.count(), 1);
        assert_eq!(local.read().await, None);
        assert!(!cart.is_synced());
    }

    #[tokio::test]
    async fn summary_totals_across_lines() {
        let mut cart = guest_manager().await;
        cart.add_line(jersey(2)).await;
        cart.add_line(LineItem::new(
            ProductId::new(5),
            "Keeper Gloves",
            Price::from_cents(4500),
            "/images/gloves.webp",
            1,
            None,
        ))
        .await;

        let summary = cart.summary();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.total.to_string(), "$224.98");
    }

    #[tokio::test]
    async fn authenticated_add_records_the_backing_row() {
        let user = UserId::new(Uuid::new_v4());
        let remote = MemoryCartStore::default();
        remote.insert_product(
            ProductId::new(10),
            "Home Jersey 24/25",
            Price::from_cents(8999),
            "/images/home-jersey.webp",
        );
        let identity = IdentitySignal::new(Some(user));
        let mut cart = CartManager::new(
            remote.clone(),
            MemorySnapshotStore::default(),
            identity.subscribe(),
        );
        cart.load().await;

        assert_eq!(cart.add_line(jersey(1)).await, Persistence::Saved);

        let line = cart.items().first().unwrap();
        assert!(line.remote_row_id.is_some());
        assert!(cart.is_synced());
        assert_eq!(remote.list_for_user(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_write_keeps_the_line_and_marks_it_dirty() {
        let identity = IdentitySignal::new(Some(UserId::new(Uuid::new_v4())));
        let mut cart = CartManager::new(
            DownStore,
            MemorySnapshotStore::default(),
            identity.subscribe(),
        );
        cart.loaded = true;

        let outcome = cart.add_line(jersey(1)).await;

        assert_eq!(outcome, Persistence::Pending);
        assert_eq!(cart.count(), 1);
        assert!(cart.items().first().unwrap().dirty);
        assert!(!cart.is_synced());
    }

    #[tokio::test]
    async fn unreachable_backend_loads_as_an_empty_cart() {
        let identity = IdentitySignal::new(Some(UserId::new(Uuid::new_v4())));
        let mut cart = CartManager::new(
            DownStore,
            MemorySnapshotStore::default(),
            identity.subscribe(),
        );

        cart.load().await;

        assert!(cart.has_loaded());
        assert!(cart.is_empty());
        assert!(!cart.is_synced());
    }

    #[tokio::test]
    async fn corrupted_rows_load_as_an_empty_cart() {
        let user = UserId::new(Uuid::new_v4());
        let remote = MemoryCartStore::default();
        // Row for a product the catalog no longer knows.
        remote
            .upsert(user, ProductId::new(99), None, 1)
            .await
            .unwrap();

        let identity = IdentitySignal::new(Some(user));
        let mut cart = CartManager::new(
            remote,
            MemorySnapshotStore::default(),
            identity.subscribe(),
        );
        cart.load().await;

        assert!(cart.is_empty());
        assert!(!cart.is_synced());
    }
}
