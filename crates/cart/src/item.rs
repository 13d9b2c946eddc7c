//! The canonical line-item shape and its derived values.

use serde::{Deserialize, Serialize};

use lockerroom_core::{CartItemId, Price, ProductId};

use crate::store::CartRow;

/// One product+size+quantity entry in a cart.
///
/// `(product_id, size)` is the uniqueness key: the same product in two sizes
/// is two lines, while a repeated add of the same product and size merges by
/// summing quantity. A `None` size is itself a distinct variant value.
///
/// Display data (`name`, `unit_price`, `image_url`) is denormalized at the
/// time the item is added, not re-fetched on every render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    /// Backing row in the remote store; absent for guest/local-only lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_row_id: Option<CartItemId>,
    pub name: String,
    pub unit_price: Price,
    pub image_url: String,
    /// Always >= 1; a line that would reach zero is removed instead.
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Set when the backend write for this line was skipped or failed.
    /// Never persisted; cleared by the next successful write or reload.
    #[serde(skip)]
    pub dirty: bool,
}

impl LineItem {
    /// Build a candidate line for [`CartManager::add_line`], with no backing
    /// row and display data captured now. Quantity is clamped to at least 1.
    ///
    /// [`CartManager::add_line`]: crate::CartManager::add_line
    #[must_use]
    pub fn new(
        product_id: ProductId,
        name: impl Into<String>,
        unit_price: Price,
        image_url: impl Into<String>,
        quantity: u32,
        size: Option<&str>,
    ) -> Self {
        Self {
            product_id,
            remote_row_id: None,
            name: name.into(),
            unit_price,
            image_url: image_url.into(),
            quantity: quantity.max(1),
            size: size.map(str::to_owned),
            dirty: false,
        }
    }

    /// Whether this line is the `(product_id, size)` variant. A `None` size
    /// matches only the sizeless line, never "any size".
    #[must_use]
    pub fn matches(&self, product_id: ProductId, size: Option<&str>) -> bool {
        self.product_id == product_id && self.size.as_deref() == size
    }

    /// Subtotal for this line: unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price * self.quantity
    }
}

/// Translate a listed remote row into the canonical line-item shape.
///
/// The row's stored quantity and size are combined with the joined product
/// display fields; a quantity the store should never hold (zero or negative)
/// degrades to 1 rather than violating the line-item invariant.
impl From<CartRow> for LineItem {
    fn from(row: CartRow) -> Self {
        Self {
            product_id: row.product_id,
            remote_row_id: Some(row.id),
            name: row.name,
            unit_price: row.unit_price,
            image_url: row.image_url,
            quantity: u32::try_from(row.quantity).unwrap_or(1).max(1),
            size: row.size,
            dirty: false,
        }
    }
}

/// Both derived aggregates in one read: `count = Σ quantity` and
/// `total = Σ unit_price × quantity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartSummary {
    pub count: u32,
    pub total: Price,
}
