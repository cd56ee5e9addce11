//! Cart line items and the pure transitions applied to them.
//!
//! Nothing here touches storage. The storefront's cart store applies one of
//! these transitions and then runs its persistence step, so the list logic
//! can be tested without a session.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::records::{CatalogItem, CatalogKind};
use crate::totals::OrderTotals;
use crate::types::{Price, ProductId};

/// Errors from cart transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Quantities below one are not representable in the cart.
    #[error("quantity must be at least 1 (got {0})")]
    InvalidQuantity(u32),

    /// No line matches the given `(id, size)` key.
    #[error("no cart line for product {id} in size {size:?}")]
    LineNotFound { id: ProductId, size: String },
}

/// One line of the cart. `(id, size)` is the uniqueness key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    #[serde(default)]
    pub code: String,
    pub name: String,
    /// Unit price at the time the item was added.
    pub price: Price,
    #[serde(default)]
    pub size: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub kind: CatalogKind,
}

impl CartItem {
    /// Build a line from a catalog record.
    #[must_use]
    pub fn from_catalog(item: &CatalogItem, kind: CatalogKind, size: &str, quantity: u32) -> Self {
        Self {
            id: item.id.clone(),
            code: item.code.clone(),
            name: item.name.clone(),
            price: item.price,
            size: size.to_owned(),
            quantity,
            image: item.image.clone(),
            kind,
        }
    }

    /// Whether this line has the given key.
    #[must_use]
    pub fn has_key(&self, id: &ProductId, size: &str) -> bool {
        &self.id == id && self.size == size
    }

    /// `quantity × price`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price * self.quantity
    }
}

/// The ordered list of cart lines.
///
/// Invariants: every quantity is at least one and no two lines share an
/// `(id, size)` key. Serializes as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from an arbitrary list, restoring the invariants.
    ///
    /// Duplicate keys are merged in first-seen order and zero quantities are
    /// dropped. Used when hydrating a persisted list that may have been
    /// written by an older build.
    #[must_use]
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut cart = Self::new();
        for item in items.into_iter().filter(|item| item.quantity > 0) {
            cart.add(item);
        }
        cart
    }

    /// Add an item, merging into an existing line with the same key.
    ///
    /// A zero quantity is treated as one.
    pub fn add(&mut self, mut item: CartItem) {
        item.quantity = item.quantity.max(1);

        if let Some(line) = self
            .items
            .iter_mut()
            .find(|line| line.has_key(&item.id, &item.size))
        {
            line.quantity = line.quantity.saturating_add(item.quantity);
        } else {
            self.items.push(item);
        }
    }

    /// Remove the line with the given key. Returns whether a line was removed.
    ///
    /// Removing a missing key leaves the cart unchanged.
    pub fn remove(&mut self, id: &ProductId, size: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|line| !line.has_key(id, size));
        self.items.len() != before
    }

    /// Replace the quantity of the line with the given key.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for zero and
    /// [`CartError::LineNotFound`] when no line matches.
    pub fn change_quantity(
        &mut self,
        id: &ProductId,
        size: &str,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        let line = self
            .items
            .iter_mut()
            .find(|line| line.has_key(id, size))
            .ok_or_else(|| CartError::LineNotFound {
                id: id.clone(),
                size: size.to_owned(),
            })?;
        line.quantity = quantity;
        Ok(())
    }

    /// Replace the whole list.
    pub fn replace(&mut self, items: Vec<CartItem>) {
        *self = Self::from_items(items);
    }

    /// The lines, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Subtotal, shipping and total for the current lines.
    #[must_use]
    pub fn totals(&self) -> OrderTotals {
        OrderTotals::for_items(&self.items)
    }

    /// Consume the cart and return its lines.
    #[must_use]
    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }
}

impl From<Vec<CartItem>> for Cart {
    fn from(items: Vec<CartItem>) -> Self {
        Self::from_items(items)
    }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}
