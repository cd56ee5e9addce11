//! Cart store: the visitor's cart lines plus their persistence step.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use fernhouse_core::{Cart, CartItem, OrderTotals, ProductId};
use tracing::instrument;

use super::{StoreError, session_storage};
use crate::error::AppError;
use crate::persistence::{CartPersistence, ClientStorage, SessionStorage};
use crate::state::AppState;

/// The cart for one request.
///
/// Every mutation applies a pure [`Cart`] transition and then persists the
/// result, so the session record always mirrors the last successful change.
#[derive(Debug, Clone)]
pub struct CartStore<S = SessionStorage> {
    storage: S,
    persistence: CartPersistence,
    cart: Cart,
}

impl<S: ClientStorage> CartStore<S> {
    /// Hydrate the cart from `storage`.
    pub async fn load(storage: S, persistence: CartPersistence) -> Self {
        let cart = persistence.hydrate(&storage).await;
        Self {
            storage,
            persistence,
            cart,
        }
    }

    /// Add a line, merging with an existing `(id, size)` line.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    #[instrument(skip(self, item), fields(id = %item.id, size = %item.size, quantity = item.quantity))]
    pub async fn add_to_cart(&mut self, item: CartItem) -> Result<(), StoreError> {
        self.cart.add(item);
        self.persist().await
    }

    /// Remove the `(id, size)` line. Removing a missing line is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    #[instrument(skip(self))]
    pub async fn remove_item(&mut self, id: &ProductId, size: &str) -> Result<bool, StoreError> {
        let removed = self.cart.remove(id, size);
        self.persist().await?;
        Ok(removed)
    }

    /// Set the quantity of the `(id, size)` line.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Cart`] for a zero quantity or an unknown line,
    /// in which case nothing is persisted.
    #[instrument(skip(self))]
    pub async fn change_quantity(
        &mut self,
        id: &ProductId,
        size: &str,
        quantity: u32,
    ) -> Result<(), StoreError> {
        self.cart.change_quantity(id, size, quantity)?;
        self.persist().await
    }

    /// Replace every line; `set_cart(Vec::new())` clears the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    #[instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn set_cart(&mut self, items: Vec<CartItem>) -> Result<(), StoreError> {
        self.cart.replace(items);
        self.persist().await
    }

    async fn persist(&self) -> Result<(), StoreError> {
        self.persistence.persist(&self.storage, &self.cart).await?;
        Ok(())
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        self.cart.items()
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.cart.item_count()
    }

    #[must_use]
    pub fn totals(&self) -> OrderTotals {
        self.cart.totals()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    /// The storage this store writes to.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }
}

impl FromRequestParts<AppState> for CartStore<SessionStorage> {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let storage = session_storage(parts, "CartStore")?;
        Ok(Self::load(storage, CartPersistence::new(state.config().cart_empty_write)).await)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use fernhouse_core::{CartError, CatalogKind, Price};
    use serde_json::json;

    use super::*;
    use crate::persistence::{EmptyCartWrite, MemoryStorage, keys};

    fn line(id: &str, size: &str, quantity: u32) -> CartItem {
        CartItem {
            id: ProductId::new(id),
            code: id.to_uppercase(),
            name: format!("Plant {id}"),
            price: Price::from_dollars(30),
            size: size.to_string(),
            quantity,
            image: None,
            kind: CatalogKind::Product,
        }
    }

    async fn store(policy: EmptyCartWrite) -> (MemoryStorage, CartStore<MemoryStorage>) {
        let storage = MemoryStorage::new();
        let store = CartStore::load(storage.clone(), CartPersistence::new(policy)).await;
        (storage, store)
    }

    #[tokio::test]
    async fn test_every_mutation_is_persisted() {
        let (storage, mut cart) = store(EmptyCartWrite::Persist).await;

        cart.add_to_cart(line("p1", "M", 2)).await.unwrap();
        cart.add_to_cart(line("p1", "M", 3)).await.unwrap();
        assert_eq!(
            storage.snapshot(keys::CART).await.unwrap()[0]["quantity"],
            json!(5)
        );

        cart.change_quantity(&ProductId::new("p1"), "M", 1)
            .await
            .unwrap();
        assert_eq!(
            storage.snapshot(keys::CART).await.unwrap()[0]["quantity"],
            json!(1)
        );

        let reloaded = CartStore::load(storage.clone(), CartPersistence::default()).await;
        assert_eq!(reloaded.items(), cart.items());
    }

    #[tokio::test]
    async fn test_rejected_quantity_is_not_persisted() {
        let (storage, mut cart) = store(EmptyCartWrite::Persist).await;
        cart.add_to_cart(line("p1", "M", 2)).await.unwrap();

        let err = cart
            .change_quantity(&ProductId::new("p1"), "M", 0)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Cart(CartError::InvalidQuantity(0))));
        assert_eq!(
            storage.snapshot(keys::CART).await.unwrap()[0]["quantity"],
            json!(2)
        );
    }

    #[tokio::test]
    async fn test_remove_twice_is_harmless() {
        let (_, mut cart) = store(EmptyCartWrite::Persist).await;
        cart.add_to_cart(line("p1", "M", 1)).await.unwrap();
        cart.add_to_cart(line("p2", "M", 1)).await.unwrap();

        assert!(cart.remove_item(&ProductId::new("p1"), "M").await.unwrap());
        assert!(!cart.remove_item(&ProductId::new("p1"), "M").await.unwrap());
        assert_eq!(cart.items().len(), 1);
    }

    #[tokio::test]
    async fn test_clearing_with_persist_policy() {
        let (storage, mut cart) = store(EmptyCartWrite::Persist).await;
        cart.add_to_cart(line("p1", "M", 1)).await.unwrap();
        cart.set_cart(Vec::new()).await.unwrap();

        assert!(cart.is_empty());
        assert_eq!(storage.snapshot(keys::CART).await, Some(json!([])));
    }

    #[tokio::test]
    async fn test_clearing_with_skip_policy_keeps_stale_copy() {
        let (storage, mut cart) = store(EmptyCartWrite::Skip).await;
        cart.add_to_cart(line("p1", "M", 1)).await.unwrap();
        cart.set_cart(Vec::new()).await.unwrap();

        assert!(cart.is_empty());
        let reloaded = CartStore::load(storage, CartPersistence::new(EmptyCartWrite::Skip)).await;
        assert_eq!(reloaded.items().len(), 1);
    }

    #[tokio::test]
    async fn test_totals_follow_items() {
        let (_, mut cart) = store(EmptyCartWrite::Persist).await;
        cart.add_to_cart(line("p1", "M", 2)).await.unwrap();

        let totals = cart.totals();
        assert_eq!(totals.subtotal, Price::from_dollars(60));
        assert_eq!(totals.total, Price::from_dollars(73));
        assert_eq!(cart.item_count(), 2);
    }
}
