//! Visitor-scoped persisted state.
//!
//! Each visitor's cart, login and pending-checkout bookkeeping live in their
//! session record under fixed keys:
//!
//! | key        | value                                   |
//! |------------|-----------------------------------------|
//! | `cart`     | JSON array of cart lines                |
//! | `user`     | `{user, token}`                         |
//! | `flash`    | one-shot notice                         |
//! | `checkout` | idempotency keys and completed sessions |
//!
//! Storage goes through [`ClientStorage`] so stores and the checkout flow
//! can run against [`MemoryStorage`] in tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use fernhouse_core::{AuthSession, Cart, IdempotencyKey, Notice};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tower_sessions::Session;
use tracing::{debug, warn};

/// Session keys for persisted visitor state.
pub mod keys {
    /// Cart lines.
    pub const CART: &str = "cart";

    /// Authenticated `{user, token}`.
    pub const USER: &str = "user";

    /// Notice to show on the next rendered page.
    pub const FLASH: &str = "flash";

    /// Checkout idempotency bookkeeping.
    pub const CHECKOUT: &str = "checkout";
}

/// Errors reading or writing persisted state.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The session store failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// A value could not be encoded.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Key/value storage scoped to one visitor.
pub trait ClientStorage: Clone + Send + Sync + 'static {
    /// Read the raw value under `key`.
    fn load(&self, key: &str) -> impl Future<Output = Result<Option<Value>, StorageError>> + Send;

    /// Write `value` under `key`, replacing any previous value.
    fn store(&self, key: &str, value: Value)
    -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Delete `key`.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// [`ClientStorage`] over the visitor's `tower-sessions` record.
#[derive(Clone, Debug)]
pub struct SessionStorage(Session);

impl SessionStorage {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self(session)
    }
}

impl ClientStorage for SessionStorage {
    async fn load(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.0.get_value(key).await?)
    }

    async fn store(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.0.insert_value(key, value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.0.remove_value(key).await?;
        Ok(())
    }
}

/// In-process [`ClientStorage`]; clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    values: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current raw value under `key`.
    pub async fn snapshot(&self, key: &str) -> Option<Value> {
        self.values.lock().await.get(key).cloned()
    }
}

impl ClientStorage for MemoryStorage {
    async fn load(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn store(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.values.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.lock().await.remove(key);
        Ok(())
    }
}

/// Read and decode `key`, falling back to `T::default()` when the value is
/// missing, unreadable or malformed.
async fn load_or_default<S, T>(storage: &S, key: &str) -> T
where
    S: ClientStorage,
    T: for<'de> Deserialize<'de> + Default,
{
    match storage.load(key).await {
        Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
            warn!(key, error = %e, "Discarding malformed persisted value");
            T::default()
        }),
        Ok(None) => T::default(),
        Err(e) => {
            warn!(key, error = %e, "Failed to read persisted value");
            T::default()
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// What the cart persistence step does when the cart has become empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyCartWrite {
    /// Write the empty list.
    #[default]
    Persist,
    /// Leave whatever was persisted before untouched.
    Skip,
}

/// The explicit persistence step run after every cart transition.
#[derive(Debug, Clone, Copy, Default)]
pub struct CartPersistence {
    empty_write: EmptyCartWrite,
}

impl CartPersistence {
    #[must_use]
    pub const fn new(empty_write: EmptyCartWrite) -> Self {
        Self { empty_write }
    }

    #[must_use]
    pub const fn empty_write(&self) -> EmptyCartWrite {
        self.empty_write
    }

    /// Load the persisted cart. Missing or malformed data yields an empty
    /// cart.
    pub async fn hydrate<S: ClientStorage>(&self, storage: &S) -> Cart {
        load_or_default(storage, keys::CART).await
    }

    /// Mirror `cart` to storage. Returns whether anything was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn persist<S: ClientStorage>(
        &self,
        storage: &S,
        cart: &Cart,
    ) -> Result<bool, StorageError> {
        if cart.is_empty() && self.empty_write == EmptyCartWrite::Skip {
            debug!("Cart is empty, leaving persisted copy untouched");
            return Ok(false);
        }

        storage.store(keys::CART, serde_json::to_value(cart)?).await?;
        Ok(true)
    }
}

// =============================================================================
// Auth
// =============================================================================

/// Read the persisted `{user, token}`; absent or malformed means signed out.
pub async fn load_auth<S: ClientStorage>(storage: &S) -> AuthSession {
    load_or_default(storage, keys::USER).await
}

/// Persist a login.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_auth<S: ClientStorage>(
    storage: &S,
    session: &AuthSession,
) -> Result<(), StorageError> {
    storage
        .store(keys::USER, serde_json::to_value(session)?)
        .await
}

/// Forget the persisted login.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn forget_auth<S: ClientStorage>(storage: &S) -> Result<(), StorageError> {
    storage.remove(keys::USER).await
}

// =============================================================================
// Flash notices
// =============================================================================

/// Queue a notice for the next rendered page. A newer notice replaces an
/// unshown one.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn push_notice<S: ClientStorage>(
    storage: &S,
    notice: &Notice,
) -> Result<(), StorageError> {
    storage
        .store(keys::FLASH, serde_json::to_value(notice)?)
        .await
}

/// Take the queued notice, if any.
pub async fn take_notice<S: ClientStorage>(storage: &S) -> Option<Notice> {
    let notice: Option<Notice> = load_or_default(storage, keys::FLASH).await;
    if notice.is_some()
        && let Err(e) = storage.remove(keys::FLASH).await
    {
        warn!(error = %e, "Failed to clear shown notice");
    }
    notice
}

// =============================================================================
// Checkout ledger
// =============================================================================

/// How many completed checkout references are remembered per visitor.
const COMPLETED_HISTORY: usize = 20;

/// How many unfinished checkout references keep their key per visitor.
const PENDING_LIMIT: usize = 20;

/// Per-visitor checkout bookkeeping.
///
/// Maps a checkout reference (payment session id, or a form token for
/// cash-on-delivery) to the idempotency key used for its order, and
/// remembers which references already produced an order. Both lists are
/// oldest first and capped; the oldest entries are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutLedger {
    #[serde(default)]
    pending: Vec<(String, IdempotencyKey)>,
    #[serde(default)]
    completed: Vec<String>,
}

impl CheckoutLedger {
    /// Load the ledger; malformed data starts a fresh one.
    pub async fn load<S: ClientStorage>(storage: &S) -> Self {
        load_or_default(storage, keys::CHECKOUT).await
    }

    /// Write the ledger back.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn save<S: ClientStorage>(&self, storage: &S) -> Result<(), StorageError> {
        storage
            .store(keys::CHECKOUT, serde_json::to_value(self)?)
            .await
    }

    /// The key for `reference`, generated on first use.
    pub fn key_for(&mut self, reference: &str) -> IdempotencyKey {
        if let Some((_, key)) = self.pending.iter().find(|(pending, _)| pending == reference) {
            return key.clone();
        }

        let key = IdempotencyKey::generate();
        self.pending.push((reference.to_string(), key.clone()));
        if self.pending.len() > PENDING_LIMIT {
            let excess = self.pending.len() - PENDING_LIMIT;
            self.pending.drain(..excess);
        }
        key
    }

    /// Whether `reference` already produced an order.
    #[must_use]
    pub fn is_completed(&self, reference: &str) -> bool {
        self.completed.iter().any(|done| done == reference)
    }

    /// Record that `reference` produced an order.
    pub fn mark_completed(&mut self, reference: &str) {
        self.pending.retain(|(pending, _)| pending != reference);
        if !self.is_completed(reference) {
            self.completed.push(reference.to_string());
        }
        if self.completed.len() > COMPLETED_HISTORY {
            let excess = self.completed.len() - COMPLETED_HISTORY;
            self.completed.drain(..excess);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fernhouse_core::{CartItem, CatalogKind, Price, ProductId};
    use serde_json::json;

    use super::*;

    fn line(id: &str) -> CartItem {
        CartItem {
            id: ProductId::new(id),
            code: id.to_uppercase(),
            name: format!("Plant {id}"),
            price: Price::from_dollars(20),
            size: "M".to_string(),
            quantity: 1,
            image: None,
            kind: CatalogKind::Product,
        }
    }

    fn cart_with(ids: &[&str]) -> Cart {
        Cart::from_items(ids.iter().map(|id| line(id)).collect())
    }

    #[tokio::test]
    async fn test_persist_writes_json_array() {
        let storage = MemoryStorage::new();
        let persistence = CartPersistence::default();

        assert!(persistence.persist(&storage, &cart_with(&["p1"])).await.unwrap());

        let stored = storage.snapshot(keys::CART).await.unwrap();
        assert!(stored.is_array());
        assert_eq!(persistence.hydrate(&storage).await, cart_with(&["p1"]));
    }

    #[tokio::test]
    async fn test_empty_cart_is_written_by_default() {
        let storage = MemoryStorage::new();
        let persistence = CartPersistence::new(EmptyCartWrite::Persist);

        persistence.persist(&storage, &cart_with(&["p1"])).await.unwrap();
        assert!(persistence.persist(&storage, &Cart::new()).await.unwrap());

        assert_eq!(storage.snapshot(keys::CART).await, Some(json!([])));
        assert!(persistence.hydrate(&storage).await.is_empty());
    }

    #[tokio::test]
    async fn test_skip_policy_leaves_previous_copy() {
        let storage = MemoryStorage::new();
        let persistence = CartPersistence::new(EmptyCartWrite::Skip);

        persistence.persist(&storage, &cart_with(&["p1"])).await.unwrap();
        assert!(!persistence.persist(&storage, &Cart::new()).await.unwrap());

        assert_eq!(persistence.hydrate(&storage).await, cart_with(&["p1"]));
    }

    #[tokio::test]
    async fn test_malformed_cart_hydrates_empty() {
        let storage = MemoryStorage::new();
        storage
            .store(keys::CART, json!({"not": "a list"}))
            .await
            .unwrap();

        assert!(CartPersistence::default().hydrate(&storage).await.is_empty());
    }

    #[tokio::test]
    async fn test_auth_hydration() {
        let storage = MemoryStorage::new();
        assert_eq!(load_auth(&storage).await, AuthSession::default());

        let stored = json!({"user": {"_id": "u1"}, "token": "t"});
        storage.store(keys::USER, stored.clone()).await.unwrap();
        let session = load_auth(&storage).await;
        assert_eq!(serde_json::to_value(&session).unwrap(), stored);

        storage.store(keys::USER, json!("garbage")).await.unwrap();
        assert_eq!(load_auth(&storage).await, AuthSession::default());

        forget_auth(&storage).await.unwrap();
        assert!(storage.snapshot(keys::USER).await.is_none());
    }

    #[tokio::test]
    async fn test_notice_is_shown_once() {
        let storage = MemoryStorage::new();
        push_notice(&storage, &Notice::success("Added")).await.unwrap();

        assert_eq!(take_notice(&storage).await, Some(Notice::success("Added")));
        assert_eq!(take_notice(&storage).await, None);
    }

    #[tokio::test]
    async fn test_ledger_key_is_stable_until_completed() {
        let storage = MemoryStorage::new();

        let mut ledger = CheckoutLedger::load(&storage).await;
        let first = ledger.key_for("cs_1");
        ledger.save(&storage).await.unwrap();

        let mut reloaded = CheckoutLedger::load(&storage).await;
        assert_eq!(reloaded.key_for("cs_1"), first);
        assert_ne!(reloaded.key_for("cs_2"), first);

        reloaded.mark_completed("cs_1");
        assert!(reloaded.is_completed("cs_1"));
        assert!(!reloaded.is_completed("cs_2"));
    }

    #[test]
    fn test_ledger_history_is_bounded() {
        let mut ledger = CheckoutLedger::default();
        for i in 0..(COMPLETED_HISTORY + 5) {
            ledger.mark_completed(&format!("cs_{i}"));
        }
        assert!(!ledger.is_completed("cs_0"));
        assert!(ledger.is_completed(&format!("cs_{}", COMPLETED_HISTORY + 4)));
    }

    #[test]
    fn test_unfinished_references_are_bounded() {
        let mut ledger = CheckoutLedger::default();
        let first = ledger.key_for("cod:0");
        assert_eq!(ledger.key_for("cod:0"), first);

        for i in 1..=PENDING_LIMIT {
            ledger.key_for(&format!("cod:{i}"));
        }
        assert_eq!(ledger.pending.len(), PENDING_LIMIT);

        // The oldest reference was dropped and gets a fresh key
        let latest = format!("cod:{PENDING_LIMIT}");
        let latest_key = ledger.key_for(&latest);
        assert_eq!(ledger.key_for(&latest), latest_key);
        assert_ne!(ledger.key_for("cod:0"), first);
    }
}
