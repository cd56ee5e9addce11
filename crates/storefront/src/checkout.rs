//! Payment completion and order placement.
//!
//! A card checkout returns from the provider at
//! `/payment/success/{session_id}` and runs one status check, then one order
//! request. A cash-on-delivery checkout goes straight to the order request.
//! There is no retry: a failure at either step sends the customer back to
//! the cart with an error notice.
//!
//! Each checkout reference gets one idempotency key, remembered in the
//! visitor's [`CheckoutLedger`] so a reload resends the same key. A
//! reference that already produced an order is not run again.

use std::future::Future;

use fernhouse_core::{
    AuthSession, CheckoutEvent, CheckoutPhase, FailureStage, IdempotencyKey, Notice, Order,
    PaymentMethod,
};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::types::PaymentSessionStatus;
use crate::api::{ApiError, BackendClient, NewOrder};
use crate::persistence::{CheckoutLedger, ClientStorage};
use crate::stores::{CartStore, StoreError};

/// Where a finished checkout sends the customer.
pub const CONFIRMATION_PATH: &str = "/orders/confirmation";

/// Where a failed checkout sends the customer.
pub const CART_PATH: &str = "/cart";

/// The backend calls a checkout needs.
pub trait CheckoutBackend: Send + Sync {
    fn payment_status(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<PaymentSessionStatus, ApiError>> + Send;

    fn create_order(
        &self,
        token: &str,
        order: &NewOrder,
        key: &IdempotencyKey,
    ) -> impl Future<Output = Result<Option<Order>, ApiError>> + Send;
}

impl CheckoutBackend for BackendClient {
    async fn payment_status(&self, session_id: &str) -> Result<PaymentSessionStatus, ApiError> {
        self.payment_session_status(session_id).await
    }

    async fn create_order(
        &self,
        token: &str,
        order: &NewOrder,
        key: &IdempotencyKey,
    ) -> Result<Option<Order>, ApiError> {
        Self::create_order(self, token, order, key).await
    }
}

/// Errors that abort a checkout before an outcome can be decided.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Transition(#[from] fernhouse_core::checkout::InvalidTransition),
}

impl From<crate::persistence::StorageError> for CheckoutError {
    fn from(err: crate::persistence::StorageError) -> Self {
        Self::Store(StoreError::Storage(err))
    }
}

/// How a checkout ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// The order was created and the cart cleared.
    Completed { order: Option<String> },
    /// This reference already produced an order; nothing was sent.
    AlreadyCompleted,
    /// The checkout stopped at `stage`.
    Failed { stage: FailureStage, reason: String },
}

impl CheckoutOutcome {
    /// Path to redirect to.
    #[must_use]
    pub const fn redirect_target(&self) -> &'static str {
        match self {
            Self::Completed { .. } | Self::AlreadyCompleted => CONFIRMATION_PATH,
            Self::Failed { .. } => CART_PATH,
        }
    }

    /// Notice to show after the redirect.
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::Completed { .. } => Notice::success("Thank you! Your order has been placed."),
            Self::AlreadyCompleted => Notice::info("This order has already been placed."),
            Self::Failed {
                stage: FailureStage::PaymentCheck,
                reason,
            } => Notice::error(format!("We could not confirm your payment: {reason}")),
            Self::Failed {
                stage: FailureStage::OrderCreation,
                reason,
            } => Notice::error(format!("We could not place your order: {reason}")),
        }
    }
}

/// Finish a card checkout the provider sent back with `session_id`.
///
/// # Errors
///
/// Returns an error only when persisted state cannot be written; backend
/// failures end in [`CheckoutOutcome::Failed`].
#[instrument(skip(backend, cart, auth))]
pub async fn complete_card_payment<B, S>(
    backend: &B,
    cart: &mut CartStore<S>,
    auth: &AuthSession,
    session_id: &str,
) -> Result<CheckoutOutcome, CheckoutError>
where
    B: CheckoutBackend,
    S: ClientStorage,
{
    let mut ledger = CheckoutLedger::load(cart.storage()).await;
    if ledger.is_completed(session_id) {
        info!("Payment session already completed, skipping");
        return Ok(CheckoutOutcome::AlreadyCompleted);
    }

    let phase = CheckoutPhase::start(PaymentMethod::Card);

    let (event, failure) = match backend.payment_status(session_id).await {
        Ok(status) if status.is_settled() => (CheckoutEvent::PaymentSettled, None),
        Ok(status) => {
            warn!(payment_status = ?status.payment_status, "Payment not settled");
            (
                CheckoutEvent::PaymentFailed,
                Some("the payment has not been completed".to_string()),
            )
        }
        Err(e) => {
            warn!(error = %e, "Payment status check failed");
            (CheckoutEvent::PaymentFailed, Some(e.user_message()))
        }
    };
    let phase = phase.advance(event)?;

    if let Some(reason) = failure {
        return Ok(CheckoutOutcome::Failed {
            stage: FailureStage::PaymentCheck,
            reason,
        });
    }

    submit_order(
        backend,
        cart,
        auth,
        &mut ledger,
        session_id,
        PaymentMethod::Card,
        phase,
    )
    .await
}

/// Place a cash-on-delivery order for the current cart.
///
/// `reference` identifies this submission (the checkout form's token), so a
/// double submit reuses the same idempotency key and the second one is
/// skipped once the first succeeded.
///
/// # Errors
///
/// Returns an error only when persisted state cannot be written.
#[instrument(skip(backend, cart, auth))]
pub async fn place_cash_order<B, S>(
    backend: &B,
    cart: &mut CartStore<S>,
    auth: &AuthSession,
    reference: &str,
) -> Result<CheckoutOutcome, CheckoutError>
where
    B: CheckoutBackend,
    S: ClientStorage,
{
    let reference = format!("cod:{reference}");
    let mut ledger = CheckoutLedger::load(cart.storage()).await;
    if ledger.is_completed(&reference) {
        return Ok(CheckoutOutcome::AlreadyCompleted);
    }

    let phase = CheckoutPhase::start(PaymentMethod::CashOnDelivery);
    submit_order(
        backend,
        cart,
        auth,
        &mut ledger,
        &reference,
        PaymentMethod::CashOnDelivery,
        phase,
    )
    .await
}

/// The `CreatingOrder` step shared by both payment methods.
async fn submit_order<B, S>(
    backend: &B,
    cart: &mut CartStore<S>,
    auth: &AuthSession,
    ledger: &mut CheckoutLedger,
    reference: &str,
    payment_method: PaymentMethod,
    phase: CheckoutPhase,
) -> Result<CheckoutOutcome, CheckoutError>
where
    B: CheckoutBackend,
    S: ClientStorage,
{
    let Some(buyer) = auth.user_id().filter(|_| auth.is_authenticated()) else {
        phase.advance(CheckoutEvent::OrderRejected)?;
        return Ok(CheckoutOutcome::Failed {
            stage: FailureStage::OrderCreation,
            reason: "please sign in to place an order".to_string(),
        });
    };

    if cart.is_empty() {
        phase.advance(CheckoutEvent::OrderRejected)?;
        return Ok(CheckoutOutcome::Failed {
            stage: FailureStage::OrderCreation,
            reason: "your cart is empty".to_string(),
        });
    }

    let key = ledger.key_for(reference);
    ledger.save(cart.storage()).await?;

    let order = NewOrder {
        products: cart.items().to_vec(),
        total: cart.totals().total,
        payment_method,
        buyer,
    };

    match backend.create_order(&auth.token, &order, &key).await {
        Ok(created) => {
            let phase = phase.advance(CheckoutEvent::OrderCreated)?;
            cart.set_cart(Vec::new()).await?;
            ledger.mark_completed(reference);
            ledger.save(cart.storage()).await?;

            let order_id = created.map(|order| order.id.to_string());
            info!(?phase, order_id = ?order_id, idempotency_key = %key, "Order created");
            Ok(CheckoutOutcome::Completed { order: order_id })
        }
        Err(e) => {
            let phase = phase.advance(CheckoutEvent::OrderRejected)?;
            warn!(?phase, error = %e, idempotency_key = %key, "Order creation failed");
            Ok(CheckoutOutcome::Failed {
                stage: FailureStage::OrderCreation,
                reason: e.user_message(),
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use fernhouse_core::{CartItem, CatalogKind, PaymentStatus, Price, ProductId};
    use serde_json::json;

    use super::*;
    use crate::persistence::{CartPersistence, MemoryStorage};

    /// Scripted backend that records what it was asked.
    #[derive(Default)]
    struct FakeBackend {
        status: Option<PaymentStatus>,
        reject_order: bool,
        order_keys: Mutex<Vec<String>>,
        order_bodies: Mutex<Vec<NewOrder>>,
    }

    impl FakeBackend {
        fn paying(status: PaymentStatus) -> Self {
            Self {
                status: Some(status),
                ..Self::default()
            }
        }

        fn order_calls(&self) -> usize {
            self.order_keys.lock().unwrap().len()
        }
    }

    impl CheckoutBackend for FakeBackend {
        async fn payment_status(&self, _session_id: &str) -> Result<PaymentSessionStatus, ApiError> {
            self.status
                .map(|payment_status| PaymentSessionStatus {
                    payment_status,
                    status: None,
                })
                .ok_or_else(|| ApiError::NotFound("session".to_string()))
        }

        async fn create_order(
            &self,
            _token: &str,
            order: &NewOrder,
            key: &IdempotencyKey,
        ) -> Result<Option<Order>, ApiError> {
            self.order_keys.lock().unwrap().push(key.to_string());
            self.order_bodies.lock().unwrap().push(order.clone());
            if self.reject_order {
                Err(ApiError::Rejected("Out of stock".to_string()))
            } else {
                Ok(None)
            }
        }
    }

    fn signed_in() -> AuthSession {
        AuthSession::new(json!({"_id": "u1", "name": "Rowan"}), "tok")
    }

    async fn cart_with_plant(storage: &MemoryStorage) -> CartStore<MemoryStorage> {
        let mut cart = CartStore::load(storage.clone(), CartPersistence::default()).await;
        cart.add_to_cart(CartItem {
            id: ProductId::new("p1"),
            code: "MON".to_string(),
            name: "Monstera".to_string(),
            price: Price::from_dollars(45),
            size: "M".to_string(),
            quantity: 2,
            image: None,
            kind: CatalogKind::Product,
        })
        .await
        .unwrap();
        cart
    }

    #[tokio::test]
    async fn test_paid_session_creates_order_and_clears_cart() {
        let storage = MemoryStorage::new();
        let mut cart = cart_with_plant(&storage).await;
        let backend = FakeBackend::paying(PaymentStatus::Paid);

        let outcome = complete_card_payment(&backend, &mut cart, &signed_in(), "cs_1")
            .await
            .unwrap();

        assert_eq!(outcome, CheckoutOutcome::Completed { order: None });
        assert_eq!(outcome.redirect_target(), CONFIRMATION_PATH);
        assert!(cart.is_empty());

        let bodies = backend.order_bodies.lock().unwrap();
        let body = bodies.first().unwrap();
        assert_eq!(body.total, Price::from_dollars(90) + Price::from_dollars(13));
        assert_eq!(body.buyer.as_str(), "u1");
        assert_eq!(body.payment_method, PaymentMethod::Card);
    }

    #[tokio::test]
    async fn test_failed_status_check_never_creates_order() {
        let storage = MemoryStorage::new();
        let mut cart = cart_with_plant(&storage).await;
        let backend = FakeBackend::default();

        let outcome = complete_card_payment(&backend, &mut cart, &signed_in(), "cs_1")
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            CheckoutOutcome::Failed {
                stage: FailureStage::PaymentCheck,
                ..
            }
        ));
        assert_eq!(outcome.redirect_target(), CART_PATH);
        assert_eq!(backend.order_calls(), 0);
        assert!(!cart.is_empty());
    }

    #[tokio::test]
    async fn test_unpaid_status_never_creates_order() {
        let storage = MemoryStorage::new();
        let mut cart = cart_with_plant(&storage).await;
        let backend = FakeBackend::paying(PaymentStatus::Unpaid);

        let outcome = complete_card_payment(&backend, &mut cart, &signed_in(), "cs_1")
            .await
            .unwrap();

        assert_eq!(outcome.redirect_target(), CART_PATH);
        assert_eq!(backend.order_calls(), 0);
    }

    #[tokio::test]
    async fn test_rejected_order_keeps_cart_and_reuses_key_on_reload() {
        let storage = MemoryStorage::new();
        let mut cart = cart_with_plant(&storage).await;
        let backend = FakeBackend {
            reject_order: true,
            ..FakeBackend::paying(PaymentStatus::Paid)
        };

        let first = complete_card_payment(&backend, &mut cart, &signed_in(), "cs_1")
            .await
            .unwrap();
        assert!(matches!(
            first,
            CheckoutOutcome::Failed {
                stage: FailureStage::OrderCreation,
                ..
            }
        ));
        assert!(first.notice().message.contains("Out of stock"));
        assert!(!cart.is_empty());

        // Reload of the same return URL
        let mut cart = CartStore::load(storage.clone(), CartPersistence::default()).await;
        complete_card_payment(&backend, &mut cart, &signed_in(), "cs_1")
            .await
            .unwrap();

        let keys = backend.order_keys.lock().unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys.first(), keys.last());
    }

    #[tokio::test]
    async fn test_completed_session_is_not_run_twice() {
        let storage = MemoryStorage::new();
        let mut cart = cart_with_plant(&storage).await;
        let backend = FakeBackend::paying(PaymentStatus::Paid);

        complete_card_payment(&backend, &mut cart, &signed_in(), "cs_1")
            .await
            .unwrap();
        let again = complete_card_payment(&backend, &mut cart, &signed_in(), "cs_1")
            .await
            .unwrap();

        assert_eq!(again, CheckoutOutcome::AlreadyCompleted);
        assert_eq!(again.redirect_target(), CONFIRMATION_PATH);
        assert_eq!(backend.order_calls(), 1);
    }

    #[tokio::test]
    async fn test_signed_out_checkout_fails_without_request() {
        let storage = MemoryStorage::new();
        let mut cart = cart_with_plant(&storage).await;
        let backend = FakeBackend::paying(PaymentStatus::Paid);

        let outcome =
            complete_card_payment(&backend, &mut cart, &AuthSession::default(), "cs_1")
                .await
                .unwrap();

        assert_eq!(outcome.redirect_target(), CART_PATH);
        assert_eq!(backend.order_calls(), 0);
    }

    #[tokio::test]
    async fn test_cash_order_skips_status_check() {
        let storage = MemoryStorage::new();
        let mut cart = cart_with_plant(&storage).await;
        // No status scripted: a status check would fail the checkout
        let backend = FakeBackend::default();

        let outcome = place_cash_order(&backend, &mut cart, &signed_in(), "form-1")
            .await
            .unwrap();

        assert!(matches!(outcome, CheckoutOutcome::Completed { .. }));
        let bodies = backend.order_bodies.lock().unwrap();
        assert_eq!(
            bodies.first().unwrap().payment_method,
            PaymentMethod::CashOnDelivery
        );
    }

    #[tokio::test]
    async fn test_double_submitted_cash_order_posts_once() {
        let storage = MemoryStorage::new();
        let mut cart = cart_with_plant(&storage).await;
        let backend = FakeBackend::default();

        place_cash_order(&backend, &mut cart, &signed_in(), "form-1")
            .await
            .unwrap();
        let again = place_cash_order(&backend, &mut cart, &signed_in(), "form-1")
            .await
            .unwrap();

        assert_eq!(again, CheckoutOutcome::AlreadyCompleted);
        assert_eq!(backend.order_calls(), 1);
    }

    #[tokio::test]
    async fn test_cash_order_with_empty_cart_posts_nothing() {
        let storage = MemoryStorage::new();
        let mut cart = CartStore::load(storage.clone(), CartPersistence::default()).await;
        let backend = FakeBackend::default();

        let outcome = place_cash_order(&backend, &mut cart, &signed_in(), "form-2")
            .await
            .unwrap();

        assert_eq!(
            outcome,
            CheckoutOutcome::Failed {
                stage: FailureStage::OrderCreation,
                reason: "your cart is empty".to_string(),
            }
        );
        assert_eq!(backend.order_calls(), 0);
    }
}
