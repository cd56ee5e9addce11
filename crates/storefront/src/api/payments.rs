//! Hosted checkout sessions and order creation.

use fernhouse_core::{CartItem, IdempotencyKey, Order, PaymentMethod, Price, UserId};
use serde::Serialize;
use serde_json::json;
use tracing::instrument;

use super::types::{CheckoutSessionResponse, OrderResponse, PaymentSessionStatus};
use super::{ApiError, BackendClient};

/// Header carrying the client-generated idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Body of `POST /order/create-order`.
#[derive(Debug, Clone, Serialize)]
pub struct NewOrder {
    pub products: Vec<CartItem>,
    pub total: Price,
    pub payment_method: PaymentMethod,
    pub buyer: UserId,
}

impl BackendClient {
    /// Start a hosted card checkout for the given lines.
    ///
    /// Returns the provider URL to redirect the customer to.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot create the session.
    #[instrument(skip(self, token, products), fields(lines = products.len()))]
    pub async fn create_checkout_session(
        &self,
        token: &str,
        products: &[CartItem],
        success_url: &str,
        cancel_url: &str,
    ) -> Result<String, ApiError> {
        let request = self
            .post("payment/create-checkout-session")?
            .header("Authorization", token)
            .json(&json!({
                "products": products,
                "success_url": success_url,
                "cancel_url": cancel_url,
            }));
        let response: CheckoutSessionResponse = self.execute(request).await?;
        Ok(response.url)
    }

    /// Payment state of a hosted checkout session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    #[instrument(skip(self))]
    pub async fn payment_session_status(
        &self,
        session_id: &str,
    ) -> Result<PaymentSessionStatus, ApiError> {
        let path = format!("payment/session-status/{}", urlencoding::encode(session_id));
        self.execute(self.get(&path)?).await
    }

    /// Create an order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] when the backend refuses the order.
    #[instrument(skip(self, token, order), fields(idempotency_key = %key))]
    pub async fn create_order(
        &self,
        token: &str,
        order: &NewOrder,
        key: &IdempotencyKey,
    ) -> Result<Option<Order>, ApiError> {
        let request = self
            .post("order/create-order")?
            .header("Authorization", token)
            .header(IDEMPOTENCY_KEY_HEADER, key.as_str())
            .json(order);
        let response: OrderResponse = self.execute(request).await?;
        Ok(response.order)
    }
}
