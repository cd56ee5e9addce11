use fernhouse_core::{Order, OrderId, OrderStatus, ReturnStatus};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use super::types::{MessageResponse, OrderListResponse};
use super::{AdminClient, ApiError};

/// An admin's answer to a return request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnDecision {
    Approve,
    Reject,
}

impl ReturnDecision {
    /// The return status the order ends up in.
    #[must_use]
    pub const fn resulting_status(self) -> ReturnStatus {
        match self {
            Self::Approve => ReturnStatus::Approved,
            Self::Reject => ReturnStatus::Rejected,
        }
    }
}

impl AdminClient {
    /// One page (1-based) of all orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    #[instrument(skip(self, token))]
    pub async fn all_orders(&self, token: &str, page: u32) -> Result<Vec<Order>, ApiError> {
        let request = self.get(token, "auth/all-orders")?.query(&[("page", page)]);
        let response: OrderListResponse = self.execute(request).await?;
        Ok(response.orders)
    }

    /// Move an order to `status`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the change.
    #[instrument(skip(self, token))]
    pub async fn set_order_status(
        &self,
        token: &str,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<(), ApiError> {
        let path = format!("auth/order-status/{}", urlencoding::encode(id.as_str()));
        let request = self.put(token, &path)?.json(&json!({ "status": status }));
        let _: MessageResponse = self.execute(request).await?;
        Ok(())
    }

    /// Approve or reject a return request.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the decision.
    #[instrument(skip(self, token))]
    pub async fn decide_return(
        &self,
        token: &str,
        id: &OrderId,
        decision: ReturnDecision,
    ) -> Result<(), ApiError> {
        let path = format!("order/return-approval/{}", urlencoding::encode(id.as_str()));
        let request = self.put(token, &path)?.json(&json!({
            "returnStatus": decision.resulting_status(),
        }));
        let _: MessageResponse = self.execute(request).await?;
        Ok(())
    }
}
