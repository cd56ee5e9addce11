//! Response envelopes returned by the backend.
//!
//! The backend wraps every payload in an object with a `success` flag; the
//! list and detail keys differ between plants and pots, hence the aliases.

use fernhouse_core::{Banner, CatalogItem, Category, Order, PaymentStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A page of plants or pots.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemListResponse {
    #[serde(alias = "products", alias = "pots", default)]
    pub items: Vec<CatalogItem>,
}

/// A collection size.
#[derive(Debug, Clone, Deserialize)]
pub struct CountResponse {
    #[serde(default)]
    pub total: u64,
}

/// A single plant or pot.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemResponse {
    #[serde(alias = "product", alias = "pot")]
    pub item: CatalogItem,
}

/// All categories.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryListResponse {
    #[serde(alias = "categories", default)]
    pub category: Vec<Category>,
}

/// Plants in a category, plus the category itself.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryItemsResponse {
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(alias = "products", default)]
    pub items: Vec<CatalogItem>,
}

/// Home page banners.
#[derive(Debug, Clone, Deserialize)]
pub struct BannerListResponse {
    #[serde(alias = "banner", default)]
    pub banners: Vec<Banner>,
}

/// Successful login: the opaque user record and its token.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub user: Value,
    pub token: String,
}

/// A customer's orders.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderListResponse {
    #[serde(default)]
    pub orders: Vec<Order>,
}

/// A created or updated order.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderResponse {
    #[serde(default)]
    pub order: Option<Order>,
}

/// A hosted checkout session to redirect the customer to.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionResponse {
    pub url: String,
    #[serde(default)]
    pub id: Option<String>,
}

/// Payment state of a hosted checkout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PaymentSessionStatus {
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub status: Option<SessionState>,
}

/// Lifecycle of the provider's checkout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Open,
    Complete,
    Expired,
    #[serde(other)]
    Unknown,
}

impl PaymentSessionStatus {
    /// Paid, or the provider marked the session complete.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.payment_status.is_settled() || self.status == Some(SessionState::Complete)
    }
}

/// Plain `{success, message}` acknowledgement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_item_list_accepts_both_keys() {
        let plants: ItemListResponse = serde_json::from_value(json!({
            "success": true,
            "products": [{"_id": "p1", "name": "Fern", "price": 12}]
        }))
        .unwrap();
        let pots: ItemListResponse = serde_json::from_value(json!({
            "success": true,
            "pots": [{"_id": "t1", "name": "Terracotta", "price": 8}]
        }))
        .unwrap();

        assert_eq!(plants.items.len(), 1);
        assert_eq!(pots.items.first().unwrap().name, "Terracotta");
    }

    #[test]
    fn test_session_status_settled() {
        let paid: PaymentSessionStatus =
            serde_json::from_value(json!({"payment_status": "paid"})).unwrap();
        let complete: PaymentSessionStatus = serde_json::from_value(
            json!({"payment_status": "something_new", "status": "complete"}),
        )
        .unwrap();
        let unpaid: PaymentSessionStatus =
            serde_json::from_value(json!({"payment_status": "unpaid", "status": "open"})).unwrap();

        assert!(paid.is_settled());
        assert!(complete.is_settled());
        assert!(!unpaid.is_settled());
    }
}
