//! Response envelopes for the back-office routes.

use fernhouse_core::{Banner, CatalogItem, Category, Order, User};
use serde::Deserialize;
use serde_json::Value;

/// A page of plants or pots.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemListResponse {
    #[serde(alias = "products", alias = "pots", default)]
    pub items: Vec<CatalogItem>,
}

/// A single plant or pot.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemResponse {
    #[serde(alias = "product", alias = "pot")]
    pub item: Option<CatalogItem>,
}

/// A collection size.
#[derive(Debug, Clone, Deserialize)]
pub struct CountResponse {
    #[serde(default)]
    pub total: u64,
}

/// All categories.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryListResponse {
    #[serde(alias = "categories", default)]
    pub category: Vec<Category>,
}

/// A created or renamed category.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryResponse {
    #[serde(default)]
    pub category: Option<Category>,
}

/// A page of users.
#[derive(Debug, Clone, Deserialize)]
pub struct UserListResponse {
    #[serde(default)]
    pub users: Vec<User>,
}

/// The banner(s).
#[derive(Debug, Clone, Deserialize)]
pub struct BannerListResponse {
    #[serde(alias = "banner", default)]
    pub banners: Vec<Banner>,
}

/// A page of orders.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderListResponse {
    #[serde(default)]
    pub orders: Vec<Order>,
}

/// Successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub user: Value,
    pub token: String,
}

/// Result of the admin-role check.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AdminCheckResponse {
    #[serde(default)]
    pub ok: bool,
}

/// A bare `{message}` acknowledgement.
#[derive(Debug, Clone, Deserialize)]
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
    fn test_pot_list_alias() {
        let response: ItemListResponse = serde_json::from_value(json!({
            "success": true,
            "pots": [{"_id": "t1", "name": "Terracotta", "price": 12}]
        }))
        .unwrap();
        assert_eq!(response.items.len(), 1);
    }

    #[test]
    fn test_admin_check_defaults_to_denied() {
        let response: AdminCheckResponse = serde_json::from_value(json!({})).unwrap();
        assert!(!response.ok);
    }
}
