//! Records fetched from the backend.
//!
//! The frontend never owns these; it renders them and keeps short-lived
//! copies for search. Every optional field defaults so that a backend adding
//! or dropping a column does not break page rendering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::types::{
    BannerId, CategoryId, OrderId, OrderStatus, PaymentMethod, Price, ProductId, ReturnStatus,
    UserId, UserRole,
};

/// Which catalog collection a [`CatalogItem`] came from.
///
/// Plants and pots share one record shape but live behind separate backend
/// routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    #[default]
    Product,
    Pot,
}

impl CatalogKind {
    /// Path segment used by the backend (`/product/...`, `/pot/...`).
    #[must_use]
    pub const fn backend_segment(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Pot => "pot",
        }
    }

    /// Plural path segment used by our own routes.
    #[must_use]
    pub const fn route_segment(self) -> &'static str {
        match self {
            Self::Product => "products",
            Self::Pot => "pots",
        }
    }

    /// Human label for headings.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Product => "Plants",
            Self::Pot => "Pots",
        }
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

/// A category reference: the backend returns either the bare id or the
/// populated document depending on the route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    Populated(Category),
    Id(CategoryId),
}

impl CategoryRef {
    /// The referenced category id, whichever form was sent.
    #[must_use]
    pub const fn id(&self) -> &CategoryId {
        match self {
            Self::Populated(category) => &category.id,
            Self::Id(id) => id,
        }
    }

    /// The category name when the reference was populated.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Populated(category) => Some(&category.name),
            Self::Id(_) => None,
        }
    }
}

/// A plant or pot as listed in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    /// Short merchandising code, e.g. `MON-04`.
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    /// Units in stock.
    #[serde(rename = "quantity", default)]
    pub stock: u32,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub shipping: bool,
}

impl CatalogItem {
    /// Whether at least one unit is available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// First listed size, used when a product has a single implicit size.
    #[must_use]
    pub fn default_size(&self) -> &str {
        self.sizes.first().map_or("", String::as_str)
    }
}

/// Home page banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    #[serde(rename = "_id")]
    pub id: BannerId,
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub subheading: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

/// A registered user as listed in the back-office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub role: UserRole,
}

/// Minimal buyer data embedded in orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerSummary {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// The buyer of an order, populated or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BuyerRef {
    Populated(BuyerSummary),
    Id(UserId),
}

impl BuyerRef {
    /// Display name, falling back to the raw id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::Populated(buyer) if !buyer.name.is_empty() => &buyer.name,
            Self::Populated(buyer) => buyer.id.as_str(),
            Self::Id(id) => id.as_str(),
        }
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    /// Snapshot of the cart at order time.
    #[serde(default)]
    pub products: Vec<CartItem>,
    #[serde(default)]
    pub buyer: Option<BuyerRef>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub total: Price,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub return_status: ReturnStatus,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Total number of units across all lines.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.products.iter().map(|line| line.quantity).sum()
    }

    /// Whether the customer may ask to return this order now.
    #[must_use]
    pub const fn can_request_return(&self) -> bool {
        self.status.allows_return_request() && matches!(self.return_status, ReturnStatus::None)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_catalog_item_tolerates_missing_fields() {
        let item: CatalogItem = serde_json::from_value(json!({
            "_id": "p1",
            "name": "Monstera",
            "price": 35,
            "extra_field": true
        }))
        .unwrap();

        assert_eq!(item.id.as_str(), "p1");
        assert_eq!(item.price, Price::from_dollars(35));
        assert!(item.sizes.is_empty());
        assert!(!item.in_stock());
        assert_eq!(item.default_size(), "");
    }

    #[test]
    fn test_category_ref_accepts_both_shapes() {
        let populated: CategoryRef =
            serde_json::from_value(json!({"_id": "c1", "name": "Indoor", "slug": "indoor"}))
                .unwrap();
        let bare: CategoryRef = serde_json::from_value(json!("c1")).unwrap();

        assert_eq!(populated.id(), bare.id());
        assert_eq!(populated.name(), Some("Indoor"));
        assert_eq!(bare.name(), None);
    }

    #[test]
    fn test_order_decodes_backend_shape() {
        let order: Order = serde_json::from_value(json!({
            "_id": "o1",
            "products": [
                {"id": "p1", "code": "MON", "name": "Monstera", "price": 35, "size": "M", "quantity": 2}
            ],
            "buyer": {"_id": "u1", "name": "Rowan"},
            "status": "Delivered",
            "total": 83,
            "payment_method": "card",
            "createdAt": "2026-03-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(order.unit_count(), 2);
        assert_eq!(order.buyer.as_ref().unwrap().display_name(), "Rowan");
        assert!(order.can_request_return());
        assert!(order.created_at.is_some());
    }

    #[test]
    fn test_kind_segments() {
        assert_eq!(CatalogKind::Pot.backend_segment(), "pot");
        assert_eq!(CatalogKind::Product.route_segment(), "products");
    }
}
