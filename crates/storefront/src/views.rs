//! Display data for templates.
//!
//! Templates never see backend records directly; handlers convert them into
//! these flat, pre-formatted views.

use fernhouse_core::{
    CartItem, CatalogItem, CatalogKind, Category, Notice, Order, OrderTotals, ReturnStatus,
};

use crate::persistence::{ClientStorage, take_notice};
use crate::stores::{AuthStore, CartStore};

/// Header and notice data shared by every page.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub user_name: Option<String>,
    pub signed_in: bool,
    pub cart_count: u32,
    pub notice: Option<Notice>,
}

impl Layout {
    /// Build the layout for this request, consuming any queued notice.
    pub async fn load<S: ClientStorage>(cart: &CartStore<S>, auth: &AuthStore<S>) -> Self {
        let session = auth.session();
        Self {
            user_name: session.user_name().map(str::to_string),
            signed_in: session.is_authenticated(),
            cart_count: cart.item_count(),
            notice: take_notice(cart.storage()).await,
        }
    }
}

/// A catalog item card.
#[derive(Debug, Clone)]
pub struct ItemCard {
    pub name: String,
    pub code: String,
    pub href: String,
    pub price: String,
    pub image: Option<String>,
    pub in_stock: bool,
}

impl ItemCard {
    #[must_use]
    pub fn new(item: &CatalogItem, kind: CatalogKind) -> Self {
        Self {
            name: item.name.clone(),
            code: item.code.clone(),
            href: format!("/{}/{}", kind.route_segment(), item.slug),
            price: item.price.display(),
            image: item.image.clone(),
            in_stock: item.in_stock(),
        }
    }

    #[must_use]
    pub fn many(items: &[CatalogItem], kind: CatalogKind) -> Vec<Self> {
        items.iter().map(|item| Self::new(item, kind)).collect()
    }
}

/// Full catalog item page data.
#[derive(Debug, Clone)]
pub struct ItemDetail {
    pub kind: &'static str,
    pub slug: String,
    pub name: String,
    pub code: String,
    pub description: String,
    pub price: String,
    pub image: Option<String>,
    pub sizes: Vec<String>,
    pub stock: u32,
    pub category: Option<String>,
}

impl ItemDetail {
    #[must_use]
    pub fn new(item: &CatalogItem, kind: CatalogKind) -> Self {
        Self {
            kind: kind.backend_segment(),
            slug: item.slug.clone(),
            name: item.name.clone(),
            code: item.code.clone(),
            description: item.description.clone(),
            price: item.price.display(),
            image: item.image.clone(),
            sizes: item.sizes.clone(),
            stock: item.stock,
            category: item
                .category
                .as_ref()
                .and_then(|category| category.name())
                .map(str::to_string),
        }
    }
}

/// Sidebar category link.
#[derive(Debug, Clone)]
pub struct CategoryLink {
    pub name: String,
    pub href: String,
}

impl From<&Category> for CategoryLink {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            href: format!("/categories/{}", category.slug),
        }
    }
}

/// One cart line.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub id: String,
    pub size: String,
    pub name: String,
    pub code: String,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
    pub image: Option<String>,
}

impl From<&CartItem> for CartLineView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id.to_string(),
            size: item.size.clone(),
            name: item.name.clone(),
            code: item.code.clone(),
            quantity: item.quantity,
            price: item.price.display(),
            line_total: item.line_total().display(),
            image: item.image.clone(),
        }
    }
}

/// The cart page.
#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    pub shipping_fee: String,
    pub total: String,
    pub free_shipping: bool,
    pub remaining_for_free_shipping: String,
}

impl CartView {
    #[must_use]
    pub fn new(items: &[CartItem], totals: &OrderTotals) -> Self {
        Self {
            lines: items.iter().map(CartLineView::from).collect(),
            subtotal: totals.subtotal.display(),
            shipping_fee: totals.shipping_fee.display(),
            total: totals.total.display(),
            free_shipping: totals.has_free_shipping(),
            remaining_for_free_shipping: totals.remaining_for_free_shipping().display(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// An order in the customer's history.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: String,
    pub placed_on: String,
    pub status: String,
    pub payment_method: String,
    pub total: String,
    pub units: u32,
    pub return_status: Option<&'static str>,
    pub can_request_return: bool,
    pub lines: Vec<CartLineView>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            placed_on: order
                .created_at
                .map(|at| at.format("%b %-d, %Y").to_string())
                .unwrap_or_default(),
            status: order.status.label().to_string(),
            payment_method: match order.payment_method {
                fernhouse_core::PaymentMethod::Card => "Card".to_string(),
                fernhouse_core::PaymentMethod::CashOnDelivery => "Cash on delivery".to_string(),
            },
            total: order.total.display(),
            units: order.unit_count(),
            return_status: match order.return_status {
                ReturnStatus::None => None,
                ReturnStatus::Requested => Some("Return requested"),
                ReturnStatus::Approved => Some("Return approved"),
                ReturnStatus::Rejected => Some("Return declined"),
            },
            can_request_return: order.can_request_return(),
            lines: order.products.iter().map(CartLineView::from).collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fernhouse_core::{Price, ProductId};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_cart_view_formats_totals() {
        let items = vec![CartItem {
            id: ProductId::new("p1"),
            code: "FIG".to_string(),
            name: "Fiddle Leaf Fig".to_string(),
            price: Price::from_cents(4999),
            size: "L".to_string(),
            quantity: 2,
            image: None,
            kind: CatalogKind::Product,
        }];
        let view = CartView::new(&items, &OrderTotals::for_items(&items));

        assert_eq!(view.subtotal, "$99.98");
        assert_eq!(view.shipping_fee, "$13.00");
        assert_eq!(view.total, "$112.98");
        assert_eq!(view.remaining_for_free_shipping, "$0.02");
        assert!(!view.free_shipping);
        assert_eq!(view.lines.first().unwrap().line_total, "$99.98");
    }

    #[test]
    fn test_item_card_links_by_kind() {
        let item: CatalogItem = serde_json::from_value(json!({
            "_id": "t1", "name": "Glazed Pot", "slug": "glazed-pot", "price": 18, "quantity": 3
        }))
        .unwrap();

        let card = ItemCard::new(&item, CatalogKind::Pot);
        assert_eq!(card.href, "/pots/glazed-pot");
        assert_eq!(card.price, "$18.00");
        assert!(card.in_stock);
    }
}
