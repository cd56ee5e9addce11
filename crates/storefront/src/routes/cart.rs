//! Cart route handlers.
//!
//! The cart lives in the visitor's session (see [`CartStore`]). Mutations
//! redirect back with a notice; an HTMX add returns just the count badge.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Response},
};
use fernhouse_core::{CartItem, CatalogItem, CatalogKind, Notice, ProductId};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use super::redirect_with_notice;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::state::AppState;
use crate::stores::{AuthStore, CartStore};
use crate::views::{CartView, Layout};

/// Add-to-cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub kind: CatalogKind,
    pub slug: String,
    pub size: Option<String>,
    pub quantity: Option<u32>,
}

/// Quantity change form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub id: String,
    #[serde(default)]
    pub size: String,
    pub quantity: u32,
}

/// Remove line form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub id: String,
    #[serde(default)]
    pub size: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: CartView,
    /// One-time reference for the checkout form.
    pub checkout_token: String,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("HX-Request")
}

/// Pick the size to add, checking it against the item's offered sizes.
fn resolve_size<'a>(item: &'a CatalogItem, requested: Option<&'a str>) -> Option<&'a str> {
    match requested.map(str::trim).filter(|size| !size.is_empty()) {
        Some(size) if item.sizes.is_empty() || item.sizes.iter().any(|s| s == size) => Some(size),
        Some(_) => None,
        None => Some(item.default_size()),
    }
}

/// Display cart page.
#[instrument(skip_all)]
pub async fn show(cart: CartStore, auth: AuthStore) -> impl IntoResponse {
    CartShowTemplate {
        cart: CartView::new(cart.items(), &cart.totals()),
        layout: Layout::load(&cart, &auth).await,
        checkout_token: Uuid::new_v4().to_string(),
    }
}

/// Add an item to the cart.
///
/// The item is re-fetched so the line carries the current price, never a
/// price posted by the browser.
#[instrument(skip(state, cart, headers))]
pub async fn add(
    State(state): State<AppState>,
    mut cart: CartStore,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let item = state.backend().get_item(form.kind, &form.slug).await?;
    let back_to = format!("/{}/{}", form.kind.route_segment(), item.slug);
    let quantity = form.quantity.unwrap_or(1);

    let Some(size) = resolve_size(&item, form.size.as_deref()) else {
        return Err(AppError::BadRequest(format!(
            "{} is not offered in that size",
            item.name
        )));
    };

    if !item.in_stock() || quantity > item.stock {
        let notice = Notice::error(format!("Only {} of {} left in stock", item.stock, item.name));
        return Ok(redirect_with_notice(cart.storage(), notice, &back_to)
            .await?
            .into_response());
    }

    cart.add_to_cart(CartItem::from_catalog(&item, form.kind, size, quantity))
        .await?;
    add_breadcrumb("cart", "Added to cart", Some(&[("slug", item.slug.as_str())]));

    if is_htmx(&headers) {
        return Ok((
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            CartCountTemplate {
                count: cart.item_count(),
            },
        )
            .into_response());
    }

    let notice = Notice::success(format!("{} added to your cart", item.name));
    Ok(redirect_with_notice(cart.storage(), notice, &back_to)
        .await?
        .into_response())
}

/// Change a line's quantity.
#[instrument(skip(cart))]
pub async fn update(
    mut cart: CartStore,
    Form(form): Form<UpdateCartForm>,
) -> Result<impl IntoResponse> {
    let id = ProductId::new(form.id);
    let notice = match cart.change_quantity(&id, &form.size, form.quantity).await {
        Ok(()) => Notice::success("Cart updated"),
        Err(crate::stores::StoreError::Cart(e)) => Notice::error(e.to_string()),
        Err(e) => return Err(e.into()),
    };
    redirect_with_notice(cart.storage(), notice, "/cart").await
}

/// Remove a line.
#[instrument(skip(cart))]
pub async fn remove(
    mut cart: CartStore,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<impl IntoResponse> {
    let id = ProductId::new(form.id);
    let notice = if cart.remove_item(&id, &form.size).await? {
        Notice::info("Item removed from your cart")
    } else {
        Notice::error("That item is no longer in your cart")
    };
    redirect_with_notice(cart.storage(), notice, "/cart").await
}

/// Cart count badge (HTMX).
pub async fn count(cart: CartStore) -> impl IntoResponse {
    CartCountTemplate {
        count: cart.item_count(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn item(sizes: &[&str]) -> CatalogItem {
        serde_json::from_value(json!({
            "_id": "p1", "name": "Monstera", "slug": "monstera", "price": 30,
            "quantity": 4, "sizes": sizes
        }))
        .unwrap()
    }

    #[test]
    fn test_resolve_size_checks_offered_sizes() {
        let sized = item(&["S", "M"]);
        assert_eq!(resolve_size(&sized, Some("M")), Some("M"));
        assert_eq!(resolve_size(&sized, Some("XL")), None);
        assert_eq!(resolve_size(&sized, None), Some(sized.default_size()));
    }

    #[test]
    fn test_resolve_size_accepts_anything_when_unsized() {
        let unsized_item = item(&[]);
        assert_eq!(resolve_size(&unsized_item, Some("L")), Some("L"));
        assert_eq!(resolve_size(&unsized_item, Some("  ")), Some(""));
    }
}
