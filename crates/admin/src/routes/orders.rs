//! Order administration: paged list, status changes, return decisions.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Redirect,
};
use fernhouse_core::{Notice, Order, OrderId, OrderStatus, PaymentMethod, ReturnStatus};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{Shell, redirect_with_notice};
use crate::api::{ApiError, ReturnDecision};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Orders page query.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "first_page")]
    pub page: u32,
}

const fn first_page() -> u32 {
    1
}

/// Status change form.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
    #[serde(default = "first_page")]
    pub page: u32,
}

/// Return decision form.
#[derive(Debug, Deserialize)]
pub struct ReturnForm {
    pub decision: ReturnDecision,
    #[serde(default = "first_page")]
    pub page: u32,
}

fn page_path(page: u32) -> String {
    format!("/orders?page={}", page.max(1))
}

/// One line of an order, for the expandable detail row.
#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub name: String,
    pub size: String,
    pub quantity: u32,
    pub price: String,
}

/// One row of the orders table.
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: String,
    pub placed_on: String,
    pub buyer: String,
    pub status: OrderStatus,
    pub total: String,
    pub payment_method: &'static str,
    pub units: u32,
    pub return_label: Option<&'static str>,
    pub return_pending: bool,
    pub lines: Vec<OrderLineView>,
}

impl From<&Order> for OrderRow {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            placed_on: order
                .created_at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            buyer: order
                .buyer
                .as_ref()
                .map(|buyer| buyer.display_name().to_string())
                .unwrap_or_default(),
            status: order.status,
            total: order.total.display(),
            payment_method: match order.payment_method {
                PaymentMethod::Card => "Card",
                PaymentMethod::CashOnDelivery => "COD",
            },
            units: order.unit_count(),
            return_label: match order.return_status {
                ReturnStatus::None => None,
                ReturnStatus::Requested => Some("Requested"),
                ReturnStatus::Approved => Some("Approved"),
                ReturnStatus::Rejected => Some("Rejected"),
            },
            return_pending: order.return_status.is_pending(),
            lines: order
                .products
                .iter()
                .map(|line| OrderLineView {
                    name: line.name.clone(),
                    size: line.size.clone(),
                    quantity: line.quantity,
                    price: line.price.display(),
                })
                .collect(),
        }
    }
}

impl OrderRow {
    /// Whether `status` is this order's current status.
    #[must_use]
    pub fn is_status(&self, status: &OrderStatus) -> bool {
        self.status == *status
    }
}

/// Orders page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersTemplate {
    pub shell: Shell,
    pub rows: Vec<OrderRow>,
    pub statuses: [OrderStatus; 5],
    pub page: u32,
    pub has_prev: bool,
    pub has_next: bool,
}

/// Orders list, one backend page at a time.
///
/// The backend sends no total for orders, so a full page implies a next one.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<PageQuery>,
) -> Result<OrdersTemplate> {
    let page = query.page.max(1);
    let orders = state.backend().all_orders(&admin.token, page).await?;
    let page_size = state.config().page_size_hint as usize;

    Ok(OrdersTemplate {
        shell: Shell::load(&admin, &session, "/orders").await,
        has_next: orders.len() >= page_size,
        rows: orders.iter().map(OrderRow::from).collect(),
        statuses: OrderStatus::ALL,
        page,
        has_prev: page > 1,
    })
}

/// Move an order to a new status.
#[instrument(skip(admin, state, session))]
pub async fn set_status(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let status: OrderStatus = form.status.parse().map_err(AppError::BadRequest)?;

    let notice = match state
        .backend()
        .set_order_status(&admin.token, &OrderId::new(id), status)
        .await
    {
        Ok(()) => Notice::success(format!("Order marked {status}")),
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Order status change failed");
            Notice::error(e.user_message())
        }
    };

    redirect_with_notice(&session, notice, &page_path(form.page)).await
}

/// Approve or reject a customer's return request.
#[instrument(skip(admin, state, session))]
pub async fn decide_return(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<ReturnForm>,
) -> Result<Redirect> {
    let notice = match state
        .backend()
        .decide_return(&admin.token, &OrderId::new(id), form.decision)
        .await
    {
        Ok(()) => Notice::success(match form.decision {
            ReturnDecision::Approve => "Return approved",
            ReturnDecision::Reject => "Return rejected",
        }),
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Return decision failed");
            Notice::error(e.user_message())
        }
    };

    redirect_with_notice(&session, notice, &page_path(form.page)).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::extract::{FromRequest, Request};
    use axum::http::header::CONTENT_TYPE;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_order_row_from_backend_order() {
        let order: Order = serde_json::from_value(json!({
            "_id": "o1",
            "products": [
                {"id": "p1", "code": "MON", "name": "Monstera", "price": 35, "size": "M", "quantity": 2}
            ],
            "buyer": {"_id": "u1", "name": "Rowan"},
            "status": "Delivered",
            "total": 83,
            "payment_method": "cash_on_delivery",
            "return_status": "requested",
            "createdAt": "2026-03-01T10:00:00Z"
        }))
        .unwrap();

        let row = OrderRow::from(&order);
        assert_eq!(row.buyer, "Rowan");
        assert_eq!(row.placed_on, "2026-03-01 10:00");
        assert_eq!(row.payment_method, "COD");
        assert_eq!(row.units, 2);
        assert!(row.return_pending);
        assert_eq!(row.lines.first().unwrap().price, "$35.00");
    }

    async fn decode<T: serde::de::DeserializeOwned>(body: &'static str) -> T {
        let request = Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        let Form(form) = Form::<T>::from_request(request, &()).await.unwrap();
        form
    }

    #[tokio::test]
    async fn test_forms_decode() {
        let form: ReturnForm = decode("decision=approve&page=3").await;
        assert_eq!(form.decision, ReturnDecision::Approve);
        assert_eq!(form.page, 3);

        let form: StatusForm = decode("status=Shipped").await;
        assert_eq!(form.page, 1);
        assert_eq!(form.status.parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
    }

    #[test]
    fn test_page_path_clamps() {
        assert_eq!(page_path(0), "/orders?page=1");
        assert_eq!(page_path(4), "/orders?page=4");
    }
}
