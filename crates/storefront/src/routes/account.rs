//! Account route handlers (requires auth).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use fernhouse_core::{Notice, OrderId};
use serde::Deserialize;
use tracing::{instrument, warn};

use super::redirect_with_notice;
use crate::api::ApiError;
use crate::error::{Result, clear_sentry_user};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::persistence::forget_auth;
use crate::state::AppState;
use crate::stores::{AuthStore, CartStore};
use crate::views::{Layout, OrderView};

/// Return request form data.
#[derive(Debug, Deserialize)]
pub struct ReturnForm {
    #[serde(default)]
    pub reason: String,
}

/// Account profile template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountTemplate {
    pub layout: Layout,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub orders: Vec<OrderView>,
}

fn user_field(auth: &AuthStore, key: &str) -> String {
    auth.user()
        .and_then(|user| user.get(key))
        .and_then(|value| value.as_str())
        .unwrap_or_default()
        .to_string()
}

/// The backend no longer accepts the stored token: sign the customer out.
async fn expire_login(auth: &AuthStore) -> Result<Response> {
    forget_auth(auth.storage()).await?;
    clear_sentry_user();
    let notice = Notice::info("Your session has expired. Please sign in again.");
    Ok(redirect_with_notice(auth.storage(), notice, "/auth/login")
        .await?
        .into_response())
}

/// Display the account profile.
#[instrument(skip_all)]
pub async fn index(_: RequireAuth, cart: CartStore, auth: AuthStore) -> impl IntoResponse {
    AccountTemplate {
        name: user_field(&auth, "name"),
        email: user_field(&auth, "email"),
        phone: user_field(&auth, "phone"),
        address: user_field(&auth, "address"),
        layout: Layout::load(&cart, &auth).await,
    }
}

/// Display the customer's orders.
#[instrument(skip_all)]
pub async fn orders(
    State(state): State<AppState>,
    _: RequireAuth,
    cart: CartStore,
    auth: AuthStore,
) -> Result<Response> {
    let orders = match state.backend().my_orders(auth.token()).await {
        Ok(orders) => orders,
        Err(ApiError::Unauthorized) => return expire_login(&auth).await,
        Err(e) => return Err(e.into()),
    };

    Ok(OrdersTemplate {
        orders: orders.iter().map(OrderView::from).collect(),
        layout: Layout::load(&cart, &auth).await,
    }
    .into_response())
}

/// Ask for a return on a delivered order.
#[instrument(skip(state, auth, form))]
pub async fn request_return(
    State(state): State<AppState>,
    Path(id): Path<String>,
    _: RequireAuth,
    auth: AuthStore,
    Form(form): Form<ReturnForm>,
) -> Result<Response> {
    let reason = form.reason.trim();
    if reason.is_empty() {
        let notice = Notice::error("Please tell us why you are returning this order");
        return Ok(redirect_with_notice(auth.storage(), notice, "/account/orders")
            .await?
            .into_response());
    }

    let order = OrderId::new(id);
    let notice = match state
        .backend()
        .request_return(auth.token(), &order, reason)
        .await
    {
        Ok(message) if message.is_empty() => Notice::success("Return requested"),
        Ok(message) => Notice::success(message),
        Err(ApiError::Unauthorized) => return expire_login(&auth).await,
        Err(e) => {
            warn!(error = %e, order_id = %order, "Return request failed");
            Notice::error(e.user_message())
        }
    };

    Ok(redirect_with_notice(auth.storage(), notice, "/account/orders")
        .await?
        .into_response())
}
