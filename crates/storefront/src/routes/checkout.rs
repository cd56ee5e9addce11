//! Checkout route handlers.
//!
//! `POST /checkout` either hands the customer to the payment provider (card)
//! or places the order directly (cash on delivery). The provider sends card
//! customers back to `/payment/success/{session_id}`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use fernhouse_core::{Notice, PaymentMethod};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::redirect_with_notice;
use crate::checkout::{CART_PATH, CheckoutOutcome, complete_card_payment, place_cash_order};
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::state::AppState;
use crate::stores::{AuthStore, CartStore};
use crate::views::Layout;

/// Checkout form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub payment_method: PaymentMethod,
    /// One-time reference rendered into the cart page's form.
    pub token: String,
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirmation.html")]
pub struct ConfirmationTemplate {
    pub layout: Layout,
}

async fn finish(cart: &CartStore, outcome: &CheckoutOutcome) -> Result<Redirect> {
    redirect_with_notice(cart.storage(), outcome.notice(), outcome.redirect_target()).await
}

/// Start a checkout.
#[instrument(skip(state, cart, auth, form), fields(payment_method = %form.payment_method))]
pub async fn start(
    State(state): State<AppState>,
    mut cart: CartStore,
    auth: AuthStore,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    if !auth.is_authenticated() {
        let notice = Notice::info("Please sign in to check out");
        return Ok(redirect_with_notice(cart.storage(), notice, "/auth/login")
            .await?
            .into_response());
    }

    add_breadcrumb("checkout", "Checkout started", None);

    match form.payment_method {
        PaymentMethod::Card => {
            if cart.is_empty() {
                let notice = Notice::error("Your cart is empty");
                return Ok(redirect_with_notice(cart.storage(), notice, CART_PATH)
                    .await?
                    .into_response());
            }

            let config = state.config();
            let started = state
                .backend()
                .create_checkout_session(
                    auth.token(),
                    cart.items(),
                    &config.payment_success_url(),
                    &config.payment_cancel_url(),
                )
                .await;

            match started {
                Ok(url) => {
                    info!("Redirecting to payment provider");
                    Ok(Redirect::to(&url).into_response())
                }
                Err(e) => {
                    warn!(error = %e, "Failed to create checkout session");
                    let notice = Notice::error(format!(
                        "We could not start your payment: {}",
                        e.user_message()
                    ));
                    Ok(redirect_with_notice(cart.storage(), notice, CART_PATH)
                        .await?
                        .into_response())
                }
            }
        }
        // Empty carts are rejected after the ledger lookup in `place_cash_order`
        PaymentMethod::CashOnDelivery => {
            let outcome =
                place_cash_order(state.backend(), &mut cart, auth.session(), &form.token).await?;
            Ok(finish(&cart, &outcome).await?.into_response())
        }
    }
}

/// Return from the payment provider.
#[instrument(skip(state, cart, auth))]
pub async fn payment_success(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    mut cart: CartStore,
    auth: AuthStore,
) -> Result<impl IntoResponse> {
    let outcome =
        complete_card_payment(state.backend(), &mut cart, auth.session(), &session_id).await?;
    finish(&cart, &outcome).await
}

/// Customer cancelled at the payment provider.
#[instrument(skip_all)]
pub async fn payment_cancel(cart: CartStore) -> Result<impl IntoResponse> {
    let notice = Notice::info("Payment cancelled. Your cart is still here.");
    redirect_with_notice(cart.storage(), notice, CART_PATH).await
}

/// Thank-you page.
#[instrument(skip_all)]
pub async fn confirmation(cart: CartStore, auth: AuthStore) -> impl IntoResponse {
    ConfirmationTemplate {
        layout: Layout::load(&cart, &auth).await,
    }
}
