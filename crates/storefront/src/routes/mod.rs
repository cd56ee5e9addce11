//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Home page (banner, categories, first pages)
//!
//! # Catalog
//! GET  /products?page=N               - Plants, pages 1..=N
//! GET  /products/{slug}               - Plant detail + related plants
//! GET  /pots?page=N                   - Pots, pages 1..=N
//! GET  /pots/{slug}                   - Pot detail + related pots
//! GET  /categories/{slug}             - Plants in a category
//! GET  /search?q=                     - Name/code search over the first pages
//!
//! # Cart
//! GET  /cart                          - Cart page
//! POST /cart/add                      - Add a line (merges by id and size)
//! POST /cart/update                   - Change a line's quantity
//! POST /cart/remove                   - Remove a line
//! GET  /cart/count                    - Cart count badge (fragment)
//!
//! # Checkout
//! POST /checkout                      - Card: redirect to provider; COD: place order
//! GET  /payment/success/{session_id}  - Provider return: check status, create order
//! GET  /payment/cancel                - Provider cancel return
//! GET  /orders/confirmation           - Thank-you page
//!
//! # Auth
//! GET  /auth/login                    - Login page
//! POST /auth/login                    - Login action
//! GET  /auth/register                 - Register page
//! POST /auth/register                 - Register action
//! POST /auth/logout                   - Logout action
//!
//! # Account (requires auth)
//! GET  /account                       - Profile
//! GET  /account/orders                - Order history
//! POST /account/orders/{id}/return    - Request a return
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod home;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use fernhouse_core::Notice;

use crate::error::Result;
use crate::middleware::{auth_rate_limiter, checkout_rate_limiter};
use crate::persistence::{ClientStorage, push_notice};
use crate::state::AppState;

/// Queue `notice` for the next page and redirect to `to`.
pub(crate) async fn redirect_with_notice<S: ClientStorage>(
    storage: &S,
    notice: Notice,
    to: &str,
) -> Result<Redirect> {
    push_notice(storage, &notice).await?;
    Ok(Redirect::to(to))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(catalog::products_index))
        .route("/products/{slug}", get(catalog::product_show))
        .route("/pots", get(catalog::pots_index))
        .route("/pots/{slug}", get(catalog::pot_show))
        .route("/categories/{slug}", get(catalog::category_show))
        .route("/search", get(catalog::search))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/checkout",
            post(checkout::start).layer(checkout_rate_limiter()),
        )
        .route("/payment/success/{session_id}", get(checkout::payment_success))
        .route("/payment/cancel", get(checkout::payment_cancel))
        .route("/orders/confirmation", get(checkout::confirmation))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(auth_rate_limiter())),
        )
        .route(
            "/register",
            get(auth::register_page).merge(post(auth::register).layer(auth_rate_limiter())),
        )
        .route("/logout", post(auth::logout))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/orders", get(account::orders))
        .route("/orders/{id}/return", post(account::request_return))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .merge(catalog_routes())
        .nest("/cart", cart_routes())
        .merge(checkout_routes())
        .nest("/auth", auth_routes())
        .nest("/account", account_routes())
}
