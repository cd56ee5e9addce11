//! Checkout flows through the storefront, against the scripted backend.
//!
//! Every test gets its own backend and storefront, so they run in parallel.

#![allow(clippy::unwrap_used)]

use fernhouse_integration_tests::{
    CUSTOMER_EMAIL, MockBackend, TestApp, hidden_input, location, spawn_storefront,
};
use reqwest::Method;

const CREATE_ORDER: &str = "order/create-order";

/// A signed-in customer with two Monsteras (size M) in the cart.
async fn customer_with_cart() -> (MockBackend, TestApp) {
    let backend = MockBackend::default();
    let app = spawn_storefront(&backend.spawn().await).await;

    let response = app.login(CUSTOMER_EMAIL).await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/account");

    add_monsteras(&app).await;
    (backend, app)
}

async fn add_monsteras(app: &TestApp) {
    let response = app
        .post_form(
            "/cart/add",
            &[("kind", "product"), ("slug", "monstera"), ("size", "M"), ("quantity", "2")],
        )
        .await;
    assert!(response.status().is_redirection());
}

#[tokio::test]
async fn test_unpaid_session_returns_to_cart_without_creating_order() {
    let (backend, app) = customer_with_cart().await;
    backend.set_payment_status("unpaid");

    let response = app.get("/payment/success/cs_unpaid").await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/cart");

    assert_eq!(backend.requests_to(&Method::GET, "payment/session-status/").len(), 1);
    assert!(backend.requests_to(&Method::POST, CREATE_ORDER).is_empty());

    let cart = app.get("/cart").await.text().await.unwrap();
    assert!(cart.contains("We could not confirm your payment"));
    assert!(cart.contains("Monstera"), "cart survives a failed payment");
}

#[tokio::test]
async fn test_reload_after_rejected_order_resends_same_idempotency_key() {
    let (backend, app) = customer_with_cart().await;
    backend.reject_orders(true);

    let first = app.get("/payment/success/cs_retry").await;
    assert_eq!(location(&first), "/cart");

    backend.reject_orders(false);
    let second = app.get("/payment/success/cs_retry").await;
    assert_eq!(location(&second), "/orders/confirmation");

    let orders = backend.requests_to(&Method::POST, CREATE_ORDER);
    assert_eq!(orders.len(), 2);
    let first_key = orders.first().unwrap().idempotency_key.clone();
    assert!(first_key.is_some());
    assert_eq!(first_key, orders.get(1).unwrap().idempotency_key);

    // A completed reference is not submitted again
    let third = app.get("/payment/success/cs_retry").await;
    assert_eq!(location(&third), "/orders/confirmation");
    assert_eq!(backend.requests_to(&Method::POST, CREATE_ORDER).len(), 2);
}

#[tokio::test]
async fn test_separate_payment_sessions_use_separate_keys() {
    let (backend, app) = customer_with_cart().await;

    let first = app.get("/payment/success/cs_one").await;
    assert_eq!(location(&first), "/orders/confirmation");

    add_monsteras(&app).await;
    let second = app.get("/payment/success/cs_two").await;
    assert_eq!(location(&second), "/orders/confirmation");

    let orders = backend.requests_to(&Method::POST, CREATE_ORDER);
    assert_eq!(orders.len(), 2);
    assert_ne!(
        orders.first().unwrap().idempotency_key,
        orders.get(1).unwrap().idempotency_key
    );
}

#[tokio::test]
async fn test_paid_order_clears_cart_and_sends_cart_lines() {
    let (backend, app) = customer_with_cart().await;

    let response = app.get("/payment/success/cs_paid").await;
    assert_eq!(location(&response), "/orders/confirmation");

    let orders = backend.requests_to(&Method::POST, CREATE_ORDER);
    let body = &orders.first().unwrap().body;
    assert_eq!(body["payment_method"], "card");
    assert_eq!(body["buyer"], "u2");
    assert_eq!(body["products"][0]["quantity"], 2);
    assert_eq!(body["products"][0]["size"], "M");

    let confirmation = app.get("/orders/confirmation").await.text().await.unwrap();
    assert!(confirmation.contains("Your order has been placed"));

    let cart = app.get("/cart").await.text().await.unwrap();
    assert!(!cart.contains("Monstera"));
}

#[tokio::test]
async fn test_cash_on_delivery_places_one_order_per_form_token() {
    let (backend, app) = customer_with_cart().await;

    let cart = app.get("/cart").await.text().await.unwrap();
    let token = hidden_input(&cart, "token").unwrap();
    let form = [("payment_method", "cash_on_delivery"), ("token", token.as_str())];

    let response = app.post_form("/checkout", &form).await;
    assert_eq!(location(&response), "/orders/confirmation");

    // Double submit of the same form
    let again = app.post_form("/checkout", &form).await;
    assert_eq!(location(&again), "/orders/confirmation");

    let orders = backend.requests_to(&Method::POST, CREATE_ORDER);
    assert_eq!(orders.len(), 1);
    assert_eq!(orders.first().unwrap().body["payment_method"], "cash_on_delivery");
    assert!(backend.requests_to(&Method::GET, "payment/session-status/").is_empty());
}

#[tokio::test]
async fn test_cash_on_delivery_with_empty_cart_goes_back_to_cart() {
    let backend = MockBackend::default();
    let app = spawn_storefront(&backend.spawn().await).await;
    app.login(CUSTOMER_EMAIL).await;

    let response = app
        .post_form("/checkout", &[("payment_method", "cash_on_delivery"), ("token", "fresh")])
        .await;
    assert_eq!(location(&response), "/cart");

    let cart = app.get("/cart").await.text().await.unwrap();
    assert!(cart.contains("your cart is empty"));
    assert!(backend.requests_to(&Method::POST, CREATE_ORDER).is_empty());
}

#[tokio::test]
async fn test_card_checkout_redirects_to_provider() {
    let (backend, app) = customer_with_cart().await;

    let response = app
        .post_form("/checkout", &[("payment_method", "card"), ("token", "t")])
        .await;
    assert_eq!(location(&response), "https://pay.fernhouse.test/c/cs_test");

    let sessions = backend.requests_to(&Method::POST, "payment/create-checkout-session");
    let body = &sessions.first().unwrap().body;
    let success_url = body["success_url"].as_str().unwrap();
    assert!(success_url.starts_with(&app.url("/payment/success/")));
    assert!(success_url.ends_with("{CHECKOUT_SESSION_ID}"));
    assert!(backend.requests_to(&Method::POST, CREATE_ORDER).is_empty());
}

#[tokio::test]
async fn test_checkout_requires_sign_in() {
    let backend = MockBackend::default();
    let app = spawn_storefront(&backend.spawn().await).await;
    add_monsteras(&app).await;

    let response = app
        .post_form("/checkout", &[("payment_method", "cash_on_delivery"), ("token", "t")])
        .await;
    assert_eq!(location(&response), "/auth/login");
    assert!(backend.requests_to(&Method::POST, CREATE_ORDER).is_empty());
}
