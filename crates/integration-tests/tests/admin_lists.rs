//! Admin list views against the scripted backend: session-held lists,
//! local search, delete reconciliation and token expiry.

#![allow(clippy::unwrap_used)]

use fernhouse_integration_tests::{
    ADMIN_EMAIL, CUSTOMER_EMAIL, MockBackend, TestApp, USERS_PAGE_SIZE, location, spawn_admin,
};
use reqwest::Method;

const USER_PAGES: &str = "auth/all-users";

async fn signed_in_admin() -> (MockBackend, TestApp) {
    let backend = MockBackend::default();
    let app = spawn_admin(&backend.spawn().await).await;

    let response = app.login(ADMIN_EMAIL).await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/");
    (backend, app)
}

async fn page(app: &TestApp, path: &str) -> String {
    let response = app.get(path).await;
    assert!(response.status().is_success(), "{path} returned {}", response.status());
    response.text().await.unwrap()
}

#[tokio::test]
async fn test_failed_delete_keeps_loaded_users() {
    let (backend, app) = signed_in_admin().await;

    let users = page(&app, "/users").await;
    assert!(users.contains("Bram"));
    assert!(users.contains("2 loaded of 4"));

    backend.reject_deletes(true);
    let response = app.post_form("/users/u2/delete", &[("q", "")]).await;
    assert_eq!(location(&response), "/users");

    let users = page(&app, "/users").await;
    assert!(users.contains("User has open orders"));
    assert!(users.contains("Bram"));
    assert!(users.contains("2 loaded of 4"));

    assert_eq!(backend.requests_to(&Method::DELETE, "auth/delete-user/").len(), 1);
    assert_eq!(backend.requests_to(&Method::GET, USER_PAGES).len(), 1);
}

#[tokio::test]
async fn test_successful_delete_drops_only_that_user() {
    let (backend, app) = signed_in_admin().await;
    page(&app, "/users").await;

    app.post_form("/users/u2/delete", &[("q", "")]).await;

    let users = page(&app, "/users").await;
    assert!(users.contains("User deleted"));
    assert!(!users.contains("Bram"));
    assert!(users.contains("1 shown, 1 loaded of 3"));

    // Reconciled locally, not refetched
    assert_eq!(backend.requests_to(&Method::GET, USER_PAGES).len(), 1);
}

#[tokio::test]
async fn test_load_more_after_delete_skips_nobody() {
    let (backend, app) = signed_in_admin().await;
    let users = page(&app, "/users").await;
    assert!(!users.contains("Cleo"));
    assert_eq!(USERS_PAGE_SIZE, 2);

    app.post_form("/users/u2/delete", &[("q", "")]).await;

    // Cleo moved up into page one when Bram was deleted
    let response = app.post_form("/users/more", &[("q", "")]).await;
    assert_eq!(location(&response), "/users");
    let users = page(&app, "/users").await;
    assert!(users.contains("Cleo"));
    assert!(users.contains("2 loaded of 3"));

    app.post_form("/users/more", &[("q", "")]).await;
    let users = page(&app, "/users").await;
    assert!(users.contains("Dara"));
    assert!(users.contains("3 loaded of 3"));
    assert!(!users.contains("Bram"));

    assert_eq!(backend.requests_to(&Method::GET, USER_PAGES).len(), 3);
}

#[tokio::test]
async fn test_search_filters_loaded_users_without_fetching() {
    let (backend, app) = signed_in_admin().await;
    page(&app, "/users").await;

    let by_phone = page(&app, "/users?q=555-0102").await;
    assert!(by_phone.contains("Bram"));
    assert!(by_phone.contains("1 shown, 2 loaded of 4"));

    let by_email = page(&app, "/users?q=ADA@").await;
    assert!(!by_email.contains("Bram"));
    assert!(by_email.contains("1 shown, 2 loaded of 4"));

    // Cleo is on page two, which is not loaded
    let unloaded = page(&app, "/users?q=cleo").await;
    assert!(unloaded.contains("0 shown, 2 loaded of 4"));

    assert_eq!(backend.requests_to(&Method::GET, USER_PAGES).len(), 1);

    page(&app, "/users?refresh=true").await;
    assert_eq!(backend.requests_to(&Method::GET, USER_PAGES).len(), 2);
}

#[tokio::test]
async fn test_admin_cannot_delete_own_account() {
    let (backend, app) = signed_in_admin().await;
    page(&app, "/users").await;

    let response = app.post_form("/users/u1/delete", &[("q", "")]).await;
    assert_eq!(location(&response), "/users");

    let users = page(&app, "/users").await;
    assert!(users.contains("You cannot delete your own account"));
    assert!(backend.requests_to(&Method::DELETE, "auth/delete-user/").is_empty());
}

#[tokio::test]
async fn test_products_search_by_code_and_failed_delete() {
    let (backend, app) = signed_in_admin().await;

    let filtered = page(&app, "/products?q=frn").await;
    assert!(filtered.contains("Boston Fern"));
    assert!(!filtered.contains("Monstera"));

    backend.reject_deletes(true);
    let response = app.post_form("/products/p1/delete", &[("q", "")]).await;
    assert_eq!(location(&response), "/products");

    let products = page(&app, "/products").await;
    assert!(products.contains("Product is part of an open order"));
    assert!(products.contains("Monstera"));
    assert_eq!(
        backend.requests_to(&Method::GET, "product/product-list").len(),
        1
    );
}

#[tokio::test]
async fn test_expired_token_on_delete_sends_admin_back_to_login() {
    let (backend, app) = signed_in_admin().await;
    page(&app, "/users").await;
    backend.expire_tokens(true);

    let response = app.post_form("/users/u2/delete", &[("q", "")]).await;
    assert_eq!(location(&response), "/auth/login?expired=true");
}

#[tokio::test]
async fn test_expired_token_sends_admin_back_to_login() {
    let (backend, app) = signed_in_admin().await;
    backend.expire_tokens(true);

    let response = app.get("/users").await;
    assert_eq!(location(&response), "/auth/login?expired=true");

    let login = page(&app, "/auth/login?expired=true").await;
    assert!(login.contains("Your session expired"));

    // The stale admin was dropped from the session
    let response = app.get("/").await;
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn test_customer_account_cannot_sign_in() {
    let backend = MockBackend::default();
    let app = spawn_admin(&backend.spawn().await).await;

    let response = app.login(CUSTOMER_EMAIL).await;
    assert!(response.status().is_success());
    assert!(response.text().await.unwrap().contains("does not have admin access"));

    let response = app.get("/users").await;
    assert_eq!(location(&response), "/auth/login");
}
