//! End-to-end test support for Fernhouse.
//!
//! Both web apps talk to the backend REST API only, so the tests run them
//! in-process against [`MockBackend`], a scripted stand-in for the backend
//! that records every request it receives.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p fernhouse-integration-tests
//! ```
//!
//! No database, network access or credentials are needed: every server
//! binds to an ephemeral port on `127.0.0.1`.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use url::Url;

/// Password every seeded user logs in with.
pub const PASSWORD: &str = "plant-lover";

/// Seeded admin account.
pub const ADMIN_EMAIL: &str = "ada@fernhouse.test";

/// Seeded customer account.
pub const CUSTOMER_EMAIL: &str = "bram@fernhouse.test";

/// Users per `auth/all-users` page; four users are seeded.
pub const USERS_PAGE_SIZE: usize = 2;

// =============================================================================
// Mock backend
// =============================================================================

/// One request the mock backend received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    /// Path below `/api/v1/`, e.g. `order/create-order`.
    pub path: String,
    pub idempotency_key: Option<String>,
    pub body: Value,
}

#[derive(Debug)]
struct Script {
    products: Vec<Value>,
    users: Vec<Value>,
    payment_status: String,
    reject_orders: bool,
    reject_deletes: bool,
    expired_tokens: bool,
    requests: Vec<RecordedRequest>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            products: vec![
                json!({
                    "_id": "p1", "name": "Monstera", "slug": "monstera", "code": "MON-01",
                    "price": 35, "quantity": 10, "sizes": ["M", "L"]
                }),
                json!({
                    "_id": "p2", "name": "Boston Fern", "slug": "boston-fern", "code": "FRN-02",
                    "price": 18, "quantity": 4, "sizes": ["S"]
                }),
            ],
            users: vec![
                json!({"_id": "u1", "name": "Ada", "email": ADMIN_EMAIL, "role": 1}),
                json!({"_id": "u2", "name": "Bram", "email": CUSTOMER_EMAIL, "phone": "555-0102", "role": 0}),
                json!({"_id": "u3", "name": "Cleo", "email": "cleo@fernhouse.test", "role": 0}),
                json!({"_id": "u4", "name": "Dara", "email": "dara@fernhouse.test", "role": 0}),
            ],
            payment_status: "paid".to_string(),
            reject_orders: false,
            reject_deletes: false,
            expired_tokens: false,
            requests: Vec::new(),
        }
    }
}

/// Scripted backend. Cheap to clone; clones share the script.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    script: Arc<Mutex<Script>>,
}

impl MockBackend {
    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serve the mock on an ephemeral port and return its origin.
    pub async fn spawn(&self) -> Url {
        let (listener, address) = bind().await;
        let router = Router::new().fallback(dispatch).with_state(self.clone());
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("mock backend stopped");
        });
        Url::parse(&format!("http://{address}")).expect("valid mock backend url")
    }

    /// `payment_status` reported for every checkout session.
    pub fn set_payment_status(&self, status: &str) {
        self.script().payment_status = status.to_string();
    }

    /// Answer `success: false` to order creation.
    pub fn reject_orders(&self, reject: bool) {
        self.script().reject_orders = reject;
    }

    /// Answer `success: false` to every delete.
    pub fn reject_deletes(&self, reject: bool) {
        self.script().reject_deletes = reject;
    }

    /// Answer 401 to every request carrying a token.
    pub fn expire_tokens(&self, expired: bool) {
        self.script().expired_tokens = expired;
    }

    /// Requests received so far whose path starts with `prefix`.
    #[must_use]
    pub fn requests_to(&self, method: &Method, prefix: &str) -> Vec<RecordedRequest> {
        self.script()
            .requests
            .iter()
            .filter(|request| request.method == *method && request.path.starts_with(prefix))
            .cloned()
            .collect()
    }
}

fn rejected(message: &str) -> Response {
    Json(json!({"success": false, "message": message})).into_response()
}

fn page_param(uri: &Uri) -> u32 {
    uri.query()
        .and_then(|query| query.split('&').find_map(|pair| pair.strip_prefix("page=")))
        .and_then(|page| page.parse().ok())
        .unwrap_or(1)
}

async fn dispatch(
    State(mock): State<MockBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path()
        .strip_prefix("/api/v1/")
        .unwrap_or_else(|| uri.path())
        .to_string();
    let has_token = headers.contains_key("authorization");

    let mut script = mock.script();
    script.requests.push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        idempotency_key: headers
            .get("idempotency-key")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });

    if has_token && script.expired_tokens {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "jwt expired"}))).into_response();
    }

    let page = page_param(&uri);

    match (method.as_str(), path.as_str()) {
        ("POST", "auth/login") => {
            let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
            let user = script
                .users
                .iter()
                .find(|user| user["email"] == body["email"])
                .filter(|_| body["password"] == PASSWORD)
                .cloned();
            match user {
                Some(user) => {
                    let token = format!("token-{}", user["_id"].as_str().unwrap_or_default());
                    Json(json!({"success": true, "user": user, "token": token})).into_response()
                }
                None => rejected("Invalid email or password"),
            }
        }
        ("GET", "auth/admin-auth") => Json(json!({"ok": true})).into_response(),
        ("GET", "auth/orders") => Json(json!({"orders": []})).into_response(),
        ("GET", "auth/all-users") => {
            let skip = usize::try_from(page.saturating_sub(1)).unwrap_or(0) * USERS_PAGE_SIZE;
            let users: Vec<Value> =
                script.users.iter().skip(skip).take(USERS_PAGE_SIZE).cloned().collect();
            Json(json!({"users": users})).into_response()
        }
        ("GET", "auth/users-count") => Json(json!({"total": script.users.len()})).into_response(),
        ("GET", "product/product-list") => {
            let products = if page == 1 { script.products.clone() } else { Vec::new() };
            Json(json!({"products": products})).into_response()
        }
        ("GET", "product/product-count") => {
            Json(json!({"total": script.products.len()})).into_response()
        }
        ("GET", "pot/pot-list") => Json(json!({"pots": []})).into_response(),
        ("GET", "pot/pot-count") => Json(json!({"total": 0})).into_response(),
        ("GET", "category/get-category") => Json(json!({"category": []})).into_response(),
        ("GET", other) if other.starts_with("product/get-product/") => {
            let slug = other.trim_start_matches("product/get-product/");
            match script.products.iter().find(|item| item["slug"] == slug) {
                Some(item) => Json(json!({"product": item})).into_response(),
                None => (StatusCode::NOT_FOUND, Json(json!({"message": "not found"}))).into_response(),
            }
        }
        ("POST", "payment/create-checkout-session") => Json(json!({
            "url": "https://pay.fernhouse.test/c/cs_test",
            "id": "cs_test"
        }))
        .into_response(),
        ("GET", other) if other.starts_with("payment/session-status/") => {
            Json(json!({"payment_status": script.payment_status})).into_response()
        }
        ("POST", "order/create-order") => {
            if script.reject_orders {
                rejected("Stock changed, please review your cart")
            } else {
                Json(json!({"success": true, "message": "Order placed"})).into_response()
            }
        }
        ("DELETE", other) if other.starts_with("auth/delete-user/") => {
            let id = other.trim_start_matches("auth/delete-user/").to_string();
            if script.reject_deletes {
                return rejected("User has open orders");
            }
            script.users.retain(|user| user["_id"] != id.as_str());
            Json(json!({"success": true, "message": "User deleted"})).into_response()
        }
        ("DELETE", other) if other.starts_with("product/delete-product/") => {
            let id = other.trim_start_matches("product/delete-product/").to_string();
            if script.reject_deletes {
                return rejected("Product is part of an open order");
            }
            script.products.retain(|item| item["_id"] != id.as_str());
            Json(json!({"success": true, "message": "Product deleted"})).into_response()
        }
        _ => (StatusCode::NOT_FOUND, Json(json!({"message": "no such route"}))).into_response(),
    }
}

// =============================================================================
// App servers
// =============================================================================

async fn bind() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let address = listener.local_addr().expect("listener address");
    (listener, address)
}

fn serve(listener: TcpListener, router: Router) {
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("app server stopped");
    });
}

/// A running app and a cookie-keeping client that does not follow redirects.
pub struct TestApp {
    pub address: SocketAddr,
    pub client: reqwest::Client,
}

impl TestApp {
    fn new(address: SocketAddr) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");
        Self { address, client }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.address)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request failed")
    }

    /// Sign in through the app's login form.
    pub async fn login(&self, email: &str) -> reqwest::Response {
        self.post_form("/auth/login", &[("email", email), ("password", PASSWORD)])
            .await
    }
}

/// Start a storefront talking to `backend`.
pub async fn spawn_storefront(backend: &Url) -> TestApp {
    use fernhouse_storefront::config::{BackendConfig, LogFormat, StorefrontConfig};
    use fernhouse_storefront::persistence::EmptyCartWrite;

    let (listener, address) = bind().await;
    let config = StorefrontConfig {
        host: address.ip(),
        port: address.port(),
        base_url: format!("http://{address}"),
        backend: BackendConfig::with_defaults(backend.clone()),
        cart_empty_write: EmptyCartWrite::Persist,
        log_format: LogFormat::Text,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    };
    let state = fernhouse_storefront::state::AppState::new(config).expect("storefront state");
    serve(listener, fernhouse_storefront::build_router(state));
    TestApp::new(address)
}

/// Start an admin panel talking to `backend`.
pub async fn spawn_admin(backend: &Url) -> TestApp {
    use fernhouse_admin::config::AdminConfig;

    let (listener, address) = bind().await;
    let mut config = AdminConfig::local(backend.clone());
    config.host = address.ip();
    config.port = address.port();
    config.base_url = format!("http://{address}");
    let state = fernhouse_admin::state::AppState::new(config).expect("admin state");
    serve(listener, fernhouse_admin::build_router(state));
    TestApp::new(address)
}

// =============================================================================
// Response helpers
// =============================================================================

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get("location")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Value of the hidden input called `name` in an HTML page.
#[must_use]
pub fn hidden_input(html: &str, name: &str) -> Option<String> {
    let marker = format!("name=\"{name}\" value=\"");
    let start = html.find(&marker)? + marker.len();
    let rest = html.get(start..)?;
    let end = rest.find('"')?;
    rest.get(..end).map(str::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_input() {
        let html = r#"<input type="hidden" name="token" value="abc-123">"#;
        assert_eq!(hidden_input(html, "token").as_deref(), Some("abc-123"));
        assert_eq!(hidden_input(html, "other"), None);
    }

    #[test]
    fn test_page_param() {
        assert_eq!(page_param(&"/x?page=3".parse().unwrap()), 3);
        assert_eq!(page_param(&"/x".parse().unwrap()), 1);
    }
}
